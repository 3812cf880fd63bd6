//! Test plan selection
//!
//! A [`TestPlan`] is what the operator picks before pressing start: which
//! sequence of phases to run, on how many cells, at what rates.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::chemistry::{Chemistry, ChemistryProfile};
use super::ConfigError;

/// Maximum number of cell channels on the bench
pub const MAX_CELLS: u8 = 4;

/// Phase sequence selected by the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlanOption {
    /// Predischarge, resistance checks and a full charge/discharge cycle
    FullCycle,
    /// Charge, rest, discharge
    ChargeDischarge,
    /// Charge only
    ChargeOnly,
    /// Discharge only
    DischargeOnly,
}

impl PlanOption {
    /// Option from the menu number (1-4)
    pub fn from_number(number: u8) -> Result<Self, ConfigError> {
        match number {
            1 => Ok(PlanOption::FullCycle),
            2 => Ok(PlanOption::ChargeDischarge),
            3 => Ok(PlanOption::ChargeOnly),
            4 => Ok(PlanOption::DischargeOnly),
            _ => Err(ConfigError::InvalidOption),
        }
    }

    pub fn number(self) -> u8 {
        match self {
            PlanOption::FullCycle => 1,
            PlanOption::ChargeDischarge => 2,
            PlanOption::ChargeOnly => 3,
            PlanOption::DischargeOnly => 4,
        }
    }
}

/// Charge or discharge rate as a fraction of rated capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CRate {
    Quarter,
    #[default]
    Half,
    One,
}

impl CRate {
    pub fn factor(self) -> f32 {
        match self {
            CRate::Quarter => 0.25,
            CRate::Half => 0.5,
            CRate::One => 1.0,
        }
    }
}

/// Immutable description of one test session
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TestPlan {
    pub option: PlanOption,
    pub cell_count: u8,
    pub profile: ChemistryProfile,
    pub charge_rate: CRate,
    pub discharge_rate: CRate,
}

impl TestPlan {
    /// Build a plan, rejecting cell counts the bench cannot address
    pub fn new(
        option: PlanOption,
        cell_count: u8,
        profile: ChemistryProfile,
        charge_rate: CRate,
        discharge_rate: CRate,
    ) -> Result<Self, ConfigError> {
        if cell_count == 0 || cell_count > MAX_CELLS {
            return Err(ConfigError::InvalidCellCount);
        }
        Ok(Self {
            option,
            cell_count,
            profile,
            charge_rate,
            discharge_rate,
        })
    }

    /// Constant-current setpoint while charging (mA)
    pub fn charge_current_ma(&self) -> f32 {
        self.profile.capacity_mah * self.charge_rate.factor()
    }

    /// Constant-current setpoint while discharging (mA)
    pub fn discharge_current_ma(&self) -> f32 {
        self.profile.capacity_mah * self.discharge_rate.factor()
    }
}

/// Session selection as written in the board configuration file
///
/// Stands in for the operator menu: the start command runs this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    pub chemistry: Chemistry,
    /// Plan option number, 1-4
    pub option: u8,
    pub cell_count: u8,
    pub charge_rate: CRate,
    pub discharge_rate: CRate,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chemistry: Chemistry::LiIon,
            option: 3,
            cell_count: 1,
            charge_rate: CRate::Half,
            discharge_rate: CRate::Half,
        }
    }
}

impl SessionConfig {
    /// Resolve into a validated plan using the chemistry preset
    pub fn to_plan(&self) -> Result<TestPlan, ConfigError> {
        TestPlan::new(
            PlanOption::from_number(self.option)?,
            self.cell_count,
            ChemistryProfile::preset(self.chemistry),
            self.charge_rate,
            self.discharge_rate,
        )
    }
}
