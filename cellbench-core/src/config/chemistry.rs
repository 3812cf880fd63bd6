//! Cell chemistry presets
//!
//! The bench only knows two chemistries. Everything that differs between
//! them (CV setpoint, end-of-charge rule, end-of-discharge voltage, rated
//! capacity) lives in a [`ChemistryProfile`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Supported cell chemistries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Chemistry {
    #[default]
    LiIon,
    NiMh,
}

/// Rule that ends a charge phase
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EndOfCharge {
    /// Averaged current falls to this value while in constant-voltage mode
    MinCurrent { current_ma: f32 },
    /// Averaged voltage falls this far below its running maximum
    VoltageDrop { drop_mv: f32 },
}

/// Parameters of one chemistry
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChemistryProfile {
    pub chemistry: Chemistry,
    /// Constant-voltage setpoint used while charging (mV)
    pub cv_voltage_mv: f32,
    /// Rated capacity used to derive C-rate currents (mAh)
    pub capacity_mah: f32,
    /// How a charge phase is terminated
    pub end_of_charge: EndOfCharge,
    /// Discharge stops at or below this averaged voltage (mV)
    pub eod_voltage_mv: f32,
}

impl ChemistryProfile {
    pub const LI_ION: Self = Self {
        chemistry: Chemistry::LiIon,
        cv_voltage_mv: 4200.0,
        capacity_mah: 3250.0,
        end_of_charge: EndOfCharge::MinCurrent { current_ma: 100.0 },
        eod_voltage_mv: 3000.0,
    };

    pub const NI_MH: Self = Self {
        chemistry: Chemistry::NiMh,
        cv_voltage_mv: 1700.0,
        capacity_mah: 2000.0,
        end_of_charge: EndOfCharge::VoltageDrop { drop_mv: 10.0 },
        eod_voltage_mv: 1000.0,
    };

    /// Preset for a chemistry
    pub const fn preset(chemistry: Chemistry) -> Self {
        match chemistry {
            Chemistry::LiIon => Self::LI_ION,
            Chemistry::NiMh => Self::NI_MH,
        }
    }
}
