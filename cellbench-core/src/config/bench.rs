//! Bench-wide configuration
//!
//! Loaded once at boot. On the firmware side it is parsed from TOML at
//! build time and embedded as postcard-serialized binary data.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::calibration::Calibration;
use super::plan::SessionConfig;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Plan option is not 1-4
    InvalidOption,
    /// Cell count is zero or above the number of channels
    InvalidCellCount,
    /// Actuator levels not ordered min <= start <= max
    InvalidLevelRange,
    /// Tick rate or averaging window is zero
    InvalidTiming,
    /// A gain or the error limit is negative or not finite
    InvalidGains,
    /// Resistance step instant outside the measurement window
    InvalidResistanceTiming,
    /// Safety limits are inconsistent
    InvalidLimits,
}

/// Proportional and integral gains for one regulation mode
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GainSet {
    pub kp: f32,
    pub ki: f32,
}

impl GainSet {
    fn is_valid(&self) -> bool {
        self.kp.is_finite() && self.ki.is_finite() && self.kp >= 0.0 && self.ki >= 0.0
    }
}

/// Control loop parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ControlConfig {
    /// Control tick rate in Hz
    pub tick_hz: u32,
    /// Samples per published average (one second at `tick_hz`)
    pub window_ticks: u32,
    /// Gains while regulating current
    pub cc_gains: GainSet,
    /// Gains after switching to voltage regulation
    pub cv_gains: GainSet,
    /// Regulation error is clamped to ±this before use
    pub error_limit: f32,
    /// Actuator duty counts
    pub level_min: u16,
    pub level_start: u16,
    pub level_max: u16,
    /// Include the temperature channel in the sampling rotation
    pub sample_temperature: bool,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_hz: 1000,
            window_ticks: 1000,
            cc_gains: GainSet { kp: 0.02, ki: 0.5 },
            cv_gains: GainSet { kp: 0.001, ki: 0.05 },
            error_limit: 250.0,
            level_min: 25,
            level_start: 51,
            level_max: 385,
            sample_temperature: true,
        }
    }
}

impl ControlConfig {
    /// Tick period in seconds
    pub fn tick_period_s(&self) -> f32 {
        1.0 / self.tick_hz as f32
    }
}

/// Plausibility bounds checked every tick
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SafetyLimits {
    /// A connected cell reading below this is absent or deeply discharged (mV)
    pub presence_mv: f32,
    pub max_voltage_mv: f32,
    /// Largest plausible current magnitude (mA)
    pub max_current_ma: f32,
    /// Temperature channel bounds, calibrated units
    pub min_temperature: f32,
    pub max_temperature: f32,
    /// Raw reading that means the converter input is saturated
    pub adc_full_scale: u16,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            presence_mv: 900.0,
            max_voltage_mv: 5000.0,
            max_current_ma: 4000.0,
            // Identity calibration: open or shorted sensor sits at the rails
            min_temperature: 10.0,
            max_temperature: 4085.0,
            adc_full_scale: 4095,
        }
    }
}

/// Phase durations
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TimingConfig {
    /// Rest between phases (s)
    pub wait_secs: u32,
    /// Length of a resistance measurement (s)
    pub resistance_secs: u32,
    /// Seconds remaining when the load steps up
    pub resistance_step_at: u32,
    /// Base load as a fraction of capacity
    pub resistance_base_rate: f32,
    /// Stepped load as a fraction of capacity
    pub resistance_step_rate: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            wait_secs: 600,
            resistance_secs: 14,
            resistance_step_at: 4,
            resistance_base_rate: 0.1,
            resistance_step_rate: 0.5,
        }
    }
}

/// Complete bench configuration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BenchConfig {
    pub calibration: Calibration,
    pub control: ControlConfig,
    pub safety: SafetyLimits,
    pub timing: TimingConfig,
    /// Session run by the start command
    pub session: SessionConfig,
}

impl BenchConfig {
    /// Check every section for values the controller cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let control = &self.control;
        if control.tick_hz == 0 || control.window_ticks == 0 {
            return Err(ConfigError::InvalidTiming);
        }
        if !(control.level_min <= control.level_start && control.level_start <= control.level_max)
        {
            return Err(ConfigError::InvalidLevelRange);
        }
        if !control.cc_gains.is_valid()
            || !control.cv_gains.is_valid()
            || !control.error_limit.is_finite()
            || control.error_limit <= 0.0
        {
            return Err(ConfigError::InvalidGains);
        }

        let safety = &self.safety;
        if safety.presence_mv >= safety.max_voltage_mv
            || safety.max_current_ma <= 0.0
            || safety.min_temperature >= safety.max_temperature
        {
            return Err(ConfigError::InvalidLimits);
        }

        let timing = &self.timing;
        // Both latches and the return to base load must happen inside the window
        if timing.resistance_step_at < 2 || timing.resistance_step_at >= timing.resistance_secs {
            return Err(ConfigError::InvalidResistanceTiming);
        }
        if timing.wait_secs == 0 {
            return Err(ConfigError::InvalidTiming);
        }

        self.session.to_plan().map(|_| ())
    }
}
