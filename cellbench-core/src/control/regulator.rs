//! CC/CV PI regulator
//!
//! Velocity-form PI controller: each tick the proportional and integral
//! terms are added to the actuator level, which is then clamped. Clamping
//! the level is the only anti-windup.

use crate::config::{ControlConfig, GainSet};
use crate::sampler::Sample;

/// Regulated quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegulatorMode {
    /// Feedback is the current magnitude
    #[default]
    ConstantCurrent,
    /// Feedback is the cell voltage
    ConstantVoltage,
}

/// Setpoints for one phase
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegulationTarget {
    /// Current magnitude to hold in CC (mA)
    pub current_ma: f32,
    /// Voltage to hold once in CV (mV); `None` keeps the phase in CC
    pub voltage_mv: Option<f32>,
}

/// PI regulator with one-way CC to CV switching
pub struct Regulator {
    config: ControlConfig,
    mode: RegulatorMode,
    gains: GainSet,
    target: RegulationTarget,
    integral: f32,
    level: f32,
}

impl Regulator {
    pub fn new(config: ControlConfig) -> Self {
        Self {
            config,
            mode: RegulatorMode::ConstantCurrent,
            gains: config.cc_gains,
            target: RegulationTarget {
                current_ma: 0.0,
                voltage_mv: None,
            },
            integral: 0.0,
            level: config.level_min as f32,
        }
    }

    /// Re-parameterize for a new phase
    ///
    /// Zeroes the integral, returns to CC with coarse gains and restarts
    /// from the start level.
    pub fn reset(&mut self, target: RegulationTarget) {
        self.target = target;
        self.mode = RegulatorMode::ConstantCurrent;
        self.gains = self.config.cc_gains;
        self.integral = 0.0;
        self.level = self.config.level_start as f32;
    }

    /// Drop the actuator to its minimum and clear the integral
    pub fn shutdown(&mut self) {
        self.integral = 0.0;
        self.level = self.config.level_min as f32;
    }

    /// Change the CC setpoint without touching the controller state
    pub fn set_current_setpoint(&mut self, current_ma: f32) {
        self.target.current_ma = current_ma;
    }

    /// Run one control step on the held instantaneous values
    ///
    /// Returns the new actuator level in duty counts.
    pub fn update(&mut self, sample: &Sample) -> u16 {
        let (setpoint, feedback) = match self.mode {
            RegulatorMode::ConstantCurrent => {
                (self.target.current_ma, sample.current_magnitude_ma())
            }
            RegulatorMode::ConstantVoltage => (
                self.target.voltage_mv.unwrap_or(0.0),
                sample.voltage_mv,
            ),
        };

        let limit = self.config.error_limit;
        let error = (setpoint - feedback).clamp(-limit, limit);

        let p = self.gains.kp * error;
        self.integral += self.gains.ki * error * self.config.tick_period_s();
        self.level = (self.level + p + self.integral).clamp(
            self.config.level_min as f32,
            self.config.level_max as f32,
        );

        self.duty()
    }

    /// Switch to CV the first time the averaged voltage exceeds the target
    ///
    /// Called at second boundaries. Returns true on the boundary that
    /// switched.
    pub fn check_mode_switch(&mut self, avg_voltage_mv: f32) -> bool {
        match (self.mode, self.target.voltage_mv) {
            (RegulatorMode::ConstantCurrent, Some(cv)) if avg_voltage_mv > cv => {
                self.mode = RegulatorMode::ConstantVoltage;
                self.gains = self.config.cv_gains;
                self.integral = 0.0;
                true
            }
            _ => false,
        }
    }

    /// Actuator level rounded to duty counts
    pub fn duty(&self) -> u16 {
        libm::roundf(self.level) as u16
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn mode(&self) -> RegulatorMode {
        self.mode
    }

    pub fn gains(&self) -> GainSet {
        self.gains
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    /// Setpoint of the active mode
    pub fn setpoint(&self) -> f32 {
        match self.mode {
            RegulatorMode::ConstantCurrent => self.target.current_ma,
            RegulatorMode::ConstantVoltage => self.target.voltage_mv.unwrap_or(0.0),
        }
    }
}
