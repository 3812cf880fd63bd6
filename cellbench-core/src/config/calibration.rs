//! Sensor calibration
//!
//! Calibration is a fixed input derived on the bench; these types only
//! apply it.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// `value = scale · raw + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinearCalibration {
    pub scale: f32,
    pub offset: f32,
}

impl LinearCalibration {
    /// Pass raw counts through unchanged
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        offset: 0.0,
    };

    pub const fn new(scale: f32, offset: f32) -> Self {
        Self { scale, offset }
    }

    pub fn apply(&self, raw: u16) -> f32 {
        raw as f32 * self.scale + self.offset
    }
}

/// Bidirectional current sensor
///
/// The linear stage yields a value centred on `zero_point`; distance from it
/// gives magnitude and sign, then `gain` converts to mA.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CurrentCalibration {
    pub stage: LinearCalibration,
    pub zero_point: f32,
    /// mA per unit away from the zero point
    pub gain: f32,
}

impl CurrentCalibration {
    /// Signed current in mA, positive into the cell
    pub fn apply(&self, raw: u16) -> f32 {
        let x = self.stage.apply(raw);
        if x > self.zero_point {
            (x - self.zero_point) * self.gain
        } else if x < self.zero_point {
            -((self.zero_point - x) * self.gain)
        } else {
            0.0
        }
    }
}

/// Calibration for every sensed channel
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Calibration {
    /// Cell voltage in mV
    pub voltage: LinearCalibration,
    pub current: CurrentCalibration,
    pub temperature: LinearCalibration,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            voltage: LinearCalibration::new(1.29296, -10.0),
            current: CurrentCalibration {
                stage: LinearCalibration::new(1.23022, -20.0),
                zero_point: 2500.0,
                gain: 2.5,
            },
            temperature: LinearCalibration::IDENTITY,
        }
    }
}

impl Calibration {
    /// Cell voltage in mV, never negative
    pub fn voltage_mv(&self, raw: u16) -> f32 {
        self.voltage.apply(raw).max(0.0)
    }

    pub fn current_ma(&self, raw: u16) -> f32 {
        self.current.apply(raw)
    }

    pub fn temperature(&self, raw: u16) -> f32 {
        self.temperature.apply(raw)
    }
}
