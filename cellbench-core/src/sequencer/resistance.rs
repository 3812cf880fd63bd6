//! DC internal resistance measurement
//!
//! Two averaged (voltage, current) pairs are latched one second apart
//! across a load step; the resistance is their slope.

use crate::sampler::Averages;

/// One latched operating point
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OperatingPoint {
    pub voltage_mv: f32,
    /// Signed, positive into the cell
    pub current_ma: f32,
}

impl From<&Averages> for OperatingPoint {
    fn from(avg: &Averages) -> Self {
        Self {
            voltage_mv: avg.voltage_mv,
            current_ma: avg.current_ma,
        }
    }
}

/// Measurement in progress
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResistanceMeasurement {
    before: Option<OperatingPoint>,
    after: Option<OperatingPoint>,
}

impl ResistanceMeasurement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch the point at base load
    pub fn latch_before(&mut self, point: OperatingPoint) {
        self.before = Some(point);
    }

    /// Latch the point under the stepped load
    pub fn latch_after(&mut self, point: OperatingPoint) {
        self.after = Some(point);
    }

    /// (v2 − v1) / (i2 − i1) in milliohms
    ///
    /// `None` until both points are latched or when the currents coincide.
    pub fn milliohms(&self) -> Option<f32> {
        let (a, b) = (self.before?, self.after?);
        let di = b.current_ma - a.current_ma;
        if di == 0.0 {
            return None;
        }
        // mV / mA is ohms
        Some((b.voltage_mv - a.voltage_mv) / di * 1000.0)
    }
}
