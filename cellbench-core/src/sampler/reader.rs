//! Per-tick channel sampling
//!
//! One channel is converted per tick, in rotation. The freshly converted
//! value replaces the held instantaneous value for that channel; the other
//! channels keep their last reading.

use crate::config::Calibration;
use crate::traits::{AnalogFrontEnd, SenseChannel, SensorError};

/// Instantaneous values in physical units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample {
    pub voltage_mv: f32,
    /// Signed, positive into the cell
    pub current_ma: f32,
    pub temperature: f32,
}

impl Sample {
    /// Current magnitude in mA
    pub fn current_magnitude_ma(&self) -> f32 {
        libm::fabsf(self.current_ma)
    }
}

/// The conversion made on one tick
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    pub channel: SenseChannel,
    pub raw: u16,
    /// Calibrated value
    pub value: f32,
}

/// Rotating channel sampler
pub struct Sampler {
    calibration: Calibration,
    rotation: &'static [SenseChannel],
    cursor: usize,
    latest: Sample,
}

const WITH_TEMPERATURE: [SenseChannel; 3] = [
    SenseChannel::Voltage,
    SenseChannel::Current,
    SenseChannel::Temperature,
];

const WITHOUT_TEMPERATURE: [SenseChannel; 2] = [SenseChannel::Voltage, SenseChannel::Current];

impl Sampler {
    pub fn new(calibration: Calibration, sample_temperature: bool) -> Self {
        Self {
            calibration,
            rotation: if sample_temperature {
                &WITH_TEMPERATURE
            } else {
                &WITHOUT_TEMPERATURE
            },
            cursor: 0,
            latest: Sample::default(),
        }
    }

    /// Channel the next call to [`Sampler::sample`] converts
    pub fn next_channel(&self) -> SenseChannel {
        self.rotation[self.cursor]
    }

    /// Convert the next channel in the rotation
    ///
    /// The rotation advances even when the conversion fails.
    pub fn sample<A: AnalogFrontEnd>(&mut self, afe: &mut A) -> Result<Reading, SensorError> {
        let channel = self.next_channel();
        self.cursor = (self.cursor + 1) % self.rotation.len();

        let raw = afe.read_raw(channel)?;
        let value = match channel {
            SenseChannel::Voltage => {
                let v = self.calibration.voltage_mv(raw);
                self.latest.voltage_mv = v;
                v
            }
            SenseChannel::Current => {
                let i = self.calibration.current_ma(raw);
                self.latest.current_ma = i;
                i
            }
            SenseChannel::Temperature => {
                let t = self.calibration.temperature(raw);
                self.latest.temperature = t;
                t
            }
        };

        Ok(Reading {
            channel,
            raw,
            value,
        })
    }

    /// Held instantaneous values
    pub fn latest(&self) -> &Sample {
        &self.latest
    }
}
