//! One-second running averages

use super::reader::Sample;

/// Published window means
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Averages {
    pub voltage_mv: f32,
    /// Signed, positive into the cell
    pub current_ma: f32,
    pub temperature: f32,
}

impl Averages {
    pub fn current_magnitude_ma(&self) -> f32 {
        libm::fabsf(self.current_ma)
    }
}

/// Running sums over a fixed window of ticks
///
/// The window counts down one per tick whether or not a cell is connected,
/// so a publish happens exactly once every `window` ticks.
pub struct RunningAverage {
    window: u32,
    remaining: u32,
    samples: u32,
    sum_voltage: f32,
    sum_current: f32,
    sum_temperature: f32,
}

impl RunningAverage {
    pub fn new(window: u32) -> Self {
        Self {
            window: window.max(1),
            remaining: window.max(1),
            samples: 0,
            sum_voltage: 0.0,
            sum_current: 0.0,
            sum_temperature: 0.0,
        }
    }

    /// Add one tick's instantaneous values
    ///
    /// While disconnected the sums are held at zero. Returns the means when
    /// this tick closes the window.
    pub fn accumulate(&mut self, sample: &Sample, connected: bool) -> Option<Averages> {
        if connected {
            self.sum_voltage += sample.voltage_mv;
            self.sum_current += sample.current_ma;
            self.sum_temperature += sample.temperature;
            self.samples += 1;
        } else {
            self.clear_sums();
        }

        self.remaining -= 1;
        if self.remaining > 0 {
            return None;
        }

        let averages = if self.samples == 0 {
            Averages::default()
        } else {
            let n = self.samples as f32;
            Averages {
                voltage_mv: self.sum_voltage / n,
                current_ma: self.sum_current / n,
                temperature: self.sum_temperature / n,
            }
        };
        self.reset();
        Some(averages)
    }

    /// Start a fresh window
    pub fn reset(&mut self) {
        self.remaining = self.window;
        self.clear_sums();
    }

    /// Ticks left before the next publish
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Samples accumulated in the current window
    pub fn samples(&self) -> u32 {
        self.samples
    }

    fn clear_sums(&mut self) {
        self.samples = 0;
        self.sum_voltage = 0.0;
        self.sum_current = 0.0;
        self.sum_temperature = 0.0;
    }
}
