//! GPIO output adapter
//!
//! Bridges embassy-rp outputs to the `cellbench_hal::OutputPin` trait so
//! relay logic stays chip-agnostic.

use cellbench_hal::OutputPin;
use embassy_rp::gpio::Output;

/// An embassy-rp push-pull output
pub struct RpOutput(pub Output<'static>);

impl OutputPin for RpOutput {
    fn set_high(&mut self) {
        self.0.set_high();
    }

    fn set_low(&mut self) {
        self.0.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.0.is_set_high()
    }
}
