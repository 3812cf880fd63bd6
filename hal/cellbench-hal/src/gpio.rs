//! GPIO pin abstractions
//!
//! The bench only drives outputs: the main converter relay, the
//! charge/discharge direction relay and the four cell-select relays.

/// Digital output pin
///
/// Implementations handle the actual register manipulation for the chip.
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the pin is currently set high
    fn is_set_high(&self) -> bool;

    /// Check if the pin is currently set low
    fn is_set_low(&self) -> bool {
        !self.is_set_high()
    }
}

/// Active-low wrapper
///
/// Relay drivers on the switcher board energize on a low level. Wrapping the
/// pin keeps "on" meaning "energized" everywhere above the HAL.
pub struct ActiveLow<P>(pub P);

impl<P: OutputPin> OutputPin for ActiveLow<P> {
    fn set_high(&mut self) {
        self.0.set_low();
    }

    fn set_low(&mut self) {
        self.0.set_high();
    }

    fn is_set_high(&self) -> bool {
        self.0.is_set_low()
    }
}
