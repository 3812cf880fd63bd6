//! Converter PWM and direction relay
//!
//! The converter duty is a PWM compare value with the counter wrapping at
//! [`PWM_TOP`]. The direction relay selects buck (charge) or boost
//! (discharge); the core only flips it with the duty at its minimum.

use cellbench_hal::OutputPin;
use embassy_rp::pwm::{Config, Pwm};

use cellbench_core::traits::{Direction, PowerStage};

/// PWM counter wrap value; duty counts run 0..=PWM_TOP
pub const PWM_TOP: u16 = 511;

/// Converter drive: PWM channel A plus the direction relay
pub struct ConverterPwm<P> {
    pwm: Pwm<'static>,
    config: Config,
    direction_relay: P,
}

impl<P: OutputPin> ConverterPwm<P> {
    /// Start the PWM at `initial_level` with the relay in charge position
    pub fn new(pwm: Pwm<'static>, mut direction_relay: P, initial_level: u16) -> Self {
        let mut config = Config::default();
        config.top = PWM_TOP;
        config.compare_a = initial_level.min(PWM_TOP);
        direction_relay.set_low();

        let mut stage = Self {
            pwm,
            config,
            direction_relay,
        };
        stage.pwm.set_config(&stage.config);
        stage
    }

    /// Current compare value
    pub fn level(&self) -> u16 {
        self.config.compare_a
    }
}

impl<P: OutputPin> PowerStage for ConverterPwm<P> {
    fn set_level(&mut self, level: u16) {
        let level = level.min(PWM_TOP);
        if level != self.config.compare_a {
            self.config.compare_a = level;
            self.pwm.set_config(&self.config);
        }
    }

    fn set_direction(&mut self, direction: Direction) {
        // Energized relay selects discharge
        self.direction_relay
            .set_state(direction == Direction::Discharge);
    }
}
