//! RP2040-specific HAL for the battery test bench
//!
//! Implements the core hardware traits on embassy-rp peripherals:
//!
//! - ADC sense channels (cell voltage, shunt current, thermistor)
//! - PWM duty for the buck/boost converter and its direction relay
//! - Cell select and main relays

#![no_std]

pub mod adc;
pub mod gpio;
pub mod pwm;
pub mod relays;

pub use adc::BenchAdc;
pub use gpio::RpOutput;
pub use pwm::ConverterPwm;
pub use relays::CellRelays;
