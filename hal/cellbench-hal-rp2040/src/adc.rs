//! ADC sense channels
//!
//! RP2040 board mapping:
//! - ADC0 (GPIO26): cell voltage divider
//! - ADC1 (GPIO27): shunt amplifier, zero current at mid-scale
//! - ADC2 (GPIO28): thermistor divider
//!
//! Conversions are blocking; one conversion takes about 2 µs, well inside a
//! control tick.

use embassy_rp::adc::{Adc, Blocking, Channel};

use cellbench_core::traits::{AnalogFrontEnd, SenseChannel, SensorError};

/// The bench's three analog inputs on the RP2040 ADC
pub struct BenchAdc {
    adc: Adc<'static, Blocking>,
    voltage: Channel<'static>,
    current: Channel<'static>,
    temperature: Channel<'static>,
}

impl BenchAdc {
    pub fn new(
        adc: Adc<'static, Blocking>,
        voltage: Channel<'static>,
        current: Channel<'static>,
        temperature: Channel<'static>,
    ) -> Self {
        Self {
            adc,
            voltage,
            current,
            temperature,
        }
    }
}

impl AnalogFrontEnd for BenchAdc {
    fn read_raw(&mut self, channel: SenseChannel) -> Result<u16, SensorError> {
        let ch = match channel {
            SenseChannel::Voltage => &mut self.voltage,
            SenseChannel::Current => &mut self.current,
            SenseChannel::Temperature => &mut self.temperature,
        };
        self.adc
            .blocking_read(ch)
            .map_err(|_| SensorError::ConversionError)
    }
}
