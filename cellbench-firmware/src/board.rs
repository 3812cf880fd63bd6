//! Board wiring
//!
//! Composes the RP2040 peripherals into the hardware the bench core drives,
//! and adapts the telemetry transport to the inter-task channel.

use embassy_rp::uart::{
    Config as RpUartConfig, DataBits as RpDataBits, Parity as RpParity, StopBits as RpStopBits,
};

use cellbench_core::traits::{
    AnalogFrontEnd, CellSwitch, Direction, PowerStage, SenseChannel, SensorError,
};
use cellbench_hal::gpio::ActiveLow;
use cellbench_hal::uart::{DataBits, Parity, StopBits, UartConfig};
use cellbench_hal::{TransportError, UartTx};
use cellbench_hal_rp2040::{BenchAdc, CellRelays, ConverterPwm, RpOutput};

use crate::channels::{LineBytes, TELEMETRY_CHANNEL};

type Relay = ActiveLow<RpOutput>;

/// Sense, converter and relays of the controller board
pub struct BoardHardware {
    sense: BenchAdc,
    converter: ConverterPwm<RpOutput>,
    relays: CellRelays<Relay>,
}

impl BoardHardware {
    pub fn new(
        sense: BenchAdc,
        converter: ConverterPwm<RpOutput>,
        relays: CellRelays<Relay>,
    ) -> Self {
        Self {
            sense,
            converter,
            relays,
        }
    }
}

impl AnalogFrontEnd for BoardHardware {
    fn read_raw(&mut self, channel: SenseChannel) -> Result<u16, SensorError> {
        self.sense.read_raw(channel)
    }
}

impl PowerStage for BoardHardware {
    fn set_level(&mut self, level: u16) {
        self.converter.set_level(level);
    }

    fn set_direction(&mut self, direction: Direction) {
        self.converter.set_direction(direction);
    }
}

impl CellSwitch for BoardHardware {
    fn connect(&mut self, cell: u8) {
        self.relays.connect(cell);
    }

    fn disconnect(&mut self) {
        self.relays.disconnect();
    }
}

/// Telemetry transport that queues lines for the UART TX task
///
/// Never waits: a full queue drops the line.
pub struct ChannelTx;

impl UartTx for ChannelTx {
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let line = LineBytes::from_slice(data).map_err(|_| TransportError::Full)?;
        TELEMETRY_CHANNEL
            .try_send(line)
            .map_err(|_| TransportError::Full)
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Terminal line settings in embassy-rp terms
pub fn uart_config() -> RpUartConfig {
    let line = UartConfig::default();
    let mut config = RpUartConfig::default();
    config.baudrate = line.baudrate;
    config.data_bits = match line.data_bits {
        DataBits::Seven => RpDataBits::DataBits7,
        DataBits::Eight => RpDataBits::DataBits8,
    };
    config.parity = match line.parity {
        Parity::None => RpParity::ParityNone,
        Parity::Even => RpParity::ParityEven,
        Parity::Odd => RpParity::ParityOdd,
    };
    config.stop_bits = match line.stop_bits {
        StopBits::One => RpStopBits::STOP1,
        StopBits::Two => RpStopBits::STOP2,
    };
    config
}
