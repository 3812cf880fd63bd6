//! Cellbench - Battery Test Bench Firmware
//!
//! Main firmware binary for the RP2040 bench controller. Charges,
//! discharges and measures the internal resistance of up to four cells,
//! one at a time, streaming results to a serial terminal.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, Config as AdcConfig};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::uart::{BufferedInterruptHandler, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use cellbench_core::Bench;
use cellbench_hal::gpio::ActiveLow;
use cellbench_hal_rp2040::{BenchAdc, CellRelays, ConverterPwm, RpOutput};

use crate::board::{BoardHardware, ChannelTx};

mod board;
mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Cellbench firmware starting...");

    // Configuration first: on failure nothing has been driven yet
    let (bench_config, plan) = match config::load() {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("Bench configuration rejected: {:?}", e);
            return;
        }
    };
    info!(
        "Session: option {}, {} cell(s), {:?}",
        plan.option.number(),
        plan.cell_count,
        plan.profile.chemistry
    );

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Terminal UART (GPIO0 TX, GPIO1 RX)
    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 64]);
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, board::uart_config());
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();
    info!("UART initialized for the bench terminal");

    // Sense inputs: cell voltage GPIO26, shunt GPIO27, thermistor GPIO28
    let adc = Adc::new_blocking(p.ADC, AdcConfig::default());
    let sense = BenchAdc::new(
        adc,
        Channel::new_pin(p.PIN_26, Pull::None),
        Channel::new_pin(p.PIN_27, Pull::None),
        Channel::new_pin(p.PIN_28, Pull::None),
    );

    // Converter PWM on GPIO16 (slice 0 A), direction relay GPIO17
    let pwm = Pwm::new_output_a(p.PWM_SLICE0, p.PIN_16, PwmConfig::default());
    let converter = ConverterPwm::new(
        pwm,
        RpOutput(Output::new(p.PIN_17, Level::Low)),
        bench_config.control.level_min,
    );

    // Relay drivers are active-low: start high (open)
    let relay = |pin| ActiveLow(RpOutput(pin));
    let relays = CellRelays::new(
        relay(Output::new(p.PIN_18, Level::High)),
        [
            relay(Output::new(p.PIN_19, Level::High)),
            relay(Output::new(p.PIN_20, Level::High)),
            relay(Output::new(p.PIN_21, Level::High)),
            relay(Output::new(p.PIN_22, Level::High)),
        ],
    );

    let hardware = BoardHardware::new(sense, converter, relays);
    let bench = Bench::new(hardware, ChannelTx, &bench_config);
    info!("Bench ready in standby");

    spawner.spawn(tasks::tick_task(bench_config.control.tick_hz)).unwrap();
    spawner.spawn(tasks::command_rx_task(rx)).unwrap();
    spawner.spawn(tasks::telemetry_tx_task(tx)).unwrap();
    spawner.spawn(tasks::bench_task(bench, plan)).unwrap();

    info!("All tasks spawned, firmware running");
}
