//! Terminal UART receive task
//!
//! Decodes operator command bytes. Stop bypasses the queue.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use cellbench_protocol::Command;

use crate::channels::{COMMAND_CHANNEL, STOP_REQUEST};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 16;

/// Command RX task - reads bytes from the terminal and dispatches commands
#[embassy_executor::task]
pub async fn command_rx_task(mut rx: BufferedUartRx) {
    info!("Command RX task started");

    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) => {
                for &byte in &buf[..n] {
                    // Menu keystrokes are not ours
                    if let Some(cmd) = Command::from_byte(byte) {
                        dispatch(cmd);
                    }
                }
            }
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}

fn dispatch(cmd: Command) {
    debug!("Command received: {:?}", cmd);
    if cmd.is_shutdown() {
        STOP_REQUEST.signal(());
    } else if COMMAND_CHANNEL.try_send(cmd).is_err() {
        warn!("Command channel full, dropping {:?}", cmd);
    }
}
