//! Terminal UART transmit task
//!
//! Drains queued telemetry lines into the UART. Waits on the TX ring rather
//! than spinning, so a slow terminal never holds up the bench task.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use crate::channels::TELEMETRY_CHANNEL;

/// Telemetry TX task - writes lines produced by the bench task
#[embassy_executor::task]
pub async fn telemetry_tx_task(mut tx: BufferedUartTx) {
    info!("Telemetry TX task started");

    loop {
        let line = TELEMETRY_CHANNEL.receive().await;
        if let Err(e) = tx.write_all(&line).await {
            warn!("Failed to send telemetry line: {:?}", e);
        }
    }
}
