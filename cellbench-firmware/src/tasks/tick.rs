//! Control tick task
//!
//! Paces the bench task at the configured control rate.

use defmt::*;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};

/// Signal to notify the bench task of a tick; carries a running tick count
pub static TICK_SIGNAL: Signal<CriticalSectionRawMutex, u32> = Signal::new();

/// Tick task - sends periodic tick signals with a sequence number
#[embassy_executor::task]
pub async fn tick_task(tick_hz: u32) {
    info!("Tick task started at {} Hz", tick_hz);

    let mut ticker = Ticker::every(Duration::from_hz(tick_hz as u64));
    let mut count: u32 = 0;

    loop {
        ticker.next().await;
        count = count.wrapping_add(1);
        TICK_SIGNAL.signal(count);
    }
}
