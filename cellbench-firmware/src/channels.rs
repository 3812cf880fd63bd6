//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.
//! Uses embassy-sync primitives for safe async communication.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use heapless::Vec;

use cellbench_protocol::{Command, MAX_LINE_LEN};

/// Channel capacity for operator commands
const COMMAND_CHANNEL_SIZE: usize = 4;

/// Channel capacity for telemetry lines (a few seconds of output)
const TELEMETRY_CHANNEL_SIZE: usize = 8;

/// Encoded telemetry line on its way to the UART
pub type LineBytes = Vec<u8, MAX_LINE_LEN>;

/// Start and restart commands from the terminal
pub static COMMAND_CHANNEL: Channel<CriticalSectionRawMutex, Command, COMMAND_CHANNEL_SIZE> =
    Channel::new();

/// Stop request; a signal so it can never be dropped by a full queue
pub static STOP_REQUEST: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Telemetry lines from the bench task to the UART TX task
pub static TELEMETRY_CHANNEL: Channel<CriticalSectionRawMutex, LineBytes, TELEMETRY_CHANNEL_SIZE> =
    Channel::new();
