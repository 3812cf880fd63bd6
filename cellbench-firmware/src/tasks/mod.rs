//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod bench;
pub mod command_rx;
pub mod telemetry_tx;
pub mod tick;

pub use bench::bench_task;
pub use command_rx::command_rx_task;
pub use telemetry_tx::telemetry_tx_task;
pub use tick::tick_task;
