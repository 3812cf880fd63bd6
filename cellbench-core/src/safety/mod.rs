//! Safety monitoring
//!
//! Any fault forces the converter off and the cell disconnected until the
//! operator restarts.

pub mod monitor;

pub use monitor::{SafetyMonitor, SafetyStatus};
