//! Configuration types
//!
//! Board-agnostic configuration structures, serializable as postcard binary
//! data when the `serde` feature is enabled.

pub mod bench;
pub mod calibration;
pub mod chemistry;
pub mod plan;

pub use bench::*;
pub use calibration::*;
pub use chemistry::*;
pub use plan::*;
