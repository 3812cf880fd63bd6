//! Cellbench Hardware Abstraction Layer
//!
//! This crate defines the low-level traits that chip-specific HALs implement
//! and that the board-agnostic core consumes. Keeping them here lets the
//! same bench logic run on the RP2040 board and inside host-side tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  cellbench-firmware / cellbench-core    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cellbench-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!           ┌───────────────────┐
//!           │ cellbench-hal-    │
//!           │     rp2040        │
//!           └───────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`] - Relay and enable lines
//! - [`uart::UartTx`] - Telemetry serial link
//! - [`uart::UartConfig`] - Line settings for the bench terminal

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use gpio::OutputPin;
pub use uart::{TransportError, UartConfig, UartTx};
