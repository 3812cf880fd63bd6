//! Board-agnostic core logic for the battery test bench firmware
//!
//! This crate contains everything that runs inside the fixed-rate tick and
//! does not depend on a specific board:
//!
//! - Hardware abstraction traits (analog front end, power stage, cell switch)
//! - Sampler and one-second running averages
//! - CC/CV PI regulator
//! - Safety monitoring logic
//! - Phase state machine and test-plan sequencer
//! - Telemetry emitter
//! - The [`Bench`] controller tying them together
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

pub mod bench;
pub mod config;
pub mod control;
pub mod safety;
pub mod sampler;
pub mod sequencer;
pub mod state;
pub mod telemetry;
pub mod traits;

#[cfg(test)]
pub(crate) mod sim;

pub use bench::{Bench, BenchEvent};
