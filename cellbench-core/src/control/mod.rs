//! Converter regulation

pub mod regulator;

pub use regulator::{RegulationTarget, Regulator, RegulatorMode};
