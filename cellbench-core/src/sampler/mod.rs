//! Sampling and averaging
//!
//! Turns raw conversions into instantaneous physical values and publishes
//! their mean once per window.

pub mod average;
pub mod reader;

pub use average::{Averages, RunningAverage};
pub use reader::{Reading, Sample, Sampler};
