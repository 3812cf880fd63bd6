//! Test plan sequencing
//!
//! Expands the selected plan, walks each cell through it and runs the
//! resistance measurement procedure.

pub mod executor;
pub mod plan;
pub mod resistance;

pub use executor::{ConverterCommand, Report, SecondOutcome, Sequencer, Transition};
pub use plan::{expand, PlanSteps, MAX_PLAN_STEPS};
pub use resistance::{OperatingPoint, ResistanceMeasurement};
