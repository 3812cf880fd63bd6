//! Plan expansion
//!
//! Turns a plan option into the ordered list of phases run on each cell.
//! Done is implicit after the last step.

use heapless::Vec;

use crate::config::PlanOption;
use crate::state::Phase;

/// Longest expanded plan
pub const MAX_PLAN_STEPS: usize = 10;

/// Ordered phases for one cell
pub type PlanSteps = Vec<Phase, MAX_PLAN_STEPS>;

/// Expand an option into its phase sequence
pub fn expand(option: PlanOption) -> PlanSteps {
    let steps: &[Phase] = match option {
        PlanOption::FullCycle => &[
            Phase::Predischarge,
            Phase::ResistanceDischarged,
            Phase::Wait,
            Phase::Charge,
            Phase::ResistanceCharged,
            Phase::Wait,
            Phase::Discharge,
            Phase::Wait,
            Phase::Postcharge,
            Phase::ResistancePostcharged,
        ],
        PlanOption::ChargeDischarge => &[Phase::Charge, Phase::Wait, Phase::Discharge],
        PlanOption::ChargeOnly => &[Phase::Charge],
        PlanOption::DischargeOnly => &[Phase::Discharge],
    };

    let mut plan = PlanSteps::new();
    // Every table above fits MAX_PLAN_STEPS
    let _ = plan.extend_from_slice(steps);
    plan
}
