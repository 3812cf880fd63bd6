//! Events that trigger phase transitions

use super::machine::{FaultKind, Phase};

/// Events that can trigger phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    // Operator events
    /// Start command with a plan selected
    Start,
    /// Restart command
    Restart,

    // Sequencer events
    /// Move to the next phase of the plan
    Advance(Phase),
    /// Last planned phase of the cell finished
    PlanComplete,
    /// Another cell is waiting
    NextCell,
    /// Every cell finished
    SessionComplete,

    // Safety events
    /// Safety monitor tripped, or stop command
    FaultDetected(FaultKind),
}
