//! Phase state machine
//!
//! What the converter does on any tick is a function of the current phase.
//! Plan-driven transitions carry their target; this table decides which of
//! them are legal from where.

use super::events::Event;

/// Bench phases
///
/// Declaration order matches the wire identifiers 0..=11.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Nothing connected, waiting for a start command
    Standby,
    /// Cell connected and checked before the first planned phase
    Idle,
    /// Shutdown after a safety fault or stop command
    Fault(FaultKind),
    /// A cell finished its plan
    Done,
    /// Rest between phases, converter off
    Wait,
    /// Discharge to a known state before the first resistance check
    Predischarge,
    Charge,
    Discharge,
    /// Recharge after the capacity discharge
    Postcharge,
    /// Resistance measured after predischarge
    ResistanceDischarged,
    /// Resistance measured after charge
    ResistanceCharged,
    /// Resistance measured after postcharge
    ResistancePostcharged,
}

/// Reasons for entering Fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultKind {
    /// Connected cell reads below the presence threshold
    CellAbsentOrLow,
    /// Raw reading at the rails, implausible value or failed conversion
    SensorOutOfRange,
    /// Operator stop command
    Stopped,
}

impl Phase {
    /// Numeric identifier used in telemetry
    pub fn id(&self) -> u8 {
        match self {
            Phase::Standby => 0,
            Phase::Idle => 1,
            Phase::Fault(_) => 2,
            Phase::Done => 3,
            Phase::Wait => 4,
            Phase::Predischarge => 5,
            Phase::Charge => 6,
            Phase::Discharge => 7,
            Phase::Postcharge => 8,
            Phase::ResistanceDischarged => 9,
            Phase::ResistanceCharged => 10,
            Phase::ResistancePostcharged => 11,
        }
    }

    /// Phases that charge the cell
    pub fn is_charging(&self) -> bool {
        matches!(self, Phase::Charge | Phase::Postcharge)
    }

    /// Phases that discharge the cell down to the end-of-discharge voltage
    pub fn is_discharging(&self) -> bool {
        matches!(self, Phase::Discharge | Phase::Predischarge)
    }

    pub fn is_resistance(&self) -> bool {
        matches!(
            self,
            Phase::ResistanceDischarged | Phase::ResistanceCharged | Phase::ResistancePostcharged
        )
    }

    /// Converter is closed-loop regulated in this phase
    pub fn is_regulated(&self) -> bool {
        self.is_charging() || self.is_discharging() || self.is_resistance()
    }

    /// Phases that can appear in an expanded test plan
    pub fn is_planned(&self) -> bool {
        self.is_regulated() || matches!(self, Phase::Wait)
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, Phase::Fault(_))
    }

    /// Process an event and return the next phase
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use Phase::*;

        match (self, event) {
            // Fault is left only by an explicit restart
            (Fault(_), Restart) => Standby,
            (Fault(_), _) => self,

            // Reachable from everywhere else
            (_, FaultDetected(kind)) => Fault(kind),
            (_, Restart) => Standby,

            (Standby, Start) => Idle,

            (Idle, Advance(next)) if next.is_planned() => next,
            (from, Advance(next)) if from.is_planned() && next.is_planned() => next,
            (from, PlanComplete) if from.is_planned() => Done,

            (Done, NextCell) => Idle,
            (Done, SessionComplete) => Standby,

            // Everything else is ignored
            _ => self,
        }
    }
}
