//! Test plan sequencer
//!
//! Owns the phase, the plan position and the per-phase counters. It is
//! evaluated once per published average and decides transitions from the
//! averaged measurements; on every phase entry it re-parameterizes the
//! regulator and tells the caller what to do with the converter.

use crate::config::{EndOfCharge, TestPlan, TimingConfig};
use crate::control::{RegulationTarget, Regulator, RegulatorMode};
use crate::sampler::Averages;
use crate::state::{Event, FaultKind, Phase};
use crate::traits::Direction;

use super::plan::{expand, PlanSteps};
use super::resistance::ResistanceMeasurement;

/// What the converter and cell switch should do in the current phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConverterCommand {
    /// Actuator at minimum, cell disconnected
    Off,
    /// Cell connected for measurement only, actuator at minimum
    Sense,
    /// Cell connected and regulated in this direction
    Regulate(Direction),
}

/// A phase change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
    /// Active cell after the transition, 0-based
    pub cell: u8,
}

/// Result computed when a measuring phase ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Report {
    Resistance { cell: u8, milliohms: i32 },
    Capacity { cell: u8, mah: u32 },
}

/// What happened at a second boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SecondOutcome {
    pub transition: Option<Transition>,
    pub report: Option<Report>,
}

/// Phase sequencer
pub struct Sequencer {
    timing: TimingConfig,
    phase: Phase,
    previous: Phase,
    plan: Option<TestPlan>,
    steps: PlanSteps,
    step_index: usize,
    cell_index: u8,
    wait_remaining: u32,
    resistance_remaining: u32,
    resistance: ResistanceMeasurement,
    /// Charge moved in the current phase (mA·s)
    capacity_mas: f32,
    /// Highest averaged voltage in the current charge phase
    peak_voltage_mv: f32,
}

impl Sequencer {
    pub fn new(timing: TimingConfig) -> Self {
        Self {
            timing,
            phase: Phase::Standby,
            previous: Phase::Standby,
            plan: None,
            steps: PlanSteps::new(),
            step_index: 0,
            cell_index: 0,
            wait_remaining: 0,
            resistance_remaining: 0,
            resistance: ResistanceMeasurement::new(),
            capacity_mas: 0.0,
            peak_voltage_mv: 0.0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Phase left by the most recent transition
    pub fn previous(&self) -> Phase {
        self.previous
    }

    pub fn plan(&self) -> Option<&TestPlan> {
        self.plan.as_ref()
    }

    /// Active cell, 0-based
    pub fn cell_index(&self) -> u8 {
        self.cell_index
    }

    pub fn wait_remaining(&self) -> u32 {
        self.wait_remaining
    }

    pub fn resistance_remaining(&self) -> u32 {
        self.resistance_remaining
    }

    /// Capacity accumulated so far in the current phase (mAh)
    pub fn capacity_mah(&self) -> f32 {
        self.capacity_mas / 3600.0
    }

    /// Begin a session; ignored unless in Standby
    pub fn start(&mut self, plan: TestPlan) -> Option<Transition> {
        if self.phase != Phase::Standby {
            return None;
        }
        self.plan = Some(plan);
        self.steps = expand(plan.option);
        self.step_index = 0;
        self.cell_index = 0;
        self.fire(Event::Start)
    }

    /// Abandon whatever is running and return to Standby
    pub fn restart(&mut self) -> Option<Transition> {
        self.fire(Event::Restart)
    }

    /// Enter Fault
    pub fn fault(&mut self, kind: FaultKind) -> Option<Transition> {
        self.fire(Event::FaultDetected(kind))
    }

    /// Re-parameterize the regulator for the current phase
    ///
    /// Call after every transition.
    pub fn configure(&self, regulator: &mut Regulator) -> ConverterCommand {
        let plan = match (self.plan, self.phase) {
            (Some(plan), phase) if phase.is_regulated() => plan,
            (Some(_), Phase::Idle) => {
                regulator.shutdown();
                return ConverterCommand::Sense;
            }
            _ => {
                regulator.shutdown();
                return ConverterCommand::Off;
            }
        };

        let (target, direction) = if self.phase.is_charging() {
            (
                RegulationTarget {
                    current_ma: plan.charge_current_ma(),
                    voltage_mv: Some(plan.profile.cv_voltage_mv),
                },
                Direction::Charge,
            )
        } else if self.phase.is_resistance() {
            (
                RegulationTarget {
                    current_ma: plan.profile.capacity_mah * self.timing.resistance_base_rate,
                    voltage_mv: None,
                },
                Direction::Discharge,
            )
        } else {
            (
                RegulationTarget {
                    current_ma: plan.discharge_current_ma(),
                    voltage_mv: None,
                },
                Direction::Discharge,
            )
        };

        regulator.reset(target);
        ConverterCommand::Regulate(direction)
    }

    /// Evaluate termination criteria on a freshly published average
    pub fn on_second(&mut self, avg: &Averages, regulator: &mut Regulator) -> SecondOutcome {
        let mut outcome = SecondOutcome::default();
        let Some(plan) = self.plan else {
            return outcome;
        };
        let cell = self.cell_index;

        match self.phase {
            Phase::Standby | Phase::Fault(_) => {}

            Phase::Idle => outcome.transition = self.advance(),

            Phase::Wait => {
                self.wait_remaining = self.wait_remaining.saturating_sub(1);
                if self.wait_remaining == 0 {
                    outcome.transition = self.advance();
                }
            }

            Phase::Charge | Phase::Postcharge => {
                self.capacity_mas += avg.current_magnitude_ma();
                if self.charge_finished(&plan, avg, regulator.mode()) {
                    outcome.report = Some(self.capacity_report(cell));
                    outcome.transition = self.advance();
                } else {
                    regulator.check_mode_switch(avg.voltage_mv);
                }
            }

            Phase::Discharge | Phase::Predischarge => {
                self.capacity_mas += avg.current_magnitude_ma();
                if avg.voltage_mv <= plan.profile.eod_voltage_mv {
                    outcome.report = Some(self.capacity_report(cell));
                    outcome.transition = self.advance();
                }
            }

            Phase::ResistanceDischarged
            | Phase::ResistanceCharged
            | Phase::ResistancePostcharged => {
                self.resistance_remaining = self.resistance_remaining.saturating_sub(1);
                let step_at = self.timing.resistance_step_at;
                let capacity = plan.profile.capacity_mah;

                if self.resistance_remaining == step_at {
                    self.resistance.latch_before(avg.into());
                    regulator.set_current_setpoint(capacity * self.timing.resistance_step_rate);
                } else if self.resistance_remaining + 1 == step_at {
                    self.resistance.latch_after(avg.into());
                    regulator.set_current_setpoint(capacity * self.timing.resistance_base_rate);
                }

                if self.resistance_remaining == 0 {
                    outcome.report = self.resistance.milliohms().map(|r| Report::Resistance {
                        cell,
                        milliohms: libm::roundf(r) as i32,
                    });
                    outcome.transition = self.advance();
                }
            }

            Phase::Done => {
                outcome.transition = if self.cell_index + 1 < plan.cell_count {
                    self.cell_index += 1;
                    self.step_index = 0;
                    self.fire(Event::NextCell)
                } else {
                    self.fire(Event::SessionComplete)
                };
            }
        }

        outcome
    }

    fn charge_finished(&mut self, plan: &TestPlan, avg: &Averages, mode: RegulatorMode) -> bool {
        match plan.profile.end_of_charge {
            EndOfCharge::MinCurrent { current_ma } => {
                mode == RegulatorMode::ConstantVoltage && avg.current_magnitude_ma() <= current_ma
            }
            EndOfCharge::VoltageDrop { drop_mv } => {
                if avg.voltage_mv > self.peak_voltage_mv {
                    self.peak_voltage_mv = avg.voltage_mv;
                }
                self.peak_voltage_mv - avg.voltage_mv > drop_mv
            }
        }
    }

    fn capacity_report(&self, cell: u8) -> Report {
        Report::Capacity {
            cell,
            mah: libm::roundf(self.capacity_mah()) as u32,
        }
    }

    /// Move to the next planned phase, or Done after the last one
    fn advance(&mut self) -> Option<Transition> {
        match self.steps.get(self.step_index).copied() {
            Some(next) => {
                self.step_index += 1;
                self.fire(Event::Advance(next))
            }
            None => self.fire(Event::PlanComplete),
        }
    }

    fn fire(&mut self, event: Event) -> Option<Transition> {
        let next = self.phase.transition(event);
        if next == self.phase {
            return None;
        }

        let from = self.phase;
        self.previous = from;
        self.phase = next;
        self.enter();

        Some(Transition {
            from,
            to: next,
            cell: self.cell_index,
        })
    }

    /// Reset the counters owned by the phase just entered
    fn enter(&mut self) {
        match self.phase {
            Phase::Standby => {
                self.plan = None;
                self.steps.clear();
                self.step_index = 0;
                self.cell_index = 0;
            }
            Phase::Wait => self.wait_remaining = self.timing.wait_secs,
            phase if phase.is_resistance() => {
                self.resistance_remaining = self.timing.resistance_secs;
                self.resistance = ResistanceMeasurement::new();
            }
            phase if phase.is_charging() || phase.is_discharging() => {
                self.capacity_mas = 0.0;
                self.peak_voltage_mv = 0.0;
            }
            _ => {}
        }
    }
}
