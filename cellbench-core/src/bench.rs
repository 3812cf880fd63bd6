//! Bench controller
//!
//! Ties the sampler, regulator, safety monitor, sequencer and telemetry to
//! the hardware. One [`Bench::tick`] per control period; the caller applies
//! operator commands between ticks.
//!
//! Per tick: sample one channel, regulate, check safety. When the window
//! closes: sequencer, then telemetry.

use heapless::Vec;

use cellbench_protocol::Command;

use crate::config::{BenchConfig, TestPlan};
use crate::control::{Regulator, RegulatorMode};
use crate::safety::{SafetyMonitor, SafetyStatus};
use crate::sampler::{Averages, RunningAverage, Sampler};
use crate::sequencer::{ConverterCommand, Report, Sequencer, Transition};
use crate::state::{FaultKind, Phase};
use crate::telemetry::TelemetryEmitter;
use crate::traits::{BenchHardware, UartTx};

/// Things the firmware may want to log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BenchEvent {
    PhaseChanged(Transition),
    /// Charge regulation switched from current to voltage
    SwitchedToCv { cell: u8 },
    Measured(Report),
}

/// Events produced by one call
pub type BenchEvents = Vec<BenchEvent, 4>;

/// The test bench controller
pub struct Bench<H, T> {
    hardware: H,
    telemetry: TelemetryEmitter<T>,
    sampler: Sampler,
    average: RunningAverage,
    regulator: Regulator,
    safety: SafetyMonitor,
    sequencer: Sequencer,
    level_min: u16,
    connected: bool,
    regulating: bool,
    last_average: Averages,
}

impl<H: BenchHardware, T: UartTx> Bench<H, T> {
    /// Create the controller and put the hardware in a safe state
    pub fn new(hardware: H, tx: T, config: &BenchConfig) -> Self {
        let mut bench = Self {
            hardware,
            telemetry: TelemetryEmitter::new(tx),
            sampler: Sampler::new(config.calibration, config.control.sample_temperature),
            average: RunningAverage::new(config.control.window_ticks),
            regulator: Regulator::new(config.control),
            safety: SafetyMonitor::new(config.safety),
            sequencer: Sequencer::new(config.timing),
            level_min: config.control.level_min,
            connected: false,
            regulating: false,
            last_average: Averages::default(),
        };
        bench.apply(ConverterCommand::Off);
        bench
    }

    /// Apply an operator command
    ///
    /// `plan` is the session a start command runs.
    pub fn command(&mut self, command: Command, plan: &TestPlan) -> BenchEvents {
        match command {
            Command::Start => self.start(*plan),
            Command::Restart => self.restart(),
            Command::Stop => self.stop(),
        }
    }

    /// Begin a session; ignored unless in Standby
    pub fn start(&mut self, plan: TestPlan) -> BenchEvents {
        let mut events = BenchEvents::new();
        if let Some(t) = self.sequencer.start(plan) {
            self.enter(t, &mut events);
        }
        events
    }

    /// Return to Standby from any phase, including Fault
    pub fn restart(&mut self) -> BenchEvents {
        let mut events = BenchEvents::new();
        if let Some(t) = self.sequencer.restart() {
            self.enter(t, &mut events);
        }
        events
    }

    /// Immediate shutdown, identical to a safety fault
    pub fn stop(&mut self) -> BenchEvents {
        let mut events = BenchEvents::new();
        self.fault(FaultKind::Stopped, &mut events);
        events
    }

    /// Run one control period
    pub fn tick(&mut self) -> BenchEvents {
        let mut events = BenchEvents::new();

        let reading = self.sampler.sample(&mut self.hardware);
        let published = self
            .average
            .accumulate(self.sampler.latest(), self.connected);

        if self.regulating {
            let duty = self.regulator.update(self.sampler.latest());
            self.hardware.set_level(duty);
        }

        if !self.sequencer.phase().is_fault() {
            let status = match &reading {
                Ok(r) => self.safety.check(r, self.connected),
                Err(_) => self.safety.conversion_failed(),
            };
            if let SafetyStatus::Fault(kind) = status {
                self.fault(kind, &mut events);
                return events;
            }
        }

        if let Some(avg) = published {
            self.on_second(avg, &mut events);
        }

        events
    }

    pub fn phase(&self) -> Phase {
        self.sequencer.phase()
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn regulator(&self) -> &Regulator {
        &self.regulator
    }

    pub fn safety(&self) -> &SafetyMonitor {
        &self.safety
    }

    /// Most recently published averages
    pub fn last_average(&self) -> &Averages {
        &self.last_average
    }

    pub fn telemetry(&self) -> &TelemetryEmitter<T> {
        &self.telemetry
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    fn on_second(&mut self, avg: Averages, events: &mut BenchEvents) {
        self.last_average = avg;
        let mode_before = self.regulator.mode();
        let outcome = self.sequencer.on_second(&avg, &mut self.regulator);

        if outcome.transition.is_none()
            && mode_before == RegulatorMode::ConstantCurrent
            && self.regulator.mode() == RegulatorMode::ConstantVoltage
        {
            let _ = events.push(BenchEvent::SwitchedToCv {
                cell: self.sequencer.cell_index(),
            });
        }

        if let Some(report) = outcome.report {
            self.telemetry.report(&report);
            let _ = events.push(BenchEvent::Measured(report));
        }

        if let Some(t) = outcome.transition {
            self.enter(t, events);
        }

        match self.sequencer.phase() {
            Phase::Wait => self.telemetry.wait(self.sequencer.wait_remaining()),
            phase => self
                .telemetry
                .status(phase, self.sequencer.cell_index(), &avg),
        }
    }

    fn fault(&mut self, kind: FaultKind, events: &mut BenchEvents) {
        if let Some(t) = self.sequencer.fault(kind) {
            self.enter(t, events);
        }
    }

    /// Configure hardware and logging for the phase just entered
    fn enter(&mut self, transition: Transition, events: &mut BenchEvents) {
        let command = self.sequencer.configure(&mut self.regulator);
        self.apply(command);
        self.average.reset();

        match transition.to {
            Phase::Idle => self.telemetry.set_enabled(true),
            Phase::Standby | Phase::Fault(_) => self.telemetry.set_enabled(false),
            Phase::Done => self.telemetry.done(),
            _ => {}
        }

        let _ = events.push(BenchEvent::PhaseChanged(transition));
    }

    fn apply(&mut self, command: ConverterCommand) {
        // Direction and connection only change with the converter at minimum
        self.hardware.set_level(self.level_min);
        let cell = self.sequencer.cell_index();

        match command {
            ConverterCommand::Off => {
                self.hardware.disconnect();
                self.connected = false;
                self.regulating = false;
            }
            ConverterCommand::Sense => {
                self.hardware.connect(cell);
                self.connected = true;
                self.regulating = false;
            }
            ConverterCommand::Regulate(direction) => {
                self.hardware.set_direction(direction);
                self.hardware.connect(cell);
                self.connected = true;
                self.regulating = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        CRate, ChemistryProfile, PlanOption, SessionConfig, TimingConfig,
    };
    use crate::sim::{CaptureTx, SimBench, SimCell};
    use cellbench_protocol::{StatusFrame, WaitFrame};

    type TestBench = Bench<SimBench, CaptureTx>;

    /// Phases entered and reports seen during a run
    #[derive(Default)]
    struct History {
        phases: Vec<Phase, 64>,
        reports: Vec<Report, 16>,
        cells: Vec<u8, 64>,
        cv_switches: u32,
    }

    impl History {
        fn record(&mut self, events: &BenchEvents) {
            for event in events {
                match *event {
                    BenchEvent::PhaseChanged(t) => {
                        self.phases.push(t.to).unwrap();
                        self.cells.push(t.cell).unwrap();
                    }
                    BenchEvent::SwitchedToCv { .. } => self.cv_switches += 1,
                    BenchEvent::Measured(r) => self.reports.push(r).unwrap(),
                }
            }
        }
    }

    fn config(wait_secs: u32) -> BenchConfig {
        BenchConfig {
            timing: TimingConfig {
                wait_secs,
                ..TimingConfig::default()
            },
            ..BenchConfig::default()
        }
    }

    fn plan(option: PlanOption, cells: u8, profile: ChemistryProfile) -> TestPlan {
        TestPlan::new(option, cells, profile, CRate::Half, CRate::Half).unwrap()
    }

    fn bench(cell: SimCell, wait_secs: u32) -> TestBench {
        Bench::new(SimBench::new(cell), CaptureTx::new(), &config(wait_secs))
    }

    /// Tick until `done` holds, recording events; returns ticks used
    fn run_until(
        bench: &mut TestBench,
        history: &mut History,
        max_ticks: u32,
        done: impl Fn(&TestBench, &History) -> bool,
    ) -> u32 {
        for n in 0..max_ticks {
            if done(bench, history) {
                return n;
            }
            history.record(&bench.tick());
        }
        panic!("condition not reached in {} ticks", max_ticks);
    }

    fn run_ticks(bench: &mut TestBench, history: &mut History, ticks: u32) {
        for _ in 0..ticks {
            history.record(&bench.tick());
        }
    }

    fn in_phase(phase: Phase) -> impl Fn(&TestBench, &History) -> bool {
        move |b, _| b.phase() == phase
    }

    #[test]
    fn test_boots_safe() {
        let b = bench(SimCell::li_ion(3900.0), 600);
        assert_eq!(b.phase(), Phase::Standby);
        assert_eq!(b.hardware().level, 25);
        assert_eq!(b.hardware().connected, None);
        assert!(!b.telemetry().is_enabled());
    }

    #[test]
    fn test_standby_ignores_boundaries() {
        let mut b = bench(SimCell::li_ion(3900.0), 600);
        let mut h = History::default();
        run_ticks(&mut b, &mut h, 5000);
        assert_eq!(b.phase(), Phase::Standby);
        assert!(h.phases.is_empty());
        assert_eq!(b.telemetry().transport().count(), 0);
    }

    #[test]
    fn test_li_ion_charge_only_end_to_end() {
        let mut b = bench(SimCell::li_ion(3900.0), 600);
        let mut h = History::default();
        h.record(&b.start(plan(PlanOption::ChargeOnly, 1, ChemistryProfile::LI_ION)));
        assert_eq!(b.phase(), Phase::Idle);
        assert_eq!(b.hardware().connected, Some(0));
        assert!(b.telemetry().is_enabled());

        run_until(&mut b, &mut h, 2_000, in_phase(Phase::Charge));
        assert_eq!(b.regulator().mode(), RegulatorMode::ConstantCurrent);
        assert_eq!(b.regulator().setpoint(), 1625.0);
        assert_eq!(b.hardware().direction, crate::traits::Direction::Charge);

        // Settled on the charge current after a couple of windows
        run_ticks(&mut b, &mut h, 3_000);
        let i = b.last_average().current_ma;
        assert!(i > 1575.0 && i < 1675.0, "CC current {}", i);

        run_until(&mut b, &mut h, 60_000, |b, _| {
            b.regulator().mode() == RegulatorMode::ConstantVoltage
        });
        assert!(b.last_average().voltage_mv > 4200.0);
        assert_eq!(b.regulator().integral(), 0.0);
        assert_eq!(b.phase(), Phase::Charge);
        assert_eq!(h.cv_switches, 1);

        run_until(&mut b, &mut h, 120_000, |b, _| b.phase() != Phase::Charge);
        assert_eq!(b.phase(), Phase::Done);
        assert!(b.last_average().current_magnitude_ma() <= 100.0);
        assert!(matches!(
            h.reports.as_slice(),
            [Report::Capacity { cell: 0, .. }]
        ));
        assert_eq!(b.telemetry().transport().lines().filter(|l| *l == "\nDONE").count(), 1);

        run_until(&mut b, &mut h, 2_000, in_phase(Phase::Standby));
        assert_eq!(
            h.phases.as_slice(),
            &[Phase::Idle, Phase::Charge, Phase::Done, Phase::Standby]
        );
        assert_eq!(b.hardware().connected, None);
        assert_eq!(b.hardware().level, 25);
        assert_eq!(b.hardware().hot_direction_changes, 0);
        assert!(!b.telemetry().is_enabled());
    }

    #[test]
    fn test_status_lines_while_charging() {
        let mut b = bench(SimCell::li_ion(3900.0), 600);
        let mut h = History::default();
        b.start(plan(PlanOption::ChargeOnly, 1, ChemistryProfile::LI_ION));
        run_until(&mut b, &mut h, 2_000, in_phase(Phase::Charge));
        let before = b.telemetry().transport().count();
        run_ticks(&mut b, &mut h, 3_000);
        assert_eq!(b.telemetry().transport().count(), before + 3);

        let frame = StatusFrame::parse(b.telemetry().transport().last().unwrap()).unwrap();
        assert_eq!(frame.phase_id, 6);
        assert_eq!(frame.cell, 1);
        assert!(frame.current_ma_x10 > 15_750 && frame.current_ma_x10 < 16_750);
        assert!(frame.voltage_mv_x10 > 40_000 && frame.voltage_mv_x10 < 42_000);
        assert_eq!(frame.temperature, 1830);
    }

    #[test]
    fn test_full_cycle_phase_order() {
        let mut b = bench(SimCell::li_ion(3300.0), 2);
        let mut h = History::default();
        h.record(&b.start(plan(PlanOption::FullCycle, 1, ChemistryProfile::LI_ION)));
        run_until(&mut b, &mut h, 600_000, in_phase(Phase::Standby));

        assert_eq!(
            h.phases.as_slice(),
            &[
                Phase::Idle,
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
                Phase::Done,
                Phase::Standby,
            ]
        );

        let resistances = h
            .reports
            .iter()
            .filter(|r| matches!(r, Report::Resistance { milliohms, .. } if *milliohms > 50))
            .count();
        let capacities = h
            .reports
            .iter()
            .filter(|r| matches!(r, Report::Capacity { .. }))
            .count();
        assert_eq!(resistances, 3);
        assert_eq!(capacities, 4);
        assert_eq!(h.cv_switches, 2);
        assert_eq!(b.hardware().hot_direction_changes, 0);
    }

    #[test]
    fn test_resistance_matches_cell() {
        // Already at end of discharge, so the measurement follows at once
        let mut cell = SimCell::li_ion(3100.0);
        cell.mv_per_mas = 0.0001;
        let mut b = bench(cell, 600);
        let mut h = History::default();
        h.record(&b.start(plan(PlanOption::FullCycle, 1, ChemistryProfile::LI_ION)));
        run_until(&mut b, &mut h, 30_000, in_phase(Phase::Wait));

        let measured = h.reports.iter().find_map(|r| match r {
            Report::Resistance { milliohms, .. } => Some(*milliohms),
            _ => None,
        });
        let r = measured.unwrap();
        assert!((95..=105).contains(&r), "measured {} mΩ", r);
        assert_eq!(
            b.telemetry().transport().lines().filter(|l| l.starts_with("\nR-C1,R")).count(),
            1
        );
    }

    #[test]
    fn test_ni_mh_ends_on_voltage_drop() {
        let mut b = bench(SimCell::ni_mh(1350.0, 1450.0), 600);
        let mut h = History::default();
        b.start(plan(PlanOption::ChargeOnly, 1, ChemistryProfile::NI_MH));
        run_until(&mut b, &mut h, 2_000, in_phase(Phase::Charge));
        assert_eq!(b.regulator().setpoint(), 1000.0);

        run_until(&mut b, &mut h, 60_000, |b, _| b.phase() != Phase::Charge);
        assert_eq!(b.phase(), Phase::Done);
        assert!(b.hardware().cells[0].past_peak);
        // Never reached the CV setpoint
        assert_eq!(h.cv_switches, 0);
    }

    #[test]
    fn test_wait_countdown_frames() {
        let mut b = bench(SimCell::li_ion(4100.0), 3);
        let mut h = History::default();
        h.record(&b.start(plan(PlanOption::ChargeDischarge, 1, ChemistryProfile::LI_ION)));
        run_until(&mut b, &mut h, 120_000, in_phase(Phase::Discharge));

        let tail: Vec<&str, 64> = b.telemetry().transport().lines().collect();
        let n = tail.len();
        assert!(tail[n - 5].starts_with("\nQ-C1,Q"));
        let waits: Vec<u32, 3> = tail[n - 4..n - 1]
            .iter()
            .map(|l| WaitFrame::parse(l).unwrap().seconds_remaining)
            .collect();
        assert_eq!(waits.as_slice(), &[3, 2, 1]);
        assert_eq!(StatusFrame::parse(tail[n - 1]).unwrap().phase_id, 7);

        assert_eq!(
            h.phases.as_slice(),
            &[Phase::Idle, Phase::Charge, Phase::Wait, Phase::Discharge]
        );
        assert_eq!(b.hardware().direction, crate::traits::Direction::Discharge);
    }

    #[test]
    fn test_cells_tested_in_turn() {
        let mut b = bench(SimCell::li_ion(3200.0), 600);
        let mut h = History::default();
        h.record(&b.start(plan(PlanOption::DischargeOnly, 2, ChemistryProfile::LI_ION)));
        run_until(&mut b, &mut h, 60_000, |b, h| {
            b.phase() == Phase::Discharge && h.cells.last() == Some(&1)
        });
        assert_eq!(b.hardware().connected, Some(1));
        // The first cell was left discharged
        assert!(b.hardware().cells[0].ocv_mv < b.hardware().cells[1].ocv_mv);

        run_until(&mut b, &mut h, 60_000, in_phase(Phase::Standby));
        assert_eq!(
            h.phases.as_slice(),
            &[
                Phase::Idle,
                Phase::Discharge,
                Phase::Done,
                Phase::Idle,
                Phase::Discharge,
                Phase::Done,
                Phase::Standby,
            ]
        );
        assert_eq!(&h.cells[..6], &[0, 0, 0, 1, 1, 1]);
        assert!(matches!(h.reports[1], Report::Capacity { cell: 1, .. }));
    }

    #[test]
    fn test_cell_removed_mid_charge() {
        let mut b = bench(SimCell::li_ion(3900.0), 600);
        let mut h = History::default();
        b.start(plan(PlanOption::ChargeOnly, 1, ChemistryProfile::LI_ION));
        run_until(&mut b, &mut h, 2_000, in_phase(Phase::Charge));
        run_ticks(&mut b, &mut h, 1_500);
        assert!(b.hardware().level > 100);

        b.hardware_mut().cells[0].present = false;
        // Voltage is read every third tick; the fault lands on the first voltage read
        let ticks = run_until(&mut b, &mut h, 10, |b, _| b.phase().is_fault());
        assert!(ticks <= 3);
        assert_eq!(b.phase(), Phase::Fault(FaultKind::CellAbsentOrLow));
        assert_eq!(b.sequencer().previous(), Phase::Charge);
        assert_eq!(b.hardware().level, 25);
        assert_eq!(b.hardware().connected, None);
        assert!(!b.telemetry().is_enabled());

        // Terminal until restarted
        run_ticks(&mut b, &mut h, 3_000);
        assert!(b.phase().is_fault());
        b.start(plan(PlanOption::ChargeOnly, 1, ChemistryProfile::LI_ION));
        assert!(b.phase().is_fault());
        b.restart();
        assert_eq!(b.phase(), Phase::Standby);
    }

    #[test]
    fn test_empty_channel_faults_in_idle() {
        let mut cell = SimCell::li_ion(3900.0);
        cell.present = false;
        let mut b = bench(cell, 600);
        let mut h = History::default();
        b.start(plan(PlanOption::ChargeOnly, 1, ChemistryProfile::LI_ION));
        run_until(&mut b, &mut h, 10, |b, _| b.phase().is_fault());
        assert_eq!(b.sequencer().previous(), Phase::Idle);
        assert_eq!(b.safety().trips(), 1);
    }

    #[test]
    fn test_stop_is_a_fault() {
        let mut b = bench(SimCell::li_ion(3300.0), 600);
        let mut h = History::default();
        b.start(plan(PlanOption::DischargeOnly, 1, ChemistryProfile::LI_ION));
        run_until(&mut b, &mut h, 2_000, in_phase(Phase::Discharge));
        run_ticks(&mut b, &mut h, 500);

        h.record(&b.stop());
        assert_eq!(b.phase(), Phase::Fault(FaultKind::Stopped));
        assert_eq!(b.sequencer().previous(), Phase::Discharge);
        assert_eq!(b.hardware().level, 25);
        assert_eq!(b.hardware().connected, None);

        // A second stop changes nothing
        assert!(b.stop().is_empty());
    }

    #[test]
    fn test_conversion_error_faults() {
        let mut b = bench(SimCell::li_ion(3900.0), 600);
        let mut h = History::default();
        b.start(plan(PlanOption::ChargeOnly, 1, ChemistryProfile::LI_ION));
        run_until(&mut b, &mut h, 2_000, in_phase(Phase::Charge));
        b.hardware_mut().fail_channel = Some(crate::traits::SenseChannel::Current);
        run_until(&mut b, &mut h, 10, |b, _| b.phase().is_fault());
        assert_eq!(b.phase(), Phase::Fault(FaultKind::SensorOutOfRange));
    }

    #[test]
    fn test_sensor_rail_faults() {
        let mut b = bench(SimCell::li_ion(3900.0), 600);
        let mut h = History::default();
        b.hardware_mut().temperature_raw = 4095;
        run_until(&mut b, &mut h, 10, |b, _| b.phase().is_fault());
        assert_eq!(b.phase(), Phase::Fault(FaultKind::SensorOutOfRange));
        assert_eq!(b.sequencer().previous(), Phase::Standby);
    }

    #[test]
    fn test_operator_commands() {
        let mut b = bench(SimCell::li_ion(3900.0), 600);
        let session = SessionConfig::default().to_plan().unwrap();

        let events = b.command(Command::Start, &session);
        assert!(matches!(
            events.as_slice(),
            [BenchEvent::PhaseChanged(Transition { to: Phase::Idle, .. })]
        ));
        b.command(Command::Stop, &session);
        assert_eq!(b.phase(), Phase::Fault(FaultKind::Stopped));
        b.command(Command::Restart, &session);
        assert_eq!(b.phase(), Phase::Standby);
    }

    #[test]
    fn test_transport_errors_do_not_stall_control() {
        let mut b = bench(SimCell::li_ion(3900.0), 600);
        let mut h = History::default();
        b.telemetry.transport_mut().fail = true;
        b.start(plan(PlanOption::ChargeOnly, 1, ChemistryProfile::LI_ION));
        run_until(&mut b, &mut h, 120_000, in_phase(Phase::Done));
        assert!(b.telemetry().dropped() > 10);
        assert_eq!(b.telemetry().sent(), 0);
    }
}
