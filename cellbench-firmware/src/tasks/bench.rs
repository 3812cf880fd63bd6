//! Bench control task
//!
//! Sole owner of the bench controller. Each tick: apply pending operator
//! commands, then run one control period.

use defmt::*;

use cellbench_core::bench::BenchEvents;
use cellbench_core::config::TestPlan;
use cellbench_core::sequencer::Report;
use cellbench_core::{Bench, BenchEvent};
use cellbench_protocol::Command;

use crate::board::{BoardHardware, ChannelTx};
use crate::channels::{COMMAND_CHANNEL, STOP_REQUEST};
use crate::tasks::tick::TICK_SIGNAL;

/// The bench as wired on this board
pub type BoardBench = Bench<BoardHardware, ChannelTx>;

/// Bench task - runs the controller on every tick
#[embassy_executor::task]
pub async fn bench_task(mut bench: BoardBench, plan: TestPlan) {
    info!("Bench task started");

    let mut last_tick: u32 = 0;

    loop {
        let tick = TICK_SIGNAL.wait().await;
        let missed = tick.wrapping_sub(last_tick).wrapping_sub(1);
        if last_tick != 0 && missed > 0 {
            warn!("Bench task overran, {} tick(s) missed", missed);
        }
        last_tick = tick;

        if STOP_REQUEST.signaled() {
            STOP_REQUEST.reset();
            info!("Stop requested");
            log_events(&bench.command(Command::Stop, &plan));
        }
        while let Ok(cmd) = COMMAND_CHANNEL.try_receive() {
            info!("Command: {:?}", cmd);
            log_events(&bench.command(cmd, &plan));
        }

        log_events(&bench.tick());
    }
}

fn log_events(events: &BenchEvents) {
    for event in events {
        match *event {
            BenchEvent::PhaseChanged(t) => {
                info!("Cell {}: {:?} -> {:?}", t.cell + 1, t.from, t.to);
            }
            BenchEvent::SwitchedToCv { cell } => {
                info!("Cell {}: constant voltage", cell + 1);
            }
            BenchEvent::Measured(Report::Resistance { cell, milliohms }) => {
                info!("Cell {}: internal resistance {} mOhm", cell + 1, milliohms);
            }
            BenchEvent::Measured(Report::Capacity { cell, mah }) => {
                info!("Cell {}: capacity {} mAh", cell + 1, mah);
            }
        }
    }
}
