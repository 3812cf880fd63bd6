//! Telemetry emitter
//!
//! Formats the per-second lines and hands them to the byte transport. A
//! transport error drops the line; control never waits on telemetry.

use cellbench_protocol::{
    CapacityFrame, ResistanceFrame, StatusFrame, TelemetryFrame, WaitFrame,
};

use crate::sampler::Averages;
use crate::sequencer::Report;
use crate::state::Phase;
use crate::traits::UartTx;

/// Line emitter with an enable gate
pub struct TelemetryEmitter<T> {
    tx: T,
    enabled: bool,
    sent: u32,
    dropped: u32,
}

impl<T: UartTx> TelemetryEmitter<T> {
    /// Create an emitter, initially disabled
    pub fn new(tx: T) -> Self {
        Self {
            tx,
            enabled: false,
            sent: 0,
            dropped: 0,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Per-second status line; `cell` is 0-based
    pub fn status(&mut self, phase: Phase, cell: u8, avg: &Averages) {
        self.send(TelemetryFrame::Status(StatusFrame {
            phase_id: phase.id(),
            cell: cell + 1,
            voltage_mv_x10: x10(avg.voltage_mv),
            current_ma_x10: x10(avg.current_magnitude_ma()),
            temperature: avg.temperature as i32,
        }));
    }

    /// Countdown line shown instead of the status line while resting
    pub fn wait(&mut self, seconds_remaining: u32) {
        self.send(TelemetryFrame::Wait(WaitFrame { seconds_remaining }));
    }

    pub fn report(&mut self, report: &Report) {
        let frame = match *report {
            Report::Resistance { cell, milliohms } => {
                TelemetryFrame::Resistance(ResistanceFrame {
                    cell: cell + 1,
                    milliohms,
                })
            }
            Report::Capacity { cell, mah } => TelemetryFrame::Capacity(CapacityFrame {
                cell: cell + 1,
                mah,
            }),
        };
        self.send(frame);
    }

    /// A cell finished its plan
    pub fn done(&mut self) {
        self.send(TelemetryFrame::Done);
    }

    /// Lines handed to the transport
    pub fn sent(&self) -> u32 {
        self.sent
    }

    /// Lines lost to encoding or transport errors
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    pub fn transport(&self) -> &T {
        &self.tx
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.tx
    }

    fn send(&mut self, frame: TelemetryFrame) {
        if !self.enabled {
            return;
        }
        let delivered = match frame.encode() {
            Ok(line) => self.tx.write_blocking(line.as_bytes()).is_ok(),
            Err(_) => false,
        };
        if delivered {
            self.sent = self.sent.wrapping_add(1);
        } else {
            self.dropped = self.dropped.wrapping_add(1);
        }
    }
}

/// Scale to one implied decimal, saturating at zero
fn x10(value: f32) -> u32 {
    libm::roundf(value * 10.0).max(0.0) as u32
}
