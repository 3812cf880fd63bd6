//! Telemetry line encoding
//!
//! Lines are composed into a fixed-capacity buffer so the controller never
//! allocates; the caller hands the bytes to the serial transport.

use core::fmt::Write;

use heapless::String;

/// Longest line the controller ever emits, including the leading line feed
pub const MAX_LINE_LEN: usize = 64;

/// One encoded telemetry line
pub type Line = String<MAX_LINE_LEN>;

const WAIT_OPEN: &str = "------------W-";
const WAIT_CLOSE: &str = "-W------------";

/// Errors that can occur while encoding a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Formatted line does not fit in [`MAX_LINE_LEN`]
    LineTooLong,
}

impl From<core::fmt::Error> for EncodeError {
    fn from(_: core::fmt::Error) -> Self {
        EncodeError::LineTooLong
    }
}

/// Once-per-second status report
///
/// Voltage and current carry one implied decimal digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusFrame {
    /// Numeric phase identifier
    pub phase_id: u8,
    /// Cell number, 1-based
    pub cell: u8,
    /// Averaged voltage in mV × 10
    pub voltage_mv_x10: u32,
    /// Averaged current magnitude in mA × 10
    pub current_ma_x10: u32,
    /// Averaged temperature channel, calibrated units
    pub temperature: i32,
}

impl StatusFrame {
    /// Parse a status line as emitted by [`TelemetryFrame::encode`]
    ///
    /// Used by host-side tooling and tests; the controller never parses.
    pub fn parse(line: &str) -> Option<Self> {
        let body = line
            .trim_start_matches('\n')
            .strip_prefix("S-")?
            .strip_suffix("<-")?;
        let (phase, rest) = body.split_once("-S->C")?;

        let mut fields = rest.split(',');
        let cell = fields.next()?.parse().ok()?;
        let voltage_mv_x10 = fields.next()?.strip_prefix('V')?.parse().ok()?;
        let current_ma_x10 = fields.next()?.strip_prefix('I')?.parse().ok()?;
        let temperature = fields.next()?.strip_prefix('T')?.parse().ok()?;
        if fields.next().is_some() {
            return None;
        }

        Some(Self {
            phase_id: phase.parse().ok()?,
            cell,
            voltage_mv_x10,
            current_ma_x10,
            temperature,
        })
    }
}

/// Countdown shown while resting between phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WaitFrame {
    /// Seconds left before the next phase starts
    pub seconds_remaining: u32,
}

impl WaitFrame {
    /// Parse a wait countdown line
    pub fn parse(line: &str) -> Option<Self> {
        let seconds = line
            .trim_start_matches('\n')
            .strip_prefix(WAIT_OPEN)?
            .strip_suffix(WAIT_CLOSE)?;
        Some(Self {
            seconds_remaining: seconds.parse().ok()?,
        })
    }
}

/// Result of a DC internal resistance measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResistanceFrame {
    /// Cell number, 1-based
    pub cell: u8,
    /// Resistance in milliohms (signed, ΔV/ΔI)
    pub milliohms: i32,
}

/// Charge moved during a charge or discharge phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CapacityFrame {
    /// Cell number, 1-based
    pub cell: u8,
    /// Accumulated capacity in mAh
    pub mah: u32,
}

/// Every line the controller can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryFrame {
    Status(StatusFrame),
    Wait(WaitFrame),
    Resistance(ResistanceFrame),
    Capacity(CapacityFrame),
    /// A cell finished its test plan
    Done,
}

impl TelemetryFrame {
    /// Encode this frame as an ASCII line with a leading line feed
    pub fn encode(&self) -> Result<Line, EncodeError> {
        let mut line = Line::new();
        line.push('\n').map_err(|_| EncodeError::LineTooLong)?;

        match self {
            TelemetryFrame::Status(s) => write!(
                line,
                "S-{}-S->C{},V{},I{},T{}<-",
                s.phase_id, s.cell, s.voltage_mv_x10, s.current_ma_x10, s.temperature
            )?,
            TelemetryFrame::Wait(w) => {
                write!(line, "{}{}{}", WAIT_OPEN, w.seconds_remaining, WAIT_CLOSE)?
            }
            TelemetryFrame::Resistance(r) => write!(line, "R-C{},R{}-R", r.cell, r.milliohms)?,
            TelemetryFrame::Capacity(q) => write!(line, "Q-C{},Q{}-Q", q.cell, q.mah)?,
            TelemetryFrame::Done => line.push_str("DONE").map_err(|_| EncodeError::LineTooLong)?,
        }

        Ok(line)
    }
}
