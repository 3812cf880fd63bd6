//! Operator commands
//!
//! The terminal menu owns every other keystroke; the controller only reacts
//! to these three.

/// Command byte values (lower case; upper case is accepted too)
const CMD_START: u8 = b's';
const CMD_RESTART: u8 = b'r';
const CMD_STOP: u8 = b'x';

/// Commands the controller reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Begin the configured test session
    Start,
    /// Leave Fault (or abandon a session) and return to standby
    Restart,
    /// Immediate shutdown, same effect as a safety fault
    Stop,
}

impl Command {
    /// Decode a command from a received byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte.to_ascii_lowercase() {
            CMD_START => Some(Command::Start),
            CMD_RESTART => Some(Command::Restart),
            CMD_STOP => Some(Command::Stop),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            Command::Start => CMD_START,
            Command::Restart => CMD_RESTART,
            Command::Stop => CMD_STOP,
        }
    }

    /// Returns true if the command must preempt whatever is running
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Command::Stop)
    }
}
