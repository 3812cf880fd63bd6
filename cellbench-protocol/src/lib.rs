//! Bench Terminal Protocol
//!
//! This crate defines the byte-level protocol between the bench controller
//! and the operator terminal. Everything is printable ASCII with a leading
//! line feed, fixed field order and no checksum; the consumer knows the
//! schema out of band.
//!
//! # Frames (controller → terminal)
//!
//! ```text
//! status     \nS-<phase>-S->C<cell>,V<mV×10>,I<mA×10>,T<temp><-
//! wait       \n------------W-<seconds>-W------------
//! resistance \nR-C<cell>,R<milliohms>-R
//! capacity   \nQ-C<cell>,Q<mAh>-Q
//! done       \nDONE
//! ```
//!
//! # Commands (terminal → controller)
//!
//! Single bytes: `s` start, `r` restart, `x` stop. Everything else belongs
//! to the menu layer and is ignored here.

#![no_std]
#![deny(unsafe_code)]

pub mod command;
pub mod telemetry;

pub use command::Command;
pub use telemetry::{
    CapacityFrame, EncodeError, Line, ResistanceFrame, StatusFrame, TelemetryFrame, WaitFrame,
    MAX_LINE_LEN,
};
