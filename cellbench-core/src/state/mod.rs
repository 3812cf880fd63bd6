//! Phase state machine
//!
//! Explicit, finite and deterministic. The sequencer feeds it events; the
//! table in [`Phase::transition`] decides where they lead.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::{FaultKind, Phase};
