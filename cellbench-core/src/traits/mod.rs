//! Hardware abstraction traits
//!
//! These traits define the interface between the control logic and the
//! board-specific implementations. Telemetry goes through
//! [`cellbench_hal::UartTx`].

pub mod power;
pub mod sense;

pub use cellbench_hal::UartTx;
pub use power::{BenchHardware, CellSwitch, Direction, PowerStage};
pub use sense::{AnalogFrontEnd, SenseChannel, SensorError};
