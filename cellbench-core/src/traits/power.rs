//! Power stage and cell switching traits

use super::AnalogFrontEnd;

/// Converter direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Current flows into the cell
    #[default]
    Charge,
    /// Current flows out of the cell into the load
    Discharge,
}

/// Switching converter driven by a duty level
pub trait PowerStage {
    /// Set the actuator level in duty counts
    ///
    /// Callers keep the level inside the configured range.
    fn set_level(&mut self, level: u16);

    /// Select charge or discharge
    ///
    /// Only called while the level is at its minimum.
    fn set_direction(&mut self, direction: Direction);
}

/// Cell channel selection
pub trait CellSwitch {
    /// Connect the converter to a cell (0-based index)
    fn connect(&mut self, cell: u8);

    /// Open every cell connection
    fn disconnect(&mut self);
}

/// Everything the bench controller drives
pub trait BenchHardware: AnalogFrontEnd + PowerStage + CellSwitch {}

// Blanket implementation
impl<T: AnalogFrontEnd + PowerStage + CellSwitch> BenchHardware for T {}
