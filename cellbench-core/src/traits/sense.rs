//! Analog sensing traits

/// Sensed channels, in sampling rotation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SenseChannel {
    /// Cell voltage
    Voltage,
    /// Cell current (bidirectional)
    Current,
    /// Cell temperature sensor
    Temperature,
}

/// Errors that can occur while sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// ADC conversion failed or timed out
    ConversionError,
    /// Channel not wired on this board
    Unavailable,
}

/// Raw analog front end
///
/// Implementations perform one blocking conversion per call. Raw counts are
/// returned uncalibrated; conversion to physical units happens in the
/// sampler.
pub trait AnalogFrontEnd {
    /// Convert one channel and return the raw count
    fn read_raw(&mut self, channel: SenseChannel) -> Result<u16, SensorError>;
}
