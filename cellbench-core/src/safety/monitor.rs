//! Safety monitor implementation
//!
//! Checks the channel converted on this tick against the plausibility
//! bounds and the cell presence threshold.

use crate::config::SafetyLimits;
use crate::sampler::Reading;
use crate::state::FaultKind;
use crate::traits::SenseChannel;

/// Safety condition status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyStatus {
    /// All conditions normal
    Ok,
    /// Safety condition violated
    Fault(FaultKind),
}

impl SafetyStatus {
    pub fn is_fault(&self) -> bool {
        matches!(self, SafetyStatus::Fault(_))
    }
}

/// Per-tick safety supervision
#[derive(Debug, Clone)]
pub struct SafetyMonitor {
    limits: SafetyLimits,
    /// Number of faults raised since boot
    trips: u32,
}

impl SafetyMonitor {
    pub fn new(limits: SafetyLimits) -> Self {
        Self { limits, trips: 0 }
    }

    /// Check the reading taken on this tick
    ///
    /// `connected` is whether a cell is switched onto the converter; the
    /// presence check only applies then.
    pub fn check(&mut self, reading: &Reading, connected: bool) -> SafetyStatus {
        let status = self.evaluate(reading, connected);
        if status.is_fault() {
            self.trips = self.trips.saturating_add(1);
        }
        status
    }

    /// A failed conversion is treated like an out-of-range reading
    pub fn conversion_failed(&mut self) -> SafetyStatus {
        self.trips = self.trips.saturating_add(1);
        SafetyStatus::Fault(FaultKind::SensorOutOfRange)
    }

    pub fn trips(&self) -> u32 {
        self.trips
    }

    fn evaluate(&self, reading: &Reading, connected: bool) -> SafetyStatus {
        let limits = &self.limits;

        if reading.raw >= limits.adc_full_scale {
            return SafetyStatus::Fault(FaultKind::SensorOutOfRange);
        }

        let plausible = match reading.channel {
            SenseChannel::Voltage => reading.value <= limits.max_voltage_mv,
            SenseChannel::Current => libm::fabsf(reading.value) <= limits.max_current_ma,
            SenseChannel::Temperature => {
                reading.value >= limits.min_temperature && reading.value <= limits.max_temperature
            }
        };
        if !plausible {
            return SafetyStatus::Fault(FaultKind::SensorOutOfRange);
        }

        if connected
            && reading.channel == SenseChannel::Voltage
            && reading.value < limits.presence_mv
        {
            return SafetyStatus::Fault(FaultKind::CellAbsentOrLow);
        }

        SafetyStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> SafetyMonitor {
        SafetyMonitor::new(SafetyLimits::default())
    }

    fn reading(channel: SenseChannel, raw: u16, value: f32) -> Reading {
        Reading {
            channel,
            raw,
            value,
        }
    }

    #[test]
    fn test_normal_readings_ok() {
        let mut m = monitor();
        assert_eq!(
            m.check(&reading(SenseChannel::Voltage, 3000, 3870.0), true),
            SafetyStatus::Ok
        );
        assert_eq!(
            m.check(&reading(SenseChannel::Current, 2700, -1625.0), true),
            SafetyStatus::Ok
        );
        assert_eq!(
            m.check(&reading(SenseChannel::Temperature, 1830, 1830.0), true),
            SafetyStatus::Ok
        );
        assert_eq!(m.trips(), 0);
    }

    #[test]
    fn test_cell_absent_when_connected() {
        let mut m = monitor();
        assert_eq!(
            m.check(&reading(SenseChannel::Voltage, 8, 0.0), true),
            SafetyStatus::Fault(FaultKind::CellAbsentOrLow)
        );
        assert_eq!(m.trips(), 1);
    }

    #[test]
    fn test_presence_ignored_when_disconnected() {
        let mut m = monitor();
        assert_eq!(
            m.check(&reading(SenseChannel::Voltage, 8, 0.0), false),
            SafetyStatus::Ok
        );
    }

    #[test]
    fn test_presence_only_checks_voltage() {
        let mut m = monitor();
        assert_eq!(
            m.check(&reading(SenseChannel::Current, 2048, 0.0), true),
            SafetyStatus::Ok
        );
    }

    #[test]
    fn test_raw_at_rail() {
        let mut m = monitor();
        assert_eq!(
            m.check(&reading(SenseChannel::Current, 4095, 100.0), false),
            SafetyStatus::Fault(FaultKind::SensorOutOfRange)
        );
    }

    #[test]
    fn test_implausible_values() {
        let mut m = monitor();
        assert_eq!(
            m.check(&reading(SenseChannel::Voltage, 3900, 5010.0), true),
            SafetyStatus::Fault(FaultKind::SensorOutOfRange)
        );
        assert_eq!(
            m.check(&reading(SenseChannel::Current, 500, -4500.0), true),
            SafetyStatus::Fault(FaultKind::SensorOutOfRange)
        );
        assert_eq!(
            m.check(&reading(SenseChannel::Temperature, 2, 2.0), true),
            SafetyStatus::Fault(FaultKind::SensorOutOfRange)
        );
        assert_eq!(m.trips(), 3);
    }

    #[test]
    fn test_conversion_failure() {
        let mut m = monitor();
        assert_eq!(
            m.conversion_failed(),
            SafetyStatus::Fault(FaultKind::SensorOutOfRange)
        );
        assert_eq!(m.trips(), 1);
    }
}
