//! Simulated bench hardware for unit tests
//!
//! A first-order cell model behind the hardware traits: terminal voltage is
//! the open-circuit voltage plus an ohmic drop, and the open-circuit voltage
//! moves with the charge passed. Converter current is proportional to the
//! duty above its minimum. Each `read_raw` call advances the model by one
//! tick.

use heapless::Deque;

use cellbench_hal::{TransportError, UartTx};
use cellbench_protocol::Line;

use crate::config::Calibration;
use crate::traits::{AnalogFrontEnd, CellSwitch, Direction, PowerStage, SenseChannel, SensorError};

const TICK_S: f32 = 0.001;
const LEVEL_MIN: u16 = 25;
const MA_PER_COUNT: f32 = 10.0;

/// Cell model
#[derive(Debug, Clone, Copy)]
pub struct SimCell {
    pub ocv_mv: f32,
    pub resistance_mohm: f32,
    /// Open-circuit voltage change per mA·s passed
    pub mv_per_mas: f32,
    /// Open-circuit voltage where a Ni-MH cell peaks and starts to fall
    pub peak_mv: Option<f32>,
    pub past_peak: bool,
    pub present: bool,
}

impl SimCell {
    pub fn li_ion(ocv_mv: f32) -> Self {
        Self {
            ocv_mv,
            resistance_mohm: 100.0,
            mv_per_mas: 0.018,
            peak_mv: None,
            past_peak: false,
            present: true,
        }
    }

    pub fn ni_mh(ocv_mv: f32, peak_mv: f32) -> Self {
        Self {
            ocv_mv,
            resistance_mohm: 50.0,
            mv_per_mas: 0.01,
            peak_mv: Some(peak_mv),
            past_peak: false,
            present: true,
        }
    }
}

/// Simulated analog front end, converter and relays
pub struct SimBench {
    pub cells: [SimCell; 4],
    pub level: u16,
    pub direction: Direction,
    pub connected: Option<u8>,
    pub temperature_raw: u16,
    pub fail_channel: Option<SenseChannel>,
    /// Direction changes made while the converter was driven
    pub hot_direction_changes: u32,
    pub ticks: u64,
    calibration: Calibration,
}

impl SimBench {
    pub fn new(cell: SimCell) -> Self {
        Self {
            cells: [cell; 4],
            level: LEVEL_MIN,
            direction: Direction::Charge,
            connected: None,
            temperature_raw: 1830,
            fail_channel: None,
            hot_direction_changes: 0,
            ticks: 0,
            calibration: Calibration::default(),
        }
    }

    fn active(&self) -> Option<&SimCell> {
        self.connected
            .map(|c| &self.cells[c as usize])
            .filter(|cell| cell.present)
    }

    /// Signed cell current, positive into the cell
    pub fn current_ma(&self) -> f32 {
        if self.active().is_none() {
            return 0.0;
        }
        let magnitude = (self.level as f32 - LEVEL_MIN as f32).max(0.0) * MA_PER_COUNT;
        match self.direction {
            Direction::Charge => magnitude,
            Direction::Discharge => -magnitude,
        }
    }

    /// Terminal voltage of the connected cell
    pub fn voltage_mv(&self) -> f32 {
        match self.active() {
            Some(cell) => cell.ocv_mv + cell.resistance_mohm / 1000.0 * self.current_ma(),
            None => 0.0,
        }
    }

    fn step(&mut self) {
        self.ticks += 1;
        let current = self.current_ma();
        let Some(index) = self.connected else {
            return;
        };
        let cell = &mut self.cells[index as usize];
        if !cell.present {
            return;
        }

        let delta = cell.mv_per_mas * current * TICK_S;
        if let Some(peak) = cell.peak_mv {
            if current > 0.0 && cell.ocv_mv >= peak {
                cell.past_peak = true;
            }
        }
        if cell.past_peak && current > 0.0 {
            cell.ocv_mv -= delta;
        } else {
            cell.ocv_mv += delta;
        }
    }

    fn to_raw(value: f32, scale: f32, offset: f32) -> u16 {
        let raw = libm::roundf((value - offset) / scale);
        if raw <= 0.0 {
            0
        } else if raw >= 4095.0 {
            4095
        } else {
            raw as u16
        }
    }
}

impl AnalogFrontEnd for SimBench {
    fn read_raw(&mut self, channel: SenseChannel) -> Result<u16, SensorError> {
        self.step();
        if self.fail_channel == Some(channel) {
            return Err(SensorError::ConversionError);
        }

        let cal = &self.calibration;
        Ok(match channel {
            SenseChannel::Voltage => {
                Self::to_raw(self.voltage_mv(), cal.voltage.scale, cal.voltage.offset)
            }
            SenseChannel::Current => {
                let c = &cal.current;
                let x = c.zero_point + self.current_ma() / c.gain;
                Self::to_raw(x, c.stage.scale, c.stage.offset)
            }
            SenseChannel::Temperature => self.temperature_raw,
        })
    }
}

impl PowerStage for SimBench {
    fn set_level(&mut self, level: u16) {
        self.level = level;
    }

    fn set_direction(&mut self, direction: Direction) {
        if direction != self.direction && self.level != LEVEL_MIN {
            self.hot_direction_changes += 1;
        }
        self.direction = direction;
    }
}

impl CellSwitch for SimBench {
    fn connect(&mut self, cell: u8) {
        self.connected = Some(cell);
    }

    fn disconnect(&mut self) {
        self.connected = None;
    }
}

/// Telemetry sink keeping the most recent lines
pub struct CaptureTx {
    lines: Deque<Line, 64>,
    count: u32,
    pub fail: bool,
}

impl CaptureTx {
    pub fn new() -> Self {
        Self {
            lines: Deque::new(),
            count: 0,
            fail: false,
        }
    }

    /// Total lines accepted
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(|l| l.as_str())
    }

    /// Retained lines, oldest first
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.as_str())
    }
}

impl UartTx for CaptureTx {
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if self.fail {
            return Err(TransportError::Full);
        }
        let text = core::str::from_utf8(data).map_err(|_| TransportError::Framing)?;
        let mut line = Line::new();
        line.push_str(text).map_err(|_| TransportError::Full)?;
        if self.lines.is_full() {
            self.lines.pop_front();
        }
        let _ = self.lines.push_back(line);
        self.count += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}
