//! Cell select relays
//!
//! Four channel relays route one cell to the sense and converter rails; the
//! main relay closes the path. At most one channel relay is energized.

use cellbench_hal::OutputPin;

use cellbench_core::config::MAX_CELLS;
use cellbench_core::traits::CellSwitch;

const CHANNELS: usize = MAX_CELLS as usize;

/// Main relay plus one select relay per cell channel
pub struct CellRelays<P> {
    main: P,
    channels: [P; CHANNELS],
    selected: Option<u8>,
}

impl<P: OutputPin> CellRelays<P> {
    /// Take ownership of the relay lines and open everything
    pub fn new(main: P, channels: [P; CHANNELS]) -> Self {
        let mut relays = Self {
            main,
            channels,
            selected: None,
        };
        relays.open_all();
        relays
    }

    pub fn selected(&self) -> Option<u8> {
        self.selected
    }

    fn open_all(&mut self) {
        self.main.set_low();
        for relay in self.channels.iter_mut() {
            relay.set_low();
        }
        self.selected = None;
    }
}

impl<P: OutputPin> CellSwitch for CellRelays<P> {
    fn connect(&mut self, cell: u8) {
        if self.selected == Some(cell) {
            return;
        }
        // Break before make
        self.open_all();
        let Some(relay) = self.channels.get_mut(cell as usize) else {
            return;
        };
        relay.set_high();
        self.main.set_high();
        self.selected = Some(cell);
    }

    fn disconnect(&mut self) {
        self.open_all();
    }
}
