//! Simulated Genesys ASIC behind the `genesys_traits::Transport` seam.
//!
//! The simulator keeps a register file, records every register and bulk
//! write, serves a deterministic image stream on bulk reads and models the
//! scan/motor status bits well enough to exercise start and stop sequences.
pub mod error;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use genesys_traits::Transport;

use crate::error::HwError;

/// Scan control register; bit 0 enables scanning.
const REG_SCAN_CTRL: u16 = 0x01;
const SCAN_BIT: u8 = 0x01;
/// Motor start trigger.
const REG_MOTOR_START: u16 = 0x0f;
/// Buffer address registers (address >> 4, high byte then low byte).
const REG_ADDR_HIGH: u16 = 0x2a;
const REG_ADDR_LOW: u16 = 0x2b;
/// Status register with data-enable and motor-moving flags.
const REG_STATUS: u16 = 0x40;
const STATUS_DATAENB: u8 = 0x01;
const STATUS_MOTMFLG: u8 = 0x02;
/// Secondary status register; bit 3 reports the head at home.
const REG_STATUS2: u16 = 0x41;
const STATUS2_HOMESNR: u8 = 0x08;

/// One recorded bulk write and the buffer address it was aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkWrite {
    pub address: u32,
    pub data: Vec<u8>,
}

/// Source of the bytes served by `bulk_read`.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Endless `offset % 251` ramp.
    Pattern,
    /// Fixed bytes; reading past the end fails with `ShortRead`.
    Bytes(Vec<u8>),
}

#[derive(Debug)]
struct SimState {
    registers: BTreeMap<u16, u8>,
    register_writes: Vec<(u16, u8)>,
    bulk_writes: Vec<BulkWrite>,
    bulk_reads: Vec<usize>,
    image: ImageSource,
    read_offset: usize,
    scanning: bool,
    stop_requested: bool,
    polls_since_stop: u32,
    stop_after_polls: Option<u32>,
    fail_bulk_read_after: Option<usize>,
    disconnected: bool,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            registers: BTreeMap::new(),
            register_writes: Vec::new(),
            bulk_writes: Vec::new(),
            bulk_reads: Vec::new(),
            image: ImageSource::Pattern,
            read_offset: 0,
            scanning: false,
            stop_requested: false,
            polls_since_stop: 0,
            stop_after_polls: Some(1),
            fail_bulk_read_after: None,
            disconnected: false,
        }
    }
}

impl SimState {
    fn status(&mut self) -> u8 {
        if self.stop_requested {
            self.polls_since_stop = self.polls_since_stop.saturating_add(1);
            if let Some(n) = self.stop_after_polls
                && self.polls_since_stop >= n
            {
                self.scanning = false;
                self.stop_requested = false;
            }
        }
        if self.scanning {
            STATUS_DATAENB | STATUS_MOTMFLG
        } else {
            0
        }
    }

    fn buffer_address(&self) -> u32 {
        let high = u32::from(self.registers.get(&REG_ADDR_HIGH).copied().unwrap_or(0));
        let low = u32::from(self.registers.get(&REG_ADDR_LOW).copied().unwrap_or(0));
        ((high << 8) | low) << 4
    }
}

/// Simulated scanner transport.
///
/// Clones share state, so a test can keep one handle for inspection while
/// the device under test owns another.
#[derive(Debug, Clone, Default)]
pub struct SimulatedScanner {
    state: Rc<RefCell<SimState>>,
}

impl SimulatedScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `image` on bulk reads instead of the default ramp.
    pub fn with_image(self, image: ImageSource) -> Self {
        self.state.borrow_mut().image = image;
        self
    }

    /// Number of status polls after a stop request before the ASIC reports
    /// idle. `None` simulates a motor that never stops.
    pub fn with_stop_after_polls(self, polls: Option<u32>) -> Self {
        self.state.borrow_mut().stop_after_polls = polls;
        self
    }

    /// Fail bulk reads with a timeout after `n` successful ones.
    pub fn with_bulk_read_failure_after(self, n: usize) -> Self {
        self.state.borrow_mut().fail_bulk_read_after = Some(n);
        self
    }

    /// Make every subsequent transfer fail as if the cable was pulled.
    pub fn disconnect(&self) {
        self.state.borrow_mut().disconnected = true;
    }

    /// Put the ASIC in the scanning state without going through registers.
    pub fn force_scanning(&self) {
        self.state.borrow_mut().scanning = true;
    }

    pub fn is_scanning(&self) -> bool {
        self.state.borrow().scanning
    }

    pub fn register(&self, address: u16) -> Option<u8> {
        self.state.borrow().registers.get(&address).copied()
    }

    pub fn register_writes(&self) -> Vec<(u16, u8)> {
        self.state.borrow().register_writes.clone()
    }

    pub fn bulk_writes(&self) -> Vec<BulkWrite> {
        self.state.borrow().bulk_writes.clone()
    }

    /// Sizes of every bulk read request, in order.
    pub fn bulk_reads(&self) -> Vec<usize> {
        self.state.borrow().bulk_reads.clone()
    }

    fn check_link(&self) -> Result<(), HwError> {
        if self.state.borrow().disconnected {
            return Err(HwError::Disconnected);
        }
        Ok(())
    }
}

impl Transport for SimulatedScanner {
    fn read_register(
        &mut self,
        address: u16,
    ) -> Result<u8, Box<dyn std::error::Error + Send + Sync>> {
        self.check_link()?;
        let mut st = self.state.borrow_mut();
        let value = match address {
            REG_STATUS => st.status(),
            REG_STATUS2 => {
                if st.scanning {
                    0
                } else {
                    STATUS2_HOMESNR
                }
            }
            _ => st.registers.get(&address).copied().unwrap_or(0),
        };
        tracing::trace!(address, value, "sim register read");
        Ok(value)
    }

    fn write_register(
        &mut self,
        address: u16,
        value: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.check_link()?;
        let mut st = self.state.borrow_mut();
        st.registers.insert(address, value);
        st.register_writes.push((address, value));
        match address {
            REG_SCAN_CTRL => {
                if value & SCAN_BIT != 0 {
                    st.stop_requested = false;
                } else if st.scanning {
                    st.stop_requested = true;
                    st.polls_since_stop = 0;
                }
            }
            REG_MOTOR_START if value != 0 => {
                let scan_enabled = st
                    .registers
                    .get(&REG_SCAN_CTRL)
                    .is_some_and(|v| v & SCAN_BIT != 0);
                if scan_enabled {
                    st.scanning = true;
                    st.read_offset = 0;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn bulk_write(&mut self, data: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.check_link()?;
        let mut st = self.state.borrow_mut();
        let address = st.buffer_address();
        tracing::trace!(address, len = data.len(), "sim bulk write");
        st.bulk_writes.push(BulkWrite {
            address,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn bulk_read(
        &mut self,
        data: &mut [u8],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.check_link()?;
        let mut st = self.state.borrow_mut();
        if let Some(n) = st.fail_bulk_read_after
            && st.bulk_reads.len() >= n
        {
            return Err(Box::new(HwError::Timeout));
        }
        st.bulk_reads.push(data.len());
        let start = st.read_offset;
        match &st.image {
            ImageSource::Pattern => {
                for (i, b) in data.iter_mut().enumerate() {
                    *b = ((start + i) % 251) as u8;
                }
            }
            ImageSource::Bytes(bytes) => {
                let available = bytes.len().saturating_sub(start);
                if data.len() > available {
                    return Err(Box::new(HwError::ShortRead {
                        requested: data.len(),
                        available,
                    }));
                }
                data.copy_from_slice(&bytes[start..start + data.len()]);
            }
        }
        st.read_offset = start + data.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_stream_continues_across_reads() {
        let mut sim = SimulatedScanner::new();
        let mut a = [0u8; 4];
        let mut b = [0u8; 4];
        sim.bulk_read(&mut a).unwrap();
        sim.bulk_read(&mut b).unwrap();
        assert_eq!(a, [0, 1, 2, 3]);
        assert_eq!(b, [4, 5, 6, 7]);
        assert_eq!(sim.bulk_reads(), vec![4, 4]);
    }

    #[test]
    fn scan_starts_only_with_scan_bit_set() {
        let mut sim = SimulatedScanner::new();
        sim.write_register(REG_MOTOR_START, 1).unwrap();
        assert!(!sim.is_scanning());
        sim.write_register(REG_SCAN_CTRL, SCAN_BIT).unwrap();
        sim.write_register(REG_MOTOR_START, 1).unwrap();
        assert!(sim.is_scanning());
        assert_eq!(sim.read_register(REG_STATUS).unwrap(), 0x03);
    }

    #[test]
    fn bulk_write_records_buffer_address() {
        let mut sim = SimulatedScanner::new();
        sim.write_register(REG_ADDR_HIGH, 0x08).unwrap();
        sim.write_register(REG_ADDR_LOW, 0x00).unwrap();
        sim.bulk_write(&[1, 2, 3]).unwrap();
        let writes = sim.bulk_writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].address, 0x8000);
        assert_eq!(writes[0].data, vec![1, 2, 3]);
    }
}
