//! ASIC register file image.
//!
//! Registers are 8 bits wide; multi-byte fields are stored big-endian over
//! consecutive addresses, high byte first.

use serde::Serialize;

use crate::error::{GenesysError, Result};

pub const REG_0X01: u16 = 0x01;
pub const REG_0X01_SCAN: u8 = 0x01;
pub const REG_0X01_SHDAREA: u8 = 0x02;
pub const REG_0X01_DVDSET: u8 = 0x20;

pub const REG_0X02: u16 = 0x02;
pub const REG_0X02_MTRREV: u8 = 0x04;
pub const REG_0X02_FASTFED: u8 = 0x08;
pub const REG_0X02_MTRPWR: u8 = 0x10;
pub const REG_0X02_NOTHOME: u8 = 0x80;

pub const REG_0X04: u16 = 0x04;
pub const REG_0X04_BITSET: u8 = 0x40;
pub const REG_0X04_FILTER: u8 = 0x0c;

pub const REG_0X05: u16 = 0x05;
pub const REG_0X05_DPIHW: u8 = 0xc0;
pub const REG_0X05_DPIHW_600: u8 = 0x00;
pub const REG_0X05_DPIHW_1200: u8 = 0x40;
pub const REG_0X05_DPIHW_2400: u8 = 0x80;
pub const REG_0X05_DPIHW_4800: u8 = 0xc0;

pub const REG_0X0F: u16 = 0x0f;

pub const REG_STEPNO: u16 = 0x21;
pub const REG_FWDSTEP: u16 = 0x22;
pub const REG_BWDSTEP: u16 = 0x23;
pub const REG_FASTNO: u16 = 0x24;
pub const REG_LINCNT: u16 = 0x25;

/// Buffer address for bulk writes, `address >> 4`, high then low.
pub const REG_0X2A: u16 = 0x2a;
pub const REG_0X2B: u16 = 0x2b;

pub const REG_DPISET: u16 = 0x2c;
pub const REG_STRPIXEL: u16 = 0x30;
pub const REG_ENDPIXEL: u16 = 0x32;
pub const REG_MAXWD: u16 = 0x35;
pub const REG_LPERIOD: u16 = 0x38;
pub const REG_FEEDL: u16 = 0x3d;

pub const REG_0X40: u16 = 0x40;
pub const REG_0X40_DATAENB: u8 = 0x01;
pub const REG_0X40_MOTMFLG: u8 = 0x02;

pub const REG_0X41: u16 = 0x41;
pub const REG_0X41_HOMESNR: u8 = 0x08;

pub const REG_0X67: u16 = 0x67;
pub const REG_0X68: u16 = 0x68;
/// Step type field in 0x67/0x68.
pub const REG_STEPSEL_SHIFT: u32 = 6;
pub const REG_STEPSEL_MASK: u8 = 0xc0;

pub const REG_FSHDEC: u16 = 0x69;
pub const REG_FMOVDEC: u16 = 0x6a;
pub const REG_FMOVNO: u16 = 0x6b;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenesysRegister {
    pub address: u16,
    pub value: u8,
}

/// One masked register override: bits outside `mask` are left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegisterSetting {
    pub address: u16,
    pub value: u8,
    pub mask: u8,
}

impl RegisterSetting {
    pub const fn new(address: u16, value: u8) -> Self {
        Self {
            address,
            value,
            mask: 0xff,
        }
    }

    pub const fn masked(address: u16, value: u8, mask: u8) -> Self {
        Self {
            address,
            value,
            mask,
        }
    }
}

pub type RegisterSettings = Vec<RegisterSetting>;

/// Registers sorted by address, each address at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegisterSet {
    regs: Vec<GenesysRegister>,
}

impl RegisterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.regs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regs.is_empty()
    }

    pub fn has_reg(&self, address: u16) -> bool {
        self.index_of(address).is_ok()
    }

    pub fn find(&self, address: u16) -> Option<&GenesysRegister> {
        self.index_of(address).ok().map(|i| &self.regs[i])
    }

    /// Registers in ascending address order.
    pub fn iter(&self) -> impl Iterator<Item = &GenesysRegister> {
        self.regs.iter()
    }

    /// Insert or overwrite.
    pub fn set8(&mut self, address: u16, value: u8) {
        match self.index_of(address) {
            Ok(i) => self.regs[i].value = value,
            Err(i) => self.regs.insert(i, GenesysRegister { address, value }),
        }
    }

    pub fn get8(&self, address: u16) -> Result<u8> {
        self.find(address)
            .map(|r| r.value)
            .ok_or(GenesysError::UnknownRegister(address))
    }

    /// Replace the bits under `mask`; a missing register starts out as 0.
    pub fn set8_mask(&mut self, address: u16, value: u8, mask: u8) {
        let old = self.find(address).map_or(0, |r| r.value);
        self.set8(address, (old & !mask) | (value & mask));
    }

    pub fn set16(&mut self, address: u16, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.set8(address, hi);
        self.set8(address + 1, lo);
    }

    /// `value` over three registers; values wider than 24 bits are rejected.
    pub fn set24(&mut self, address: u16, value: u32) -> Result<()> {
        let [top, hi, mid, lo] = value.to_be_bytes();
        if top != 0 {
            return Err(GenesysError::Config(format!(
                "value {value} for register {address:#04x} does not fit 24 bits"
            )));
        }
        self.set8(address, hi);
        self.set8(address + 1, mid);
        self.set8(address + 2, lo);
        Ok(())
    }

    pub fn get16(&self, address: u16) -> Result<u16> {
        Ok(u16::from_be_bytes([self.get8(address)?, self.get8(address + 1)?]))
    }

    pub fn get24(&self, address: u16) -> Result<u32> {
        Ok(u32::from_be_bytes([
            0,
            self.get8(address)?,
            self.get8(address + 1)?,
            self.get8(address + 2)?,
        ]))
    }

    /// Apply per-sensor overrides on top of the computed values.
    pub fn merge(&mut self, settings: &[RegisterSetting]) {
        for s in settings {
            self.set8_mask(s.address, s.value, s.mask);
        }
    }

    fn index_of(&self, address: u16) -> std::result::Result<usize, usize> {
        self.regs.binary_search_by_key(&address, |r| r.address)
    }
}
