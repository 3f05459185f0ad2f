//! Decoded ASIC status registers.

use bitflags::bitflags;

use crate::registers::{REG_0X40_DATAENB, REG_0X40_MOTMFLG, REG_0X41_HOMESNR};

bitflags! {
    /// Bits of REG_0X40 (low byte) and REG_0X41 (high byte).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ScannerStatus: u16 {
        const DATA_ENABLED = REG_0X40_DATAENB as u16;
        const MOTOR_MOVING = REG_0X40_MOTMFLG as u16;
        const AT_HOME = (REG_0X41_HOMESNR as u16) << 8;
    }
}

impl ScannerStatus {
    pub fn from_registers(reg40: u8, reg41: u8) -> Self {
        Self::from_bits_truncate(u16::from(reg40) | (u16::from(reg41) << 8))
    }

    /// Scan data still flowing or the head still moving.
    pub fn is_busy(self) -> bool {
        self.intersects(Self::DATA_ENABLED | Self::MOTOR_MOVING)
    }
}
