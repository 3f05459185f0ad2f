//! Slope table generation: the literal per-step tick sequence uploaded to the
//! motor controller.

use heapless::Vec as FixedVec;
use serde::Serialize;

use crate::error::{GenesysError, Result};
use crate::motor::slope::{SlopeCurve, StepType};

/// Entries in one hardware slope table slot.
pub const MAX_SLOPE_TABLE_SIZE: usize = 1024;

/// A compiled slope table.
///
/// `table` always holds [`MAX_SLOPE_TABLE_SIZE`] entries. The first
/// `scan_steps` entries are the acceleration ramp (plus alignment padding);
/// the rest repeat the cruise speed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MotorSlopeTable {
    pub table: FixedVec<u16, MAX_SLOPE_TABLE_SIZE>,
    pub scan_steps: usize,
    pub pixeltime_sum: u64,
}

impl MotorSlopeTable {
    /// Cruise speed the ramp ends on.
    pub fn final_speed(&self) -> u16 {
        self.table[self.scan_steps - 1]
    }

    /// Number of table entries per full step for a step type.
    pub fn steps_for(&self, step_type: StepType) -> usize {
        self.scan_steps / step_type.multiplier() as usize
    }

    /// Little-endian byte image as sent to the ASIC.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.table.iter().flat_map(|w| w.to_le_bytes()).collect()
    }
}

fn to_tick(value: u32) -> Result<u16> {
    u16::try_from(value).map_err(|_| {
        GenesysError::InvalidSlopeRequest(format!("tick count {value} does not fit 16 bits"))
    })
}

fn push(table: &mut FixedVec<u16, MAX_SLOPE_TABLE_SIZE>, value: u16) -> Result<()> {
    table.push(value).map_err(|_| {
        GenesysError::InvalidSlopeRequest(format!(
            "slope table exceeds {MAX_SLOPE_TABLE_SIZE} entries"
        ))
    })
}

/// Build the table that accelerates along `curve` up to `target_speed_w`.
///
/// A target faster than the motor can go is clamped to the motor's maximum
/// with a warning. The ramp is padded with its final speed until its length
/// is a multiple of `steps_alignment` and at least `min_size`.
pub fn create_slope_table<C: SlopeCurve + ?Sized>(
    curve: &C,
    target_speed_w: u32,
    step_type: StepType,
    steps_alignment: usize,
    min_size: usize,
) -> Result<MotorSlopeTable> {
    if steps_alignment == 0 {
        return Err(GenesysError::InvalidSlopeRequest(
            "steps alignment must be > 0".to_string(),
        ));
    }
    if min_size > MAX_SLOPE_TABLE_SIZE {
        return Err(GenesysError::InvalidSlopeRequest(format!(
            "minimum size {min_size} exceeds {MAX_SLOPE_TABLE_SIZE}"
        )));
    }

    let target_shifted = target_speed_w >> step_type.shift();
    let max_shifted = curve.max_speed_w() >> step_type.shift();
    if target_shifted < max_shifted {
        tracing::warn!(
            target_speed_w,
            max_speed_w = curve.max_speed_w(),
            "failed to reach target speed"
        );
    }
    let final_speed = to_tick(target_shifted.max(max_shifted))?;

    let mut table = FixedVec::<u16, MAX_SLOPE_TABLE_SIZE>::new();
    let mut step = 0u32;
    // Leave room for the terminal entry.
    while table.len() < MAX_SLOPE_TABLE_SIZE - 1 {
        let current = curve.table_step_shifted(step, step_type);
        if current <= u32::from(final_speed) {
            break;
        }
        push(&mut table, to_tick(current)?)?;
        step += 1;
    }
    push(&mut table, final_speed)?;

    while table.len() % steps_alignment != 0 || table.len() < min_size {
        let last = table[table.len() - 1];
        push(&mut table, last)?;
    }

    let scan_steps = table.len();
    let pixeltime_sum = table.iter().map(|&w| u64::from(w)).sum();
    while table.len() < MAX_SLOPE_TABLE_SIZE {
        push(&mut table, final_speed)?;
    }

    tracing::debug!(
        scan_steps,
        final_speed,
        ?step_type,
        "slope table generated"
    );
    Ok(MotorSlopeTable {
        table,
        scan_steps,
        pixeltime_sum,
    })
}

/// Table that runs the curve all the way to the motor's maximum speed; used
/// for fast moves and homing.
pub fn create_slope_table_fastest<C: SlopeCurve + ?Sized>(
    curve: &C,
    step_type: StepType,
    steps_alignment: usize,
    min_size: usize,
) -> Result<MotorSlopeTable> {
    create_slope_table(
        curve,
        curve.max_speed_w(),
        step_type,
        steps_alignment,
        min_size,
    )
}
