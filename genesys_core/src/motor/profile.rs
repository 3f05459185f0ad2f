//! Measured motion profiles and the rules for picking one.
//!
//! A profile pins a physical acceleration curve and step type to the line
//! exposure it was tuned for. The motor must never step faster than the
//! sensor can integrate, so a profile tuned for a shorter exposure than the
//! one requested is never used.

use serde::Serialize;

use crate::error::{GenesysError, Result};
use crate::motor::MotorId;
use crate::motor::slope::{MotorSlope, StepType};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotorProfile {
    pub motor_id: MotorId,
    /// Line exposure in pixel clocks; 0 marks the motor's catch-all entry.
    pub exposure: u32,
    pub step_type: StepType,
    pub slope: MotorSlope,
}

/// Choose the profile for `motor_id` at `exposure`.
///
/// Order of preference:
/// 1. the smallest exposure at or above the request (an exact match wins);
/// 2. the zero-exposure entry of the motor.
///
/// Ties go to the coarser step type.
pub fn select_motor_profile(
    profiles: &[MotorProfile],
    motor_id: MotorId,
    exposure: u32,
) -> Result<&MotorProfile> {
    let of_motor = || profiles.iter().filter(move |p| p.motor_id == motor_id);

    let above = of_motor()
        .filter(|p| p.exposure >= exposure && (p.exposure != 0 || exposure == 0))
        .min_by_key(|p| (p.exposure, p.step_type));
    if let Some(p) = above {
        tracing::debug!(%motor_id, exposure, picked = p.exposure, step_type = ?p.step_type, "motor profile");
        return Ok(p);
    }

    let fallback = of_motor()
        .filter(|p| p.exposure == 0)
        .min_by_key(|p| p.step_type);
    match fallback {
        Some(p) => {
            tracing::debug!(%motor_id, exposure, step_type = ?p.step_type, "motor profile fallback");
            Ok(p)
        }
        None => Err(GenesysError::MotorProfileNotFound { motor_id, exposure }),
    }
}

/// Profile used for fast moves and homing: the fastest curve the motor has.
pub fn select_fast_profile(profiles: &[MotorProfile], motor_id: MotorId) -> Option<&MotorProfile> {
    profiles
        .iter()
        .filter(|p| p.motor_id == motor_id)
        .min_by_key(|p| (p.slope.max_speed_w, p.step_type))
}
