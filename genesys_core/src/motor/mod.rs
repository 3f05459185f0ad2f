//! Motor description: identity, vertical resolution and acceleration curves.
//!
//! - `slope`: the two curve models and the step type
//! - `table`: turns a curve into a 1024-entry hardware slope table
//! - `profile`: picks a measured motion profile for a given exposure

pub mod profile;
pub mod slope;
pub mod table;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{GenesysError, Result};

pub use profile::{MotorProfile, select_fast_profile, select_motor_profile};
pub use slope::{GenesysMotorSlope, MotorSlope, MotorSlopeLegacy, SlopeCurve, StepType};
pub use table::{
    MAX_SLOPE_TABLE_SIZE, MotorSlopeTable, create_slope_table, create_slope_table_fastest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorId {
    CanonLide100,
    CanonLide110,
    CanonLide200,
    CanonLide700,
    Hp2300,
    Canon4400f,
}

impl MotorId {
    pub const ALL: [MotorId; 6] = [
        MotorId::CanonLide100,
        MotorId::CanonLide110,
        MotorId::CanonLide200,
        MotorId::CanonLide700,
        MotorId::Hp2300,
        MotorId::Canon4400f,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MotorId::CanonLide100 => "canon-lide-100",
            MotorId::CanonLide110 => "canon-lide-110",
            MotorId::CanonLide200 => "canon-lide-200",
            MotorId::CanonLide700 => "canon-lide-700",
            MotorId::Hp2300 => "hp2300",
            MotorId::Canon4400f => "canon-4400f",
        }
    }
}

impl fmt::Display for MotorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for MotorId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.name())
    }
}

impl FromStr for MotorId {
    type Err = GenesysError;

    fn from_str(s: &str) -> Result<Self> {
        MotorId::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| GenesysError::Config(format!("unknown motor '{s}'")))
    }
}

/// A stepper motor as wired in a particular scanner model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Motor {
    pub id: MotorId,
    /// Resolution of one full step.
    pub base_ydpi: u32,
    pub optical_ydpi: u32,
    /// Curves indexed by step type; never empty.
    pub slopes: Vec<GenesysMotorSlope>,
}

impl Motor {
    /// Curve used for `step_type`.
    pub fn get_slope(&self, step_type: StepType) -> Result<&GenesysMotorSlope> {
        self.slopes.get(step_type.index()).ok_or_else(|| {
            GenesysError::InvalidSlopeRequest(format!(
                "motor {} has no {:?} step slope ({} defined)",
                self.id,
                step_type,
                self.slopes.len()
            ))
        })
    }

    /// Finest step type this motor has a curve for.
    pub fn max_step_type(&self) -> StepType {
        StepType::from_index(self.slopes.len().saturating_sub(1)).unwrap_or(StepType::Eighth)
    }
}
