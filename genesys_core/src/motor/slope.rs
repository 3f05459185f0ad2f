//! Acceleration curves describing how fast a motor may step.
//!
//! Speeds are stored as "w": the time per step in ASIC ticks, i.e. the
//! inverse of speed. A smaller w is a faster motor.

use serde::Serialize;

use crate::error::{GenesysError, Result};

/// Micro-stepping mode. The discriminant is the right shift applied to a
/// full-step tick count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    Full = 0,
    Half = 1,
    Quarter = 2,
    Eighth = 3,
}

impl StepType {
    pub const ALL: [StepType; 4] = [
        StepType::Full,
        StepType::Half,
        StepType::Quarter,
        StepType::Eighth,
    ];

    #[inline]
    pub fn shift(self) -> u32 {
        self as u32
    }

    /// Index into a motor's slope list.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Microsteps per full step.
    #[inline]
    pub fn multiplier(self) -> u32 {
        1 << self.shift()
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// A curve that can be sampled into slope table entries.
pub trait SlopeCurve {
    /// Fastest w the motor reaches, in full-step ticks.
    fn max_speed_w(&self) -> u32;

    /// Tick count of table entry `step`, expressed for `step_type`.
    fn table_step_shifted(&self, step: u32, step_type: StepType) -> u32;
}

/// Uniform-acceleration model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotorSlope {
    pub initial_speed_w: u32,
    pub max_speed_w: u32,
    /// Steps per tick², in the `v = 1/w` domain.
    pub acceleration: f32,
}

impl MotorSlope {
    /// Build the curve that goes from `initial_w` to `max_w` in `steps` steps.
    ///
    /// `v_max² = v_initial² + 2·a·steps` gives
    /// `a = (v_max² - v_initial²) / (2·steps)` with `v = 1/w`.
    pub fn create_from_steps(initial_w: u32, max_w: u32, steps: u32) -> Self {
        let initial_v = 1.0f32 / initial_w as f32;
        let max_v = 1.0f32 / max_w as f32;
        Self {
            initial_speed_w: initial_w,
            max_speed_w: max_w,
            acceleration: (max_v * max_v - initial_v * initial_v) / (2 * steps) as f32,
        }
    }

    /// Sample the curve at `step`.
    ///
    /// The first two entries are pinned to the initial speed; the formula is
    /// evaluated at `step - 1` from there on.
    pub fn get_table_step_shifted(&self, step: u32, step_type: StepType) -> u32 {
        if step < 2 {
            return self.initial_speed_w >> step_type.shift();
        }
        let initial_v = 1.0f32 / self.initial_speed_w as f32;
        let v = (initial_v * initial_v + 2.0 * self.acceleration * (step - 1) as f32).sqrt();
        ((1.0f32 / v) as u32) >> step_type.shift()
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_speed_w == 0 || self.initial_speed_w < self.max_speed_w {
            return Err(GenesysError::InvalidSlopeRequest(format!(
                "initial w {} must be >= max w {} > 0",
                self.initial_speed_w, self.max_speed_w
            )));
        }
        if !(self.acceleration.is_finite() && self.acceleration >= 0.0) {
            return Err(GenesysError::InvalidSlopeRequest(format!(
                "acceleration {} must be finite and non-negative",
                self.acceleration
            )));
        }
        Ok(())
    }
}

impl SlopeCurve for MotorSlope {
    fn max_speed_w(&self) -> u32 {
        self.max_speed_w
    }

    fn table_step_shifted(&self, step: u32, step_type: StepType) -> u32 {
        self.get_table_step_shifted(step, step_type)
    }
}

/// Power-law model used by the older ASIC generations:
/// `w(q) = start·(1 - q^g) + max·q^g` with `q = step / minimum_steps`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotorSlopeLegacy {
    pub maximum_start_speed: u32,
    pub maximum_speed: u32,
    pub minimum_steps: u32,
    pub g: f32,
}

impl MotorSlopeLegacy {
    pub fn get_table_step_shifted(&self, step: u32, step_type: StepType) -> u32 {
        let q = if self.minimum_steps == 0 {
            1.0
        } else {
            (step as f32 / self.minimum_steps as f32).min(1.0)
        };
        let t = q.powf(self.g);
        let w = self.maximum_start_speed as f32 * (1.0 - t) + self.maximum_speed as f32 * t;
        (w as u32) >> step_type.shift()
    }
}

impl SlopeCurve for MotorSlopeLegacy {
    fn max_speed_w(&self) -> u32 {
        self.maximum_speed
    }

    fn table_step_shifted(&self, step: u32, step_type: StepType) -> u32 {
        self.get_table_step_shifted(step, step_type)
    }
}

/// A motor slope in exactly one of the two representations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GenesysMotorSlope {
    Legacy(MotorSlopeLegacy),
    Physical(MotorSlope),
}

impl GenesysMotorSlope {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Legacy(_) => "legacy",
            Self::Physical(_) => "physical",
        }
    }

    pub fn legacy(&self) -> Result<&MotorSlopeLegacy> {
        match self {
            Self::Legacy(s) => Ok(s),
            Self::Physical(_) => Err(GenesysError::WrongSlopeVariant {
                requested: "legacy",
                actual: self.kind(),
            }),
        }
    }

    pub fn physical(&self) -> Result<&MotorSlope> {
        match self {
            Self::Physical(s) => Ok(s),
            Self::Legacy(_) => Err(GenesysError::WrongSlopeVariant {
                requested: "physical",
                actual: self.kind(),
            }),
        }
    }
}

impl SlopeCurve for GenesysMotorSlope {
    fn max_speed_w(&self) -> u32 {
        match self {
            Self::Legacy(s) => s.max_speed_w(),
            Self::Physical(s) => s.max_speed_w(),
        }
    }

    fn table_step_shifted(&self, step: u32, step_type: StepType) -> u32 {
        match self {
            Self::Legacy(s) => s.table_step_shifted(step, step_type),
            Self::Physical(s) => s.table_step_shifted(step, step_type),
        }
    }
}
