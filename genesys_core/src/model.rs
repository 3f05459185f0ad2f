//! Scanner models: which ASIC, sensor and motor a product is built from and
//! what it can scan.

use bitflags::bitflags;
use serde::Serialize;

use crate::error::{GenesysError, Result};
use crate::motor::MotorId;
use crate::sensor::{ScanMethod, SensorId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AsicType {
    Gl646,
    Gl841,
    Gl842,
    Gl843,
    Gl845,
    Gl846,
    Gl847,
    Gl124,
}

impl AsicType {
    /// Chips that read multi-segment CIS sensors.
    pub fn is_segmented(self) -> bool {
        matches!(self, AsicType::Gl845 | AsicType::Gl846 | AsicType::Gl847)
    }

    /// Optical pixel counts must be a multiple of this.
    pub fn optical_pixel_alignment(self, optical_res: u32) -> u32 {
        match self {
            AsicType::Gl841 | AsicType::Gl842 => 2,
            AsicType::Gl843 => 4,
            AsicType::Gl646 if optical_res == 400 => 6,
            _ => 1,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModelFlag: u32 {
        const CUSTOM_GAMMA = 1 << 0;
        const DARK_CALIBRATION = 1 << 1;
        const INVERT_PIXEL_ORDER = 1 << 2;
        const SHADING_REPARK = 1 << 3;
        const SIS_SENSOR = 1 << 4;
        const WARMUP = 1 << 5;
        const UTA_NO_SECONDARY_MOTOR = 1 << 6;
    }
}

impl Serialize for ModelFlag {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_seq(self.iter_names().map(|(name, _)| name))
    }
}

/// Order in which color planes arrive in line mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorOrder {
    Rgb,
    Bgr,
}

/// Resolutions available for a group of scan methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodResolutions {
    pub methods: Vec<ScanMethod>,
    pub resolutions_x: Vec<u32>,
    pub resolutions_y: Vec<u32>,
}

impl MethodResolutions {
    pub fn matches(&self, method: ScanMethod) -> bool {
        self.methods.contains(&method)
    }

    /// Union of x and y resolutions, highest first.
    pub fn get_resolutions(&self) -> Vec<u32> {
        let mut all: Vec<u32> = self
            .resolutions_x
            .iter()
            .chain(&self.resolutions_y)
            .copied()
            .collect();
        all.sort_unstable_by(|a, b| b.cmp(a));
        all.dedup();
        all
    }

    pub fn get_min_resolution_x(&self) -> Option<u32> {
        self.resolutions_x.iter().copied().min()
    }

    pub fn get_min_resolution_y(&self) -> Option<u32> {
        self.resolutions_y.iter().copied().min()
    }

    pub fn get_max_resolution_x(&self) -> Option<u32> {
        self.resolutions_x.iter().copied().max()
    }

    pub fn get_max_resolution_y(&self) -> Option<u32> {
        self.resolutions_y.iter().copied().max()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Model {
    pub name: &'static str,
    pub vendor: &'static str,
    pub model: &'static str,
    pub asic_type: AsicType,
    pub resolutions: Vec<MethodResolutions>,
    pub bpp_gray_values: Vec<u32>,
    pub bpp_color_values: Vec<u32>,
    /// Scan area origin and size in millimetres.
    pub x_offset: f32,
    pub y_offset: f32,
    pub x_size: f32,
    pub y_size: f32,
    /// Line distance of each color row from the first, at `motor.base_ydpi`.
    pub ld_shift_r: u32,
    pub ld_shift_g: u32,
    pub ld_shift_b: u32,
    pub line_mode_color_order: ColorOrder,
    pub is_cis: bool,
    pub is_sheetfed: bool,
    pub sensor_id: SensorId,
    pub motor_id: MotorId,
    pub flags: ModelFlag,
}

impl Model {
    /// Resolution group serving `method`; the first match wins.
    pub fn get_resolution_settings(&self, method: ScanMethod) -> Result<&MethodResolutions> {
        self.resolutions
            .iter()
            .find(|r| r.matches(method))
            .ok_or(GenesysError::UnsupportedMethod(method))
    }

    pub fn has_method(&self, method: ScanMethod) -> bool {
        self.resolutions.iter().any(|r| r.matches(method))
    }

    pub fn get_resolutions(&self, method: ScanMethod) -> Result<Vec<u32>> {
        Ok(self.get_resolution_settings(method)?.get_resolutions())
    }

    pub fn methods(&self) -> Vec<ScanMethod> {
        let mut out: Vec<ScanMethod> = Vec::new();
        for m in self.resolutions.iter().flat_map(|r| r.methods.iter()) {
            if !out.contains(m) {
                out.push(*m);
            }
        }
        out
    }

    /// Largest color line distance.
    pub fn max_ld_shift(&self) -> u32 {
        self.ld_shift_r.max(self.ld_shift_g).max(self.ld_shift_b)
    }
}

/// USB identity of a supported product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsbDeviceEntry {
    pub vendor_id: u16,
    pub product_id: u16,
    pub model: &'static str,
}
