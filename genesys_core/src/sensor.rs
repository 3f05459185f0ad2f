//! Image sensor profiles.
//!
//! One physical sensor usually has several profiles, each valid for a set of
//! output resolutions, channel counts and one scan method. Lookup lives on
//! [`crate::registry::Registry`].

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{GenesysError, Result};
use crate::registers::RegisterSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SensorId {
    #[serde(rename = "cis-canon-lide-100")]
    CisCanonLide100,
    #[serde(rename = "cis-canon-lide-110")]
    CisCanonLide110,
    #[serde(rename = "cis-canon-lide-200")]
    CisCanonLide200,
    #[serde(rename = "cis-canon-lide-700")]
    CisCanonLide700,
    #[serde(rename = "ccd-hp-2300")]
    CcdHp2300,
    #[serde(rename = "ccd-canon-4400f")]
    CcdCanon4400f,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanMethod {
    Flatbed,
    Transparency,
    TransparencyInfrared,
}

impl ScanMethod {
    pub fn name(self) -> &'static str {
        match self {
            ScanMethod::Flatbed => "flatbed",
            ScanMethod::Transparency => "transparency",
            ScanMethod::TransparencyInfrared => "transparency-infrared",
        }
    }

    pub fn is_transparency(self) -> bool {
        !matches!(self, ScanMethod::Flatbed)
    }
}

impl fmt::Display for ScanMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScanMethod {
    type Err = GenesysError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "flatbed" => Ok(ScanMethod::Flatbed),
            "transparency" | "tpu" => Ok(ScanMethod::Transparency),
            "transparency-infrared" | "infrared" => Ok(ScanMethod::TransparencyInfrared),
            _ => Err(GenesysError::Config(format!("unknown scan method '{s}'"))),
        }
    }
}

/// Set of resolutions a profile applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionFilter {
    Any,
    Values(Vec<u32>),
}

impl ResolutionFilter {
    pub fn matches(&self, dpi: u32) -> bool {
        match self {
            ResolutionFilter::Any => true,
            ResolutionFilter::Values(v) => v.contains(&dpi),
        }
    }

    pub fn values(&self) -> &[u32] {
        match self {
            ResolutionFilter::Any => &[],
            ResolutionFilter::Values(v) => v,
        }
    }
}

/// Per-column line offsets of a staggered sensor. Column `x` sits
/// `shifts[x % shifts.len()]` lines behind the first row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StaggerConfig {
    pub shifts: Vec<u32>,
}

impl StaggerConfig {
    pub fn new(shifts: Vec<u32>) -> Self {
        Self { shifts }
    }

    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }

    pub fn max_shift(&self) -> u32 {
        self.shifts.iter().copied().max().unwrap_or(0)
    }

    pub fn shift_for_column(&self, x: usize) -> u32 {
        if self.shifts.is_empty() {
            0
        } else {
            self.shifts[x % self.shifts.len()]
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ratio {
    pub multiplier: u32,
    pub divisor: u32,
}

impl Ratio {
    pub const ONE: Ratio = Ratio {
        multiplier: 1,
        divisor: 1,
    };

    pub const fn new(multiplier: u32, divisor: u32) -> Self {
        Self {
            multiplier,
            divisor,
        }
    }

    /// `None` when the scaled value does not fit a `u32`.
    pub fn apply(self, value: u32) -> Option<u32> {
        let d = u64::from(self.divisor.max(1));
        u32::try_from(u64::from(value) * u64::from(self.multiplier) / d).ok()
    }
}

impl Default for Ratio {
    fn default() -> Self {
        Self::ONE
    }
}

/// LED or lamp exposure per channel, in pixel clocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SensorExposure {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl SensorExposure {
    pub const fn new(red: u16, green: u16, blue: u16) -> Self {
        Self { red, green, blue }
    }

    pub fn is_zero(&self) -> bool {
        self.red == 0 && self.green == 0 && self.blue == 0
    }

    pub fn max(&self) -> u16 {
        self.red.max(self.green).max(self.blue)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sensor {
    pub sensor_id: SensorId,
    /// Native resolution of the photo sites.
    pub full_resolution: u32,
    /// Output resolutions this profile is used for.
    pub resolutions: ResolutionFilter,
    pub channels: Vec<u32>,
    pub method: ScanMethod,
    /// Resolution the ASIC clocks the sensor at.
    pub register_dpihw: u32,
    /// Value written to DPISET; 0 means "use the output resolution".
    pub register_dpiset: u32,
    pub shading_resolution: u32,
    pub pixel_count_ratio: Ratio,
    pub output_pixel_offset: u32,
    pub black_pixels: u32,
    pub dummy_pixel: u32,
    pub fau_gain_white_ref: u32,
    pub gain_white_ref: u32,
    pub exposure: SensorExposure,
    /// Fixed line period; 0 lets the session compute it.
    pub exposure_lperiod: u32,
    /// Pixels per segment for multi-segment sensors.
    pub segment_size: u32,
    pub segment_order: Vec<u32>,
    pub stagger_x: StaggerConfig,
    pub stagger_y: StaggerConfig,
    pub custom_regs: RegisterSettings,
    pub gamma: [f32; 3],
}

impl Sensor {
    /// Number of readout segments; 1 for a plain sensor.
    pub fn segment_count(&self) -> u32 {
        if self.segment_order.len() < 2 {
            1
        } else {
            self.segment_order.len() as u32
        }
    }

    pub fn matches_channel_count(&self, channels: u32) -> bool {
        self.channels.contains(&channels)
    }

    pub fn matches(&self, sensor_id: SensorId, dpi: u32, channels: u32, method: ScanMethod) -> bool {
        self.sensor_id == sensor_id
            && self.resolutions.matches(dpi)
            && self.matches_channel_count(channels)
            && self.method == method
    }

    /// Copy of this profile with exposure replaced by a calibrated value.
    /// The table entry it came from is not modified.
    pub fn with_calibrated_exposure(&self, exposure: SensorExposure) -> Sensor {
        Sensor {
            exposure,
            ..self.clone()
        }
    }

    /// How many sensor photo sites are binned into one hardware pixel.
    pub fn ccd_size_divisor(&self) -> u32 {
        if self.register_dpihw == 0 || self.register_dpihw >= self.full_resolution {
            1
        } else {
            self.full_resolution / self.register_dpihw
        }
    }
}

impl Default for Sensor {
    fn default() -> Self {
        Self {
            sensor_id: SensorId::CisCanonLide100,
            full_resolution: 0,
            resolutions: ResolutionFilter::Any,
            channels: vec![1, 3],
            method: ScanMethod::Flatbed,
            register_dpihw: 0,
            register_dpiset: 0,
            shading_resolution: 0,
            pixel_count_ratio: Ratio::ONE,
            output_pixel_offset: 0,
            black_pixels: 0,
            dummy_pixel: 0,
            fau_gain_white_ref: 0,
            gain_white_ref: 0,
            exposure: SensorExposure::default(),
            exposure_lperiod: 0,
            segment_size: 0,
            segment_order: Vec::new(),
            stagger_x: StaggerConfig::default(),
            stagger_y: StaggerConfig::default(),
            custom_regs: Vec::new(),
            gamma: [1.0, 1.0, 1.0],
        }
    }
}
