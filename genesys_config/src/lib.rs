#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the scanner tools.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//! - Enumerations are kept local to this crate; `genesys_core::conversions`
//!   maps them onto the core types.
use serde::Deserialize;

const MM_PER_INCH: f32 = 25.4;

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct DeviceCfg {
    /// Model name as listed by `genesys list-models`.
    pub model: Option<String>,
    /// USB identity; used when `model` is absent.
    pub usb_vendor: Option<u16>,
    pub usb_product: Option<u16>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ScanMethodCfg {
    #[default]
    Flatbed,
    Transparency,
    TransparencyInfrared,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorModeCfg {
    Lineart,
    Gray,
    #[default]
    Color,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorFilterCfg {
    Red,
    Green,
    Blue,
    None,
}

/// Scan window in millimetres from the scan origin.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ScanArea {
    pub tl_x: f32,
    pub tl_y: f32,
    pub br_x: f32,
    pub br_y: f32,
}

impl Default for ScanArea {
    fn default() -> Self {
        // US letter
        Self {
            tl_x: 0.0,
            tl_y: 0.0,
            br_x: 215.9,
            br_y: 279.4,
        }
    }
}

fn mm_to_dots(mm: f32, dpi: u32) -> u32 {
    (mm / MM_PER_INCH * dpi as f32).round().max(0.0) as u32
}

impl ScanArea {
    pub fn width_mm(&self) -> f32 {
        self.br_x - self.tl_x
    }

    pub fn height_mm(&self) -> f32 {
        self.br_y - self.tl_y
    }

    /// `(startx, pixels)` at `xres`.
    pub fn to_pixels(&self, xres: u32) -> (u32, u32) {
        (mm_to_dots(self.tl_x, xres), mm_to_dots(self.width_mm(), xres))
    }

    /// `(starty, lines)` at `yres`.
    pub fn to_lines(&self, yres: u32) -> (u32, u32) {
        (mm_to_dots(self.tl_y, yres), mm_to_dots(self.height_mm(), yres))
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScanCfg {
    pub method: ScanMethodCfg,
    pub resolution: u32,
    /// Per-axis overrides of `resolution`.
    pub x_resolution: Option<u32>,
    pub y_resolution: Option<u32>,
    pub color_mode: ColorModeCfg,
    pub depth: u32,
    /// Channel used for gray and lineart scans.
    pub color_filter: Option<ColorFilterCfg>,
    pub area: ScanArea,
    pub disable_shading: bool,
    pub ignore_color_offset: bool,
    pub ignore_stagger_offset: bool,
}

impl Default for ScanCfg {
    fn default() -> Self {
        Self {
            method: ScanMethodCfg::Flatbed,
            resolution: 300,
            x_resolution: None,
            y_resolution: None,
            color_mode: ColorModeCfg::Color,
            depth: 8,
            color_filter: None,
            area: ScanArea::default(),
            disable_shading: false,
            ignore_color_offset: false,
            ignore_stagger_offset: false,
        }
    }
}

impl ScanCfg {
    pub fn xres(&self) -> u32 {
        self.x_resolution.unwrap_or(self.resolution)
    }

    pub fn yres(&self) -> u32 {
        self.y_resolution.unwrap_or(self.resolution)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IoCfg {
    /// Nominal bulk read size; defaults to a value derived from the line size.
    pub read_chunk_bytes: Option<usize>,
    pub stop_poll_ms: u64,
    pub stop_max_polls: u32,
}

impl Default for IoCfg {
    fn default() -> Self {
        Self {
            read_chunk_bytes: None,
            stop_poll_ms: 100,
            stop_max_polls: 300,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CalibrationCfg {
    /// Minutes a flatbed calibration stays valid; -1 keeps it forever.
    pub expiration_minutes: i64,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            expiration_minutes: 60,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub device: DeviceCfg,
    #[serde(default)]
    pub scan: ScanCfg,
    #[serde(default)]
    pub io: IoCfg,
    #[serde(default)]
    pub calibration: CalibrationCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Device
        match (&self.device.model, self.device.usb_vendor, self.device.usb_product) {
            (Some(name), _, _) if name.trim().is_empty() => {
                eyre::bail!("device.model must not be empty");
            }
            (Some(_), _, _) | (None, Some(_), Some(_)) => {}
            (None, _, _) => {
                eyre::bail!("device.model or both device.usb_vendor and device.usb_product required");
            }
        }

        // Scan
        let scan = &self.scan;
        if scan.xres() == 0 || scan.yres() == 0 {
            eyre::bail!("scan.resolution must be > 0");
        }
        if scan.xres() > 9600 || scan.yres() > 9600 {
            eyre::bail!("scan.resolution is unreasonably large (>9600 dpi)");
        }
        if !matches!(scan.depth, 1 | 8 | 16) {
            eyre::bail!("scan.depth must be 1, 8 or 16");
        }
        if scan.depth == 1 && scan.color_mode != ColorModeCfg::Lineart {
            eyre::bail!("scan.depth = 1 requires color_mode = \"lineart\"");
        }
        if scan.color_mode == ColorModeCfg::Lineart && scan.depth != 1 {
            eyre::bail!("color_mode = \"lineart\" requires scan.depth = 1");
        }
        let a = &scan.area;
        if !(a.tl_x.is_finite() && a.tl_y.is_finite() && a.br_x.is_finite() && a.br_y.is_finite())
        {
            eyre::bail!("scan.area coordinates must be finite");
        }
        if a.tl_x < 0.0 || a.tl_y < 0.0 {
            eyre::bail!("scan.area top-left must be >= 0");
        }
        if a.width_mm() <= 0.0 || a.height_mm() <= 0.0 {
            eyre::bail!("scan.area must have br_x > tl_x and br_y > tl_y");
        }

        // IO
        if let Some(chunk) = self.io.read_chunk_bytes
            && chunk == 0
        {
            eyre::bail!("io.read_chunk_bytes must be > 0");
        }
        if self.io.stop_poll_ms == 0 {
            eyre::bail!("io.stop_poll_ms must be >= 1");
        }
        if self.io.stop_max_polls == 0 {
            eyre::bail!("io.stop_max_polls must be >= 1");
        }

        // Calibration
        if self.calibration.expiration_minutes < -1 {
            eyre::bail!("calibration.expiration_minutes must be >= -1");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_converts_to_pixels() {
        let area = ScanArea {
            tl_x: 25.4,
            tl_y: 0.0,
            br_x: 50.8,
            br_y: 254.0,
        };
        assert_eq!(area.to_pixels(300), (300, 300));
        assert_eq!(area.to_lines(100), (0, 1000));
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = load_toml("[device]\nmodel = \"canon-lide-100\"\n").unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.scan.xres(), 300);
        assert_eq!(cfg.io.stop_max_polls, 300);
        assert_eq!(cfg.calibration.expiration_minutes, 60);
        assert_eq!(cfg.scan.method, ScanMethodCfg::Flatbed);
    }
}
