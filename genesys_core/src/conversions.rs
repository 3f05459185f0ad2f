//! `From` implementations bridging `genesys_config` types to `genesys_core` types.

use std::time::Duration;

use crate::calibration_cache::CalibrationCache;
use crate::device::DeviceOptions;
use crate::error::{GenesysError, Result};
use crate::model::Model;
use crate::registry::Registry;
use crate::sensor::ScanMethod;
use crate::session::{ColorFilter, ScanColorMode, ScanFlag, SetupParams};

// ── Enumerations ─────────────────────────────────────────────────────────────

impl From<genesys_config::ScanMethodCfg> for ScanMethod {
    fn from(c: genesys_config::ScanMethodCfg) -> Self {
        match c {
            genesys_config::ScanMethodCfg::Flatbed => ScanMethod::Flatbed,
            genesys_config::ScanMethodCfg::Transparency => ScanMethod::Transparency,
            genesys_config::ScanMethodCfg::TransparencyInfrared => {
                ScanMethod::TransparencyInfrared
            }
        }
    }
}

impl From<genesys_config::ColorModeCfg> for ScanColorMode {
    fn from(c: genesys_config::ColorModeCfg) -> Self {
        match c {
            genesys_config::ColorModeCfg::Lineart => ScanColorMode::Lineart,
            genesys_config::ColorModeCfg::Gray => ScanColorMode::Gray,
            genesys_config::ColorModeCfg::Color => ScanColorMode::Color,
        }
    }
}

impl From<genesys_config::ColorFilterCfg> for ColorFilter {
    fn from(c: genesys_config::ColorFilterCfg) -> Self {
        match c {
            genesys_config::ColorFilterCfg::Red => ColorFilter::Red,
            genesys_config::ColorFilterCfg::Green => ColorFilter::Green,
            genesys_config::ColorFilterCfg::Blue => ColorFilter::Blue,
            genesys_config::ColorFilterCfg::None => ColorFilter::None,
        }
    }
}

// ── Scan request ─────────────────────────────────────────────────────────────

impl From<&genesys_config::ScanCfg> for SetupParams {
    fn from(c: &genesys_config::ScanCfg) -> Self {
        let mode = ScanColorMode::from(c.color_mode);
        let method = ScanMethod::from(c.method);
        let (startx, pixels) = c.area.to_pixels(c.xres());
        let (starty, lines) = c.area.to_lines(c.yres());

        let mut flags = ScanFlag::empty();
        if method.is_transparency() {
            flags |= ScanFlag::USE_XPA;
        }
        if c.disable_shading {
            flags |= ScanFlag::DISABLE_SHADING;
        }
        if c.ignore_color_offset {
            flags |= ScanFlag::IGNORE_COLOR_OFFSET;
        }
        if c.ignore_stagger_offset {
            flags |= ScanFlag::IGNORE_STAGGER_OFFSET;
        }

        let color_filter = match (mode.channels(), c.color_filter) {
            (1, Some(f)) => f.into(),
            (1, None) => ColorFilter::Green,
            _ => ColorFilter::None,
        };

        Self {
            xres: c.xres(),
            yres: c.yres(),
            startx,
            starty,
            pixels,
            lines,
            depth: mode.effective_depth(c.depth),
            channels: mode.channels(),
            scan_method: method,
            color_filter,
            flags,
        }
    }
}

// ── Device ───────────────────────────────────────────────────────────────────

impl From<&genesys_config::IoCfg> for DeviceOptions {
    fn from(c: &genesys_config::IoCfg) -> Self {
        Self {
            stop_poll_interval: Duration::from_millis(c.stop_poll_ms),
            stop_max_polls: c.stop_max_polls,
            read_chunk_bytes: c.read_chunk_bytes,
        }
    }
}

impl From<&genesys_config::CalibrationCfg> for CalibrationCache {
    fn from(c: &genesys_config::CalibrationCfg) -> Self {
        let expiration = u64::try_from(c.expiration_minutes)
            .ok()
            .map(|m| Duration::from_secs(m.saturating_mul(60)));
        CalibrationCache::new(expiration)
    }
}

/// Model selected by the `[device]` section.
pub fn resolve_model<'a>(
    registry: &'a Registry,
    device: &genesys_config::DeviceCfg,
) -> Result<&'a Model> {
    match (&device.model, device.usb_vendor, device.usb_product) {
        (Some(name), _, _) => registry.model_by_name(name),
        (None, Some(vendor), Some(product)) => registry.model_for_usb(vendor, product),
        _ => Err(GenesysError::Config(
            "device section names no model".to_string(),
        )),
    }
}
