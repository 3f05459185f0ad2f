//! Scan against the simulated scanner.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use eyre::WrapErr;
use genesys_config::Config;
use genesys_core::conversions::resolve_model;
use genesys_core::{CalibrationCache, DeviceOptions, Registry, ScannerDevice, SetupParams};
use genesys_hardware::SimulatedScanner;

use crate::error_fmt::ScanCancelled;
use crate::pnm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub pixels: u32,
    pub lines: u32,
    pub bytes_read: u64,
}

/// Scan the configured request and write the delivered lines to `output`.
///
/// Lines the device sends ahead of the image (color shift and stagger lead)
/// are read and dropped. `cancel` is checked between lines; the file is only
/// created once the whole image has been read.
pub fn run_scan(cfg: &Config, output: &Path, cancel: &Arc<AtomicBool>) -> eyre::Result<ScanSummary> {
    let registry = Registry::builtin();
    let model = resolve_model(&registry, &cfg.device)?.name;
    let params = SetupParams::from(&cfg.scan);

    let mut dev = ScannerDevice::open(SimulatedScanner::new(), registry, model)?
        .with_options(DeviceOptions::from(&cfg.io))
        .with_calibration_cache(CalibrationCache::from(&cfg.calibration));
    let session = dev.setup_scan(&params)?.clone();

    let raw_line = session.output_line_bytes_raw as usize;
    let line = session.bytes_per_line() as usize;
    let skip = session.output_line_count.saturating_sub(params.lines) as usize;

    dev.begin_scan()?;
    let mut image = Vec::with_capacity(line * params.lines as usize);
    let mut buf = vec![0u8; raw_line];
    for i in 0..session.output_line_count as usize {
        if cancel.load(Ordering::Relaxed) {
            tracing::warn!(line = i, "scan interrupted; stopping motor");
            dev.stop_action()?;
            return Err(ScanCancelled.into());
        }
        dev.read_data(&mut buf)?;
        if i >= skip {
            image.extend_from_slice(&buf[..line]);
        }
    }
    dev.end_scan()?;

    let file = File::create(output)
        .wrap_err_with(|| format!("creating {}", output.display()))?;
    let mut w = BufWriter::new(file);
    pnm::encode(
        &mut w,
        &image,
        params.pixels,
        params.lines,
        params.channels,
        params.depth,
    )?;
    w.flush().wrap_err("writing image")?;

    tracing::info!(path = %output.display(), lines = params.lines, "image written");
    Ok(ScanSummary {
        pixels: params.pixels,
        lines: params.lines,
        bytes_read: session.total_bytes_to_read(),
    })
}
