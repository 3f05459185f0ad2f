//! In-memory cache of calibrated sensor records.
//!
//! Calibration is slow, so a calibrated sensor profile is kept and reused for
//! later scans with the same geometry. Flatbed entries age out because lamp
//! and sensor drift over time; sheetfed devices recalibrate on every sheet
//! anyway, so their entries are kept until replaced.

use std::time::{Duration, Instant};

use crate::sensor::{ScanMethod, Sensor, SensorId};
use crate::session::SetupParams;

pub const DEFAULT_EXPIRATION: Duration = Duration::from_secs(60 * 60);

/// What a calibration depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionFingerprint {
    pub sensor_id: SensorId,
    pub method: ScanMethod,
    pub register_dpihw: u32,
    pub xres: u32,
    pub channels: u32,
    pub depth: u32,
}

impl SessionFingerprint {
    pub fn new(params: &SetupParams, sensor: &Sensor) -> Self {
        Self {
            sensor_id: sensor.sensor_id,
            method: params.scan_method,
            register_dpihw: sensor.register_dpihw,
            xres: params.xres,
            channels: params.channels,
            depth: params.depth,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CalibrationEntry {
    pub fingerprint: SessionFingerprint,
    pub sensor: Sensor,
    pub last_calibration: Instant,
}

#[derive(Debug, Clone)]
pub struct CalibrationCache {
    entries: Vec<CalibrationEntry>,
    /// `None` keeps entries forever.
    expiration: Option<Duration>,
}

impl Default for CalibrationCache {
    fn default() -> Self {
        Self::new(Some(DEFAULT_EXPIRATION))
    }
}

impl CalibrationCache {
    pub fn new(expiration: Option<Duration>) -> Self {
        Self {
            entries: Vec::new(),
            expiration,
        }
    }

    pub fn expiration(&self) -> Option<Duration> {
        self.expiration
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entry for `fingerprint` that is still valid at `now`.
    pub fn find(
        &self,
        fingerprint: &SessionFingerprint,
        now: Instant,
        is_sheetfed: bool,
    ) -> Option<&CalibrationEntry> {
        let entry = self.entries.iter().find(|e| e.fingerprint == *fingerprint)?;
        if !is_sheetfed
            && let Some(max_age) = self.expiration
            && now.saturating_duration_since(entry.last_calibration) > max_age
        {
            tracing::debug!(?fingerprint, "calibration expired");
            return None;
        }
        Some(entry)
    }

    /// Insert, replacing any entry with the same fingerprint.
    pub fn store(&mut self, entry: CalibrationEntry) {
        self.entries.retain(|e| e.fingerprint != entry.fingerprint);
        self.entries.push(entry);
    }
}
