//! Scan orchestration over a [`Transport`].
//!
//! The device is single threaded and blocking. A scan goes through
//! `setup_scan` (registers and slope tables), `begin_scan`, any number of
//! `read_data` calls and finally `stop_action`/`end_scan`. Transport errors
//! abort the current step and are not retried here.

use std::time::Duration;

use eyre::WrapErr;
use genesys_traits::Transport;
use genesys_traits::clock::{Clock, MonotonicClock};

use crate::buffer::FifoBuffer;
use crate::calibration_cache::{CalibrationCache, CalibrationEntry, SessionFingerprint};
use crate::error::GenesysError;
use crate::hw_error::map_hw_error;
use crate::image_buffer::{ImageBufferGenesysUsb, get_read_size};
use crate::model::Model;
use crate::registers::{
    REG_0X01, REG_0X01_SCAN, REG_0X02, REG_0X02_MTRPWR, REG_0X0F, REG_0X2A, REG_0X2B, REG_0X40,
    REG_0X41, RegisterSet,
};
use crate::registry::Registry;
use crate::sensor::Sensor;
use crate::session::{ScanSession, SetupParams, compute_session};
use crate::status::ScannerStatus;

/// ASIC buffer address of slope table slot 0; slots are 0x800 bytes apart.
pub const SLOPE_TABLE_BASE_ADDRESS: u32 = 0x8000;
pub const SLOPE_TABLE_SLOT_STRIDE: u32 = 0x800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceOptions {
    pub stop_poll_interval: Duration,
    pub stop_max_polls: u32,
    /// Overrides the session's nominal bulk read size.
    pub read_chunk_bytes: Option<usize>,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            stop_poll_interval: Duration::from_millis(100),
            stop_max_polls: 300,
            read_chunk_bytes: None,
        }
    }
}

fn io_error(e: &(dyn std::error::Error + Send + Sync + 'static)) -> eyre::Report {
    eyre::Report::new(map_hw_error(e))
}

pub struct ScannerDevice<T: Transport> {
    transport: T,
    registry: Registry,
    model: Model,
    clock: Box<dyn Clock + Send + Sync>,
    options: DeviceOptions,
    regs: RegisterSet,
    session: Option<ScanSession>,
    read_buffer: FifoBuffer,
    remaining_bytes: usize,
    calibration: CalibrationCache,
}

impl<T: Transport> ScannerDevice<T> {
    /// Attach to a device of model `model_name`.
    pub fn open(transport: T, registry: Registry, model_name: &str) -> eyre::Result<Self> {
        let model = registry
            .model_by_name(model_name)
            .map_err(eyre::Report::new)?
            .clone();
        tracing::info!(model = model.name, asic = ?model.asic_type, "device opened");
        Ok(Self {
            transport,
            registry,
            model,
            clock: Box::new(MonotonicClock::new()),
            options: DeviceOptions::default(),
            regs: RegisterSet::new(),
            session: None,
            read_buffer: FifoBuffer::new(),
            remaining_bytes: 0,
            calibration: CalibrationCache::default(),
        })
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_options(mut self, options: DeviceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_calibration_cache(mut self, cache: CalibrationCache) -> Self {
        self.calibration = cache;
        self
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn session(&self) -> Option<&ScanSession> {
        self.session.as_ref()
    }

    /// Last register image written to the device.
    pub fn registers(&self) -> &RegisterSet {
        &self.regs
    }

    /// Image bytes of the current scan not yet handed to the caller, whether
    /// staged in the read buffer or still on the device.
    pub fn remaining_bytes(&self) -> usize {
        self.remaining_bytes + self.read_buffer.avail()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn write_register(&mut self, address: u16, value: u8) -> eyre::Result<()> {
        self.transport
            .write_register(address, value)
            .map_err(|e| io_error(e.as_ref()))
            .wrap_err_with(|| format!("writing register 0x{address:02x}"))
    }

    fn read_register(&mut self, address: u16) -> eyre::Result<u8> {
        self.transport
            .read_register(address)
            .map_err(|e| io_error(e.as_ref()))
            .wrap_err_with(|| format!("reading register 0x{address:02x}"))
    }

    pub fn read_status(&mut self) -> eyre::Result<ScannerStatus> {
        let r40 = self.read_register(REG_0X40)?;
        let r41 = self.read_register(REG_0X41)?;
        Ok(ScannerStatus::from_registers(r40, r41))
    }

    /// Calibrated sensor for `params`, if a fresh one is cached.
    fn cached_sensor(&self, params: &SetupParams) -> Option<Sensor> {
        let sensor = self
            .registry
            .find_sensor(self.model.sensor_id, params.xres, params.channels, params.scan_method)
            .ok()?;
        let fp = SessionFingerprint::new(params, sensor);
        self.calibration
            .find(&fp, self.clock.now(), self.model.is_sheetfed)
            .map(|e| e.sensor.clone())
    }

    /// Remember a calibrated sensor for the current session's geometry.
    pub fn store_calibration(&mut self, sensor: Sensor) -> eyre::Result<()> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| eyre::Report::new(GenesysError::State("no scan set up".into())))?;
        let fingerprint = SessionFingerprint::new(&session.params, &sensor);
        self.calibration.store(CalibrationEntry {
            fingerprint,
            sensor,
            last_calibration: self.clock.now(),
        });
        Ok(())
    }

    /// Compute the session, program every register in address order, upload
    /// the five slope tables and size the read buffer.
    pub fn setup_scan(&mut self, params: &SetupParams) -> eyre::Result<&ScanSession> {
        let cached = self.cached_sensor(params);
        if cached.is_some() {
            tracing::debug!("using cached calibration");
        }
        let session = compute_session(&self.registry, &self.model, cached.as_ref(), params, None)
            .map_err(eyre::Report::new)
            .wrap_err("computing scan session")?;
        let regs = session
            .build_registers(&self.registry)
            .map_err(eyre::Report::new)
            .wrap_err("building register set")?;
        let tables = session
            .slope_tables(&self.registry)
            .map_err(eyre::Report::new)
            .wrap_err("building slope tables")?;

        for r in regs.iter() {
            self.write_register(r.address, r.value)?;
        }
        for (slot, table) in tables.slots() {
            let address = SLOPE_TABLE_BASE_ADDRESS + SLOPE_TABLE_SLOT_STRIDE * slot as u32;
            let [_, _, hi, lo] = (address >> 4).to_be_bytes();
            self.write_register(REG_0X2B, lo)?;
            self.write_register(REG_0X2A, hi)?;
            self.transport
                .bulk_write(&table.to_le_bytes())
                .map_err(|e| io_error(e.as_ref()))
                .wrap_err_with(|| format!("uploading slope table {slot}"))?;
        }

        let chunk = self.nominal_read_size(&session);
        let fifo_size = (session.buffers.read as usize).max(2 * chunk);
        self.read_buffer.alloc(fifo_size);
        self.remaining_bytes = usize::try_from(session.total_bytes_to_read())
            .map_err(|_| eyre::eyre!("scan of {} bytes is too large", session.total_bytes_to_read()))?;
        tracing::info!(
            xres = params.xres,
            yres = params.yres,
            lines = session.output_line_count,
            bytes = self.remaining_bytes,
            "scan set up"
        );
        self.regs = regs;
        Ok(self.session.insert(session))
    }

    fn nominal_read_size(&self, session: &ScanSession) -> usize {
        let nominal = self
            .options
            .read_chunk_bytes
            .unwrap_or(session.buffers.usb_read_chunk as usize);
        // the size of a non-final read
        get_read_size(usize::MAX, nominal)
    }

    /// Start the motor and sensor.
    pub fn begin_scan(&mut self) -> eyre::Result<()> {
        if self.session.is_none() {
            return Err(eyre::Report::new(GenesysError::State(
                "begin_scan without setup_scan".into(),
            )));
        }
        let r01 = self.regs.get8(REG_0X01).unwrap_or(0) | REG_0X01_SCAN;
        self.regs.set8(REG_0X01, r01);
        self.write_register(REG_0X01, r01)?;
        let r02 = self.regs.get8(REG_0X02).unwrap_or(0) | REG_0X02_MTRPWR;
        self.regs.set8(REG_0X02, r02);
        self.write_register(REG_0X02, r02)?;
        self.write_register(REG_0X0F, 1)?;
        tracing::info!("scan started");
        Ok(())
    }

    /// Fill `out` with the next bytes of the image.
    ///
    /// Bytes are fetched in whole device chunks; whatever the caller does not
    /// take stays in the read buffer for the next call.
    pub fn read_data(&mut self, out: &mut [u8]) -> eyre::Result<()> {
        let chunk = match &self.session {
            Some(s) => self.nominal_read_size(s),
            None => {
                return Err(eyre::Report::new(GenesysError::State(
                    "read_data without setup_scan".into(),
                )));
            }
        };

        let mut written = self.read_buffer.pop_into(out);
        while written < out.len() {
            let need = out.len() - written;
            let capacity = self.read_buffer.size() / chunk * chunk;
            let fetch = (need.div_ceil(chunk) * chunk)
                .min(capacity)
                .min(self.remaining_bytes);
            if fetch == 0 {
                return Err(eyre::Report::new(GenesysError::NoMoreData {
                    requested: need,
                    available: 0,
                }));
            }

            let free = self.read_buffer.free();
            let transport = &mut self.transport;
            let mut reader = ImageBufferGenesysUsb::new(fetch, chunk, |buf: &mut [u8]| {
                transport.bulk_read(buf).map_err(|e| map_hw_error(e.as_ref()))
            });
            let dst = self.read_buffer.get_write_pos(fetch).ok_or_else(|| {
                eyre::Report::new(GenesysError::BufferExceeded {
                    requested: fetch,
                    free,
                })
            })?;
            reader.get_data(dst).wrap_err("reading image data")?;
            self.read_buffer.produce(fetch)?;
            self.remaining_bytes -= fetch;
            written += self.read_buffer.pop_into(&mut out[written..]);
        }
        Ok(())
    }

    /// Stop an ongoing scan and wait for the motor to come to rest.
    ///
    /// Returns at once when the ASIC is already idle. Otherwise the scan and
    /// motor power bits are cleared and the status polled up to
    /// `stop_max_polls` times.
    pub fn stop_action(&mut self) -> eyre::Result<()> {
        let status = self.read_status()?;
        if !status.is_busy() {
            tracing::debug!("stop_action: already stopped");
            return Ok(());
        }

        let r01 = self.read_register(REG_0X01)? & !REG_0X01_SCAN;
        self.regs.set8(REG_0X01, r01);
        self.write_register(REG_0X01, r01)?;
        let r02 = self.read_register(REG_0X02)? & !REG_0X02_MTRPWR;
        self.regs.set8(REG_0X02, r02);
        self.write_register(REG_0X02, r02)?;

        for _ in 0..self.options.stop_max_polls {
            if !self.read_status()?.is_busy() {
                tracing::info!("scan stopped");
                return Ok(());
            }
            self.clock.sleep(self.options.stop_poll_interval);
        }
        tracing::error!(polls = self.options.stop_max_polls, "motor did not stop");
        Err(eyre::Report::new(GenesysError::StopTimeout {
            polls: self.options.stop_max_polls,
        }))
    }

    /// Stop the scan and drop its session and buffered data.
    pub fn end_scan(&mut self) -> eyre::Result<()> {
        let result = self.stop_action();
        self.session = None;
        self.read_buffer.clear();
        self.remaining_bytes = 0;
        result
    }
}
