#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core scanner logic for Genesys USB flatbed ASICs (hardware-agnostic).
//!
//! All device I/O goes through `genesys_traits::Transport`; everything else
//! in this crate is pure computation over the built-in device tables.
//!
//! ## Architecture
//!
//! - **Tables**: models, sensors, motors and motion profiles (`registry`)
//! - **Motion**: acceleration curves and slope tables (`motor`)
//! - **Session**: scan request to resolved geometry and timing (`session`)
//! - **Registers**: register image for a session (`registers`)
//! - **Streaming**: FIFO staging and chunked bulk reads (`buffer`, `image_buffer`)
//! - **Device**: setup, start, read and stop over a transport (`device`)
//!
//! Core computations return the typed [`GenesysError`]; the device layer adds
//! context with `eyre`.

pub mod buffer;
pub mod calibration_cache;
pub mod conversions;
pub mod device;
pub mod error;
pub mod hw_error;
pub mod image_buffer;
pub mod mocks;
pub mod model;
pub mod motor;
pub mod registers;
pub mod registry;
pub mod sensor;
pub mod session;
pub mod status;
mod tables;
pub mod util;

pub use buffer::FifoBuffer;
pub use calibration_cache::{CalibrationCache, CalibrationEntry, SessionFingerprint};
pub use device::{DeviceOptions, ScannerDevice};
pub use error::{GenesysError, Result};
pub use image_buffer::{ImageBuffer, ImageBufferGenesysUsb, get_read_size};
pub use model::{AsicType, ColorOrder, MethodResolutions, Model, ModelFlag, UsbDeviceEntry};
pub use motor::{
    GenesysMotorSlope, Motor, MotorId, MotorProfile, MotorSlope, MotorSlopeLegacy,
    MotorSlopeTable, SlopeCurve, StepType, create_slope_table, create_slope_table_fastest,
    select_fast_profile, select_motor_profile,
};
pub use registers::{GenesysRegister, RegisterSet, RegisterSetting, RegisterSettings};
pub use registry::Registry;
pub use sensor::{
    Ratio, ResolutionFilter, ScanMethod, Sensor, SensorExposure, SensorId, StaggerConfig,
};
pub use session::{
    BufferSizes, ColorFilter, ScanColorMode, ScanFlag, ScanSession, SetupParams, SlopeTables,
    compute_session,
};
pub use status::ScannerStatus;
