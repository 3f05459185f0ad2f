use thiserror::Error;

use crate::motor::MotorId;
use crate::sensor::{ScanMethod, SensorId};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenesysError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("no sensor {sensor_id:?} for {dpi} dpi, {channels} channel(s), method {method:?}")]
    SensorNotFound {
        sensor_id: SensorId,
        dpi: u32,
        channels: u32,
        method: ScanMethod,
    },
    #[error("unknown motor {0:?}")]
    MotorNotFound(MotorId),
    #[error("no motor profile for {motor_id:?} at exposure {exposure}")]
    MotorProfileNotFound { motor_id: MotorId, exposure: u32 },
    #[error("scan method {0:?} is not supported by this model")]
    UnsupportedMethod(ScanMethod),
    #[error("requested {requested} slope but the motor holds a {actual} slope")]
    WrongSlopeVariant {
        requested: &'static str,
        actual: &'static str,
    },
    #[error("unknown register 0x{0:04x}")]
    UnknownRegister(u16),
    #[error("buffer size exceeded: {requested} bytes requested, {free} free")]
    BufferExceeded { requested: usize, free: usize },
    #[error("no more data in buffer: {requested} bytes requested, {available} available")]
    NoMoreData { requested: usize, available: usize },
    #[error("invalid slope table request: {0}")]
    InvalidSlopeRequest(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("transport timeout")]
    Timeout,
    #[error("could not stop motor after {polls} status polls")]
    StopTimeout { polls: u32 },
    #[error("invalid state: {0}")]
    State(String),
}

pub type Result<T> = std::result::Result<T, GenesysError>;
pub use eyre::Report;
