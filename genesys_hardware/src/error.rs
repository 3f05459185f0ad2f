use thiserror::Error;

/// Failures of the simulated USB link.
#[derive(Debug, Error)]
pub enum HwError {
    #[error("transfer timeout")]
    Timeout,
    #[error("device disconnected")]
    Disconnected,
    #[error("bulk read of {requested} bytes exceeds the {available} bytes the device holds")]
    ShortRead { requested: usize, available: usize },
}
