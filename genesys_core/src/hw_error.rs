//! Maps `Box<dyn Error>` from the transport seam to typed `GenesysError`.
//!
//! `genesys_traits::Transport` returns `Box<dyn Error + Send + Sync>`; this
//! module converts those to our error enum, with an optional feature-gated
//! path for `genesys_hardware::HwError` downcasting.

use crate::error::GenesysError;

/// Map a transport error to a typed `GenesysError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> GenesysError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<genesys_hardware::error::HwError>() {
            return match hw {
                genesys_hardware::error::HwError::Timeout => GenesysError::Timeout,
                other => GenesysError::Transport(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        GenesysError::Timeout
    } else {
        GenesysError::Transport(s)
    }
}
