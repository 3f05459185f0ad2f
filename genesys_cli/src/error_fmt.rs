//! Human-readable error descriptions and structured JSON error formatting.

use genesys_core::GenesysError;

/// The user interrupted a running scan.
#[derive(Debug)]
pub struct ScanCancelled;

impl std::fmt::Display for ScanCancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("scan cancelled")
    }
}

impl std::error::Error for ScanCancelled {}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if err.downcast_ref::<ScanCancelled>().is_some() {
        return "What happened: The scan was cancelled.\nLikely causes: Ctrl-C was pressed.\nHow to fix: Start a new scan; the head has been stopped.".to_string();
    }

    if let Some(ge) = err.downcast_ref::<GenesysError>() {
        return match ge {
            GenesysError::SensorNotFound { dpi, channels, method, .. } => format!(
                "What happened: No sensor profile for {dpi} dpi, {channels} channel(s), {method}.\nLikely causes: The model does not support this resolution for the method.\nHow to fix: Pick a value from `genesys resolutions --model <NAME>`."
            ),
            GenesysError::MotorProfileNotFound { motor_id, exposure } => format!(
                "What happened: Motor {motor_id} has no motion profile for exposure {exposure}.\nLikely causes: The exposure is longer than any measured profile.\nHow to fix: Use a lower resolution or a shorter exposure."
            ),
            GenesysError::UnsupportedMethod(m) => format!(
                "What happened: Scan method {m} is not supported by this model.\nHow to fix: Use a method listed by `genesys list-models`."
            ),
            GenesysError::StopTimeout { polls } => format!(
                "What happened: The motor did not stop after {polls} status polls.\nLikely causes: Mechanical jam or the device stopped responding.\nHow to fix: Power-cycle the scanner before the next scan."
            ),
            GenesysError::Timeout => "What happened: A USB transfer timed out.\nLikely causes: Loose cable or the device is busy.\nHow to fix: Reconnect the scanner and retry.".to_string(),
            GenesysError::Transport(msg) => format!(
                "What happened: Communication with the scanner failed ({msg}).\nLikely causes: Device unplugged or powered off.\nHow to fix: Reconnect the scanner and retry."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();
    if lower.contains("config") || lower.contains("must be") || lower.contains("required") {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nHow to fix: Edit the TOML config and try again."
        );
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable short name for the JSON `reason` field.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<ScanCancelled>().is_some() {
        return "Cancelled";
    }
    match err.downcast_ref::<GenesysError>() {
        Some(GenesysError::StopTimeout { .. }) => "StopTimeout",
        Some(GenesysError::Timeout) => "Timeout",
        Some(GenesysError::Transport(_)) => "Transport",
        Some(GenesysError::SensorNotFound { .. }) => "SensorNotFound",
        Some(GenesysError::MotorProfileNotFound { .. }) => "MotorProfileNotFound",
        Some(GenesysError::Config(_)) => "Config",
        Some(_) => "Scanner",
        None => "Error",
    }
}

/// Stable exit codes: 2 cancelled, 3 stop timeout, 4 transfer timeout,
/// 5 transport failure, 1 everything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<ScanCancelled>().is_some() {
        return 2;
    }
    match err.downcast_ref::<GenesysError>() {
        Some(GenesysError::StopTimeout { .. }) => 3,
        Some(GenesysError::Timeout) => 4,
        Some(GenesysError::Transport(_)) => 5,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let mut obj = json!({ "reason": reason_name(err), "message": humanize(err) });
    if let Some(GenesysError::StopTimeout { polls }) = err.downcast_ref::<GenesysError>() {
        obj["details"] = json!({ "polls": polls });
    }
    obj.to_string()
}
