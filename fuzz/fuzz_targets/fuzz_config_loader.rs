#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parsing and validation must reject bad input without panicking.
    let Ok(cfg) = genesys_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_err() {
        return;
    }
    // A validated scan section always maps onto a request.
    let params = genesys_core::SetupParams::from(&cfg.scan);
    let _ = params.validate();
    let _ = genesys_core::DeviceOptions::from(&cfg.io);
    let _ = genesys_core::CalibrationCache::from(&cfg.calibration);
});
