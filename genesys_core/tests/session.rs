use genesys_core::{
    GenesysError, MotorId, Registry, ResolutionFilter, ScanMethod, Sensor, SensorId, SetupParams,
    StepType, compute_session,
};
use rstest::rstest;

fn gray_letter_300() -> SetupParams {
    SetupParams {
        xres: 300,
        yres: 300,
        pixels: 2550,
        lines: 3300,
        depth: 8,
        channels: 1,
        ..SetupParams::default()
    }
}

fn sensor_for(dpi: u32, lperiod: u32) -> Sensor {
    Sensor {
        sensor_id: SensorId::CisCanonLide100,
        full_resolution: 600,
        resolutions: ResolutionFilter::Values(vec![dpi]),
        register_dpihw: 600,
        exposure_lperiod: lperiod,
        ..Sensor::default()
    }
}

/// LiDE 100 model and motor with a sensor table holding one entry per
/// resolution.
fn lide100_registry() -> Registry {
    let builtin = Registry::builtin();
    let mut reg = Registry::empty();
    reg.push_model(builtin.model_by_name("canon-lide-100").unwrap().clone())
        .push_motor(builtin.motor(MotorId::CanonLide100).unwrap().clone());
    for p in builtin
        .motor_profiles()
        .iter()
        .filter(|p| p.motor_id == MotorId::CanonLide100)
    {
        reg.push_motor_profile(*p);
    }
    for (dpi, lperiod) in [(75, 1000), (150, 2000), (300, 2848), (600, 5000)] {
        reg.push_sensor(sensor_for(dpi, lperiod));
    }
    reg
}

#[test]
fn letter_page_at_300_dpi_gray() {
    let reg = lide100_registry();
    let model = reg.model_by_name("canon-lide-100").unwrap();
    let params = gray_letter_300();

    let picked = reg
        .find_sensor(model.sensor_id, 300, 1, ScanMethod::Flatbed)
        .unwrap();
    assert_eq!(picked.resolutions, ResolutionFilter::Values(vec![300]));

    let s = compute_session(&reg, model, None, &params, None).unwrap();
    assert_eq!(s.sensor.resolutions.values(), &[300]);
    assert_eq!(s.exposure_time, picked.exposure_lperiod);
    assert_eq!(s.bytes_per_line(), 2550);
    assert_eq!(s.output_pixels, 2550);
    assert_eq!(s.optical_pixels, 5100);
    assert_eq!(s.output_line_count, 3300);
    assert_eq!(s.total_bytes_to_read(), 2550 * 3300);
    assert_eq!(s.step_type, StepType::Half);
    assert!(!s.needs_shrink);
}

#[test]
fn calibrated_sensor_override_keeps_exposure_from_lperiod() {
    let reg = lide100_registry();
    let model = reg.model_by_name("canon-lide-100").unwrap();
    let table = reg
        .find_sensor(model.sensor_id, 300, 1, ScanMethod::Flatbed)
        .unwrap();
    let calibrated =
        table.with_calibrated_exposure(genesys_core::SensorExposure::new(700, 800, 900));
    let s = compute_session(&reg, model, Some(&calibrated), &gray_letter_300(), None).unwrap();
    assert_eq!(s.sensor.exposure.max(), 900);
    assert_eq!(s.exposure_time, 2848);
}

#[rstest]
#[case(75, 1000, StepType::Half)] // 1432 is the smallest profile >= 1000
#[case(150, 2000, StepType::Quarter)] // 2712
#[case(600, 5000, StepType::Eighth)] // 5280
fn profile_follows_exposure(#[case] dpi: u32, #[case] exposure: u32, #[case] step: StepType) {
    let reg = lide100_registry();
    let model = reg.model_by_name("canon-lide-100").unwrap();
    let params = SetupParams {
        xres: dpi,
        yres: dpi,
        ..gray_letter_300()
    };
    let s = compute_session(&reg, model, None, &params, None).unwrap();
    assert_eq!(s.exposure_time, exposure);
    assert_eq!(s.step_type, step);
    assert!(s.motor_profile.unwrap().exposure >= exposure);
}

#[test]
fn exposure_beyond_every_profile_fails_without_fallback() {
    let reg = lide100_registry();
    let model = reg.model_by_name("canon-lide-100").unwrap();
    let err = compute_session(&reg, model, None, &gray_letter_300(), Some(6000)).unwrap_err();
    assert_eq!(
        err,
        GenesysError::MotorProfileNotFound {
            motor_id: MotorId::CanonLide100,
            exposure: 6000
        }
    );
}

#[test]
fn missing_sensor_entry_is_reported() {
    let reg = lide100_registry();
    let model = reg.model_by_name("canon-lide-100").unwrap();
    let params = SetupParams {
        xres: 200,
        ..gray_letter_300()
    };
    assert!(matches!(
        compute_session(&reg, model, None, &params, None),
        Err(GenesysError::SensorNotFound { dpi: 200, .. })
    ));
}

#[rstest]
#[case::gray(1)]
#[case::color(3)]
fn every_advertised_resolution_compiles(#[case] channels: u32) {
    let reg = Registry::builtin();
    for model in reg.models() {
        for method in model.methods() {
            for dpi in model.get_resolutions(method).unwrap() {
                let ctx = format!("{} {method} {dpi} dpi, {channels} channel(s)", model.name);
                let params = SetupParams {
                    xres: dpi,
                    yres: dpi,
                    pixels: 100,
                    lines: 10,
                    channels,
                    scan_method: method,
                    flags: if method.is_transparency() {
                        genesys_core::ScanFlag::USE_XPA
                    } else {
                        genesys_core::ScanFlag::empty()
                    },
                    ..SetupParams::default()
                };
                let s = compute_session(&reg, model, None, &params, None)
                    .unwrap_or_else(|e| panic!("{ctx}: {e}"));
                assert_eq!(s.bytes_per_line(), 100 * channels, "{ctx}");
                assert!(s.output_line_count >= 10, "{ctx}");
                assert!(s.exposure_time > 0, "{ctx}");
                s.slope_tables(&reg)
                    .unwrap_or_else(|e| panic!("{ctx}: slope tables: {e}"));
                s.build_registers(&reg)
                    .unwrap_or_else(|e| panic!("{ctx}: registers: {e}"));
            }
        }
    }
}
