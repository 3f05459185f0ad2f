//! Inspection commands: models, resolutions, slope tables and sessions.

use eyre::WrapErr;
use genesys_config::{
    CalibrationCfg, ColorModeCfg, Config, DeviceCfg, IoCfg, Logging, ScanCfg, ScanMethodCfg,
};
use genesys_core::conversions::resolve_model;
use genesys_core::{
    GenesysError, GenesysMotorSlope, MotorId, Registry, ScanMethod, ScanSession, SetupParams,
    StepType, compute_session, create_slope_table, create_slope_table_fastest,
    select_motor_profile,
};
use serde::Serialize;

use crate::cli::{ScanOverrides, StepTypeArg};

fn method_cfg(m: ScanMethod) -> ScanMethodCfg {
    match m {
        ScanMethod::Flatbed => ScanMethodCfg::Flatbed,
        ScanMethod::Transparency => ScanMethodCfg::Transparency,
        ScanMethod::TransparencyInfrared => ScanMethodCfg::TransparencyInfrared,
    }
}

/// Config with the command line overrides applied, validated.
pub fn effective_config(base: Option<&Config>, o: &ScanOverrides) -> eyre::Result<Config> {
    let mut cfg = base.cloned().unwrap_or_else(|| Config {
        device: DeviceCfg::default(),
        scan: ScanCfg::default(),
        io: IoCfg::default(),
        calibration: CalibrationCfg::default(),
        logging: Logging::default(),
    });
    if let Some(model) = &o.model {
        cfg.device.model = Some(model.clone());
    }
    let scan = &mut cfg.scan;
    if let Some(dpi) = o.resolution {
        scan.resolution = dpi;
        scan.x_resolution = None;
        scan.y_resolution = None;
    }
    if let Some(mode) = o.mode {
        scan.color_mode = mode.into();
        if o.depth.is_none() {
            scan.depth = match scan.color_mode {
                ColorModeCfg::Lineart => 1,
                _ if scan.depth == 1 => 8,
                _ => scan.depth,
            };
        }
    }
    if let Some(depth) = o.depth {
        scan.depth = depth;
    }
    if let Some(method) = o.method {
        scan.method = method_cfg(method);
    }
    if let Some(w) = o.width_mm {
        scan.area.br_x = scan.area.tl_x + w;
    }
    if let Some(h) = o.height_mm {
        scan.area.br_y = scan.area.tl_y + h;
    }
    cfg.validate().wrap_err("invalid scan request")?;
    Ok(cfg)
}

pub fn list_models(json: bool) -> eyre::Result<()> {
    let reg = Registry::builtin();
    for model in reg.models() {
        let usb: Vec<String> = reg
            .usb_devices()
            .iter()
            .filter(|e| e.model == model.name)
            .map(|e| format!("{:04x}:{:04x}", e.vendor_id, e.product_id))
            .collect();
        let methods: Vec<String> = model.methods().iter().map(ToString::to_string).collect();
        if json {
            let line = serde_json::json!({
                "name": model.name,
                "vendor": model.vendor,
                "model": model.model,
                "asic": model.asic_type,
                "methods": methods,
                "usb": usb,
            });
            println!("{line}");
        } else {
            println!(
                "{:<20} {} {} [{:?}] methods: {} usb: {}",
                model.name,
                model.vendor,
                model.model,
                model.asic_type,
                methods.join(","),
                usb.join(",")
            );
        }
    }
    Ok(())
}

pub fn resolutions(model: &str, method: ScanMethod, json: bool) -> eyre::Result<()> {
    let reg = Registry::builtin();
    let model = reg.model_by_name(model)?;
    let dpis = model.get_resolutions(method)?;
    if json {
        println!(
            "{}",
            serde_json::json!({ "model": model.name, "method": method, "resolutions": dpis })
        );
    } else {
        let list: Vec<String> = dpis.iter().map(ToString::to_string).collect();
        println!("{} ({method}): {}", model.name, list.join(" "));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct SlopeReport {
    motor: MotorId,
    step_type: StepType,
    profile_exposure: Option<u32>,
    target_speed_w: u32,
    scan_steps: usize,
    final_speed: u16,
    pixeltime_sum: u64,
    entries: Vec<u16>,
}

pub struct SlopeArgs {
    pub motor: MotorId,
    pub exposure: u32,
    pub yres: u32,
    pub step_type: Option<StepTypeArg>,
    pub fastest: bool,
    pub entries: usize,
}

pub fn slope(args: &SlopeArgs, json: bool) -> eyre::Result<()> {
    let reg = Registry::builtin();
    let motor = reg.motor(args.motor)?;
    let has_profiles = reg
        .motor_profiles()
        .iter()
        .any(|p| p.motor_id == args.motor);

    let (curve, step_type, profile_exposure) = if has_profiles {
        let p = select_motor_profile(reg.motor_profiles(), args.motor, args.exposure)?;
        if args.step_type.is_some() {
            tracing::warn!(picked = ?p.step_type, "--step-type ignored; motor has measured profiles");
        }
        (GenesysMotorSlope::Physical(p.slope), p.step_type, Some(p.exposure))
    } else {
        let st = args
            .step_type
            .map_or(StepType::Full, StepType::from)
            .min(motor.max_step_type());
        (*motor.get_slope(st)?, st, None)
    };

    if motor.base_ydpi == 0 {
        return Err(GenesysError::Config(format!("motor {} has no base resolution", motor.id)).into());
    }
    let target = u64::from(args.exposure) * u64::from(args.yres) / u64::from(motor.base_ydpi);
    let target = u32::try_from(target).wrap_err("target speed out of range")?;
    let mult = step_type.multiplier() as usize;
    let table = if args.fastest {
        create_slope_table_fastest(&curve, step_type, mult, 2 * mult)?
    } else {
        create_slope_table(&curve, target, step_type, mult, 2 * mult)?
    };

    let report = SlopeReport {
        motor: args.motor,
        step_type,
        profile_exposure,
        target_speed_w: target,
        scan_steps: table.scan_steps,
        final_speed: table.final_speed(),
        pixeltime_sum: table.pixeltime_sum,
        entries: table.table.iter().take(args.entries).copied().collect(),
    };
    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!(
            "motor {} {:?} step, profile exposure {}",
            report.motor,
            report.step_type,
            report
                .profile_exposure
                .map_or_else(|| "-".to_string(), |e| e.to_string())
        );
        println!(
            "scan_steps {} final_speed {} pixeltime_sum {}",
            report.scan_steps, report.final_speed, report.pixeltime_sum
        );
        let entries: Vec<String> = report.entries.iter().map(ToString::to_string).collect();
        println!("table: {}", entries.join(" "));
    }
    Ok(())
}

/// Session for the effective request of `cfg`.
pub fn build_session(reg: &Registry, cfg: &Config) -> eyre::Result<ScanSession> {
    let model = resolve_model(reg, &cfg.device)?;
    let params = SetupParams::from(&cfg.scan);
    compute_session(reg, model, None, &params, None).wrap_err("computing scan session")
}

pub fn session(cfg: &Config, registers: bool, json: bool) -> eyre::Result<()> {
    let reg = Registry::builtin();
    let s = build_session(&reg, cfg)?;
    let regs = if registers {
        Some(s.build_registers(&reg)?)
    } else {
        None
    };

    if json {
        let mut v = serde_json::to_value(&s)?;
        if let Some(regs) = &regs {
            v["registers"] = serde_json::to_value(regs.iter().collect::<Vec<_>>())?;
        }
        println!("{v}");
        return Ok(());
    }

    let p = &s.params;
    println!(
        "request: {}x{} dpi, {} px x {} lines, {} bit, {} channel(s), {}",
        p.xres, p.yres, p.pixels, p.lines, p.depth, p.channels, p.scan_method
    );
    println!(
        "sensor: dpihw {} optical {} px (raw {}), output {} px",
        s.optical_resolution, s.optical_pixels, s.optical_pixels_raw, s.output_pixels
    );
    println!(
        "lines: {} output, {} optical, color shift {}/{}/{}, stagger {}",
        s.output_line_count,
        s.optical_line_count,
        s.color_shift_lines_r,
        s.color_shift_lines_g,
        s.color_shift_lines_b,
        s.num_staggered_lines
    );
    println!(
        "exposure {} step {:?} bytes/line {} total {}",
        s.exposure_time,
        s.step_type,
        s.bytes_per_line(),
        s.total_bytes_to_read()
    );
    if let Some(regs) = regs {
        for r in regs.iter() {
            println!("  0x{:02x} = 0x{:02x}", r.address, r.value);
        }
    }
    Ok(())
}
