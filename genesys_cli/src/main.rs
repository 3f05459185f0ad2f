mod cli;
mod commands;
mod error_fmt;
mod pnm;
mod scan;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn load_config(path: Option<&Path>) -> eyre::Result<Option<genesys_config::Config>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading config {}", path.display()))?;
    let cfg = genesys_config::load_toml(&text)
        .wrap_err_with(|| format!("parsing config {}", path.display()))?;
    Ok(Some(cfg))
}

fn init_tracing(json: bool, level: &str, logging: Option<&genesys_config::Logging>) -> eyre::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .wrap_err_with(|| format!("invalid log level '{level}'"))?;

    let console = if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file = match logging.and_then(|l| l.file.as_deref()) {
        Some(path) => {
            let path = Path::new(path);
            let rotation = match logging.and_then(|l| l.rotation.as_deref()) {
                Some("daily") => tracing_appender::rolling::Rotation::DAILY,
                Some("hourly") => tracing_appender::rolling::Rotation::HOURLY,
                _ => tracing_appender::rolling::Rotation::NEVER,
            };
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .map_or_else(|| "genesys.log".to_string(), |n| n.to_string_lossy().into_owned());
            let appender = tracing_appender::rolling::RollingFileAppender::builder()
                .rotation(rotation)
                .filename_prefix(name)
                .build(dir)
                .wrap_err("opening log file")?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_writer(writer).boxed())
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .wrap_err("initializing logging")
}

fn run(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(cli.config.as_deref())?;
    let level = cli
        .log_level
        .clone()
        .or_else(|| cfg.as_ref().and_then(|c| c.logging.level.clone()))
        .unwrap_or_else(|| "warn".to_string());
    init_tracing(cli.json, &level, cfg.as_ref().map(|c| &c.logging))?;

    match cli.cmd {
        Commands::ListModels => commands::list_models(cli.json),
        Commands::Resolutions { model, method } => commands::resolutions(&model, method, cli.json),
        Commands::Slope {
            motor,
            exposure,
            yres,
            step_type,
            fastest,
            entries,
        } => commands::slope(
            &commands::SlopeArgs {
                motor,
                exposure,
                yres,
                step_type,
                fastest,
                entries,
            },
            cli.json,
        ),
        Commands::Session { scan, registers } => {
            let cfg = commands::effective_config(cfg.as_ref(), &scan)?;
            commands::session(&cfg, registers, cli.json)
        }
        Commands::Scan { scan, output } => {
            let cfg = commands::effective_config(cfg.as_ref(), &scan)?;
            let cancel = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&cancel);
            if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
                tracing::warn!(error = %e, "Ctrl-C handler not installed");
            }
            let summary = scan::run_scan(&cfg, &output, &cancel)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "output": output.display().to_string(),
                        "pixels": summary.pixels,
                        "lines": summary.lines,
                        "bytes_read": summary.bytes_read,
                    })
                );
            } else {
                println!(
                    "scan complete: {}x{} written to {} ({} bytes read)",
                    summary.pixels,
                    summary.lines,
                    output.display(),
                    summary.bytes_read
                );
            }
            Ok(())
        }
    }
}

fn main() {
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error hooks: {e}");
    }
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}
