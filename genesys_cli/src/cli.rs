//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use genesys_core::{MotorId, ScanMethod, StepType};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "genesys", version, about = "Genesys scanner tools")]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log and report as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); defaults to
    /// [logging].level, then "warn"
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum StepTypeArg {
    Full,
    Half,
    Quarter,
    Eighth,
}

impl From<StepTypeArg> for StepType {
    fn from(s: StepTypeArg) -> Self {
        match s {
            StepTypeArg::Full => StepType::Full,
            StepTypeArg::Half => StepType::Half,
            StepTypeArg::Quarter => StepType::Quarter,
            StepTypeArg::Eighth => StepType::Eighth,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ColorModeArg {
    Lineart,
    Gray,
    Color,
}

impl From<ColorModeArg> for genesys_config::ColorModeCfg {
    fn from(m: ColorModeArg) -> Self {
        match m {
            ColorModeArg::Lineart => Self::Lineart,
            ColorModeArg::Gray => Self::Gray,
            ColorModeArg::Color => Self::Color,
        }
    }
}

/// Scan request overrides applied on top of the `[scan]` section.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ScanOverrides {
    /// Model name; overrides [device]
    #[arg(long, value_name = "NAME")]
    pub model: Option<String>,
    /// Resolution in dpi for both axes
    #[arg(long, value_name = "DPI")]
    pub resolution: Option<u32>,
    #[arg(long, value_enum, value_name = "MODE")]
    pub mode: Option<ColorModeArg>,
    /// Bit depth (1, 8 or 16)
    #[arg(long, value_name = "BITS")]
    pub depth: Option<u32>,
    /// Scan method (flatbed, transparency, transparency-infrared)
    #[arg(long, value_name = "METHOD")]
    pub method: Option<ScanMethod>,
    /// Scan area width in millimetres from the left edge
    #[arg(long, value_name = "MM")]
    pub width_mm: Option<f32>,
    /// Scan area height in millimetres from the top edge
    #[arg(long, value_name = "MM")]
    pub height_mm: Option<f32>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List supported scanner models
    ListModels,
    /// Print the resolutions a model supports
    Resolutions {
        #[arg(long, value_name = "NAME")]
        model: String,
        /// Scan method (flatbed, transparency, transparency-infrared)
        #[arg(long, value_name = "METHOD", default_value = "flatbed")]
        method: ScanMethod,
    },
    /// Build and print a motor slope table
    Slope {
        #[arg(long, value_name = "MOTOR")]
        motor: MotorId,
        /// Line exposure in pixel clocks; picks the motion profile
        #[arg(long, value_name = "TICKS")]
        exposure: u32,
        /// Vertical resolution the table is built for
        #[arg(long, value_name = "DPI", default_value_t = 300)]
        yres: u32,
        /// Step type for motors without measured profiles
        #[arg(long, value_enum, value_name = "TYPE")]
        step_type: Option<StepTypeArg>,
        /// Accelerate to the motor's maximum speed instead of scan speed
        #[arg(long, action = ArgAction::SetTrue)]
        fastest: bool,
        /// Number of table entries to print
        #[arg(long, value_name = "N", default_value_t = 16)]
        entries: usize,
    },
    /// Compute and print the scan session for a request
    Session {
        #[command(flatten)]
        scan: ScanOverrides,
        /// Also print the register image
        #[arg(long, action = ArgAction::SetTrue)]
        registers: bool,
    },
    /// Run a scan against the simulated scanner and write a PNM image
    Scan {
        #[command(flatten)]
        scan: ScanOverrides,
        /// Output image path
        #[arg(long, short, value_name = "FILE")]
        output: PathBuf,
    },
}
