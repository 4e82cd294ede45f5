//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "thermo", version, about = "Heater controller CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/thermo.toml")]
    pub config: PathBuf,

    /// Optional resistance/temperature reference CSV (strict header)
    #[arg(long, value_name = "FILE")]
    pub reference: Option<PathBuf>,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the closed control loop
    Run {
        /// Override the configured setpoint (Celsius)
        #[arg(long, value_name = "C")]
        setpoint: Option<f64>,
        /// Override the configured hysteresis half-width (Celsius)
        #[arg(long, value_name = "C")]
        tolerance: Option<f64>,
        /// Stop after this many polls (default: run until Ctrl-C)
        #[arg(long, value_name = "N")]
        max_polls: Option<u64>,
        /// Press the power button on the first poll instead of waiting
        /// for a touch
        #[arg(long, action = ArgAction::SetTrue)]
        enable: bool,
        /// Simulated ambient temperature (Celsius, sim backend only)
        #[arg(long, value_name = "C", default_value_t = 20.0)]
        ambient: f64,
    },
    /// Quick health check (hardware presence / sim ok)
    SelfCheck,
    /// Take temperature readings and print them
    ReadTemp {
        /// Number of readings
        #[arg(long, value_name = "N", default_value_t = 1)]
        count: u32,
        /// Simulated ambient temperature (Celsius, sim backend only)
        #[arg(long, value_name = "C", default_value_t = 20.0)]
        ambient: f64,
    },
}
