//! Heater controller CLI: config loading, logging setup, and command
//! dispatch over the sim or hardware backend.

mod cli;
mod error_fmt;
mod run;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use therm_config::Config;

fn init_tracing(cli: &Cli, cfg: &Config) -> Result<()> {
    let level = cfg
        .logging
        .level
        .as_deref()
        .unwrap_or(cli.log_level.as_str());
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .wrap_err_with(|| format!("invalid log level {level:?}"))?;

    let console = if cli.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file_layer = match &cfg.logging.file {
        Some(path) => {
            let path = Path::new(path);
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let name = path.file_name().unwrap_or_else(|| "thermo.log".as_ref());
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(writer)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .init();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    if cli.config.exists() {
        let text = std::fs::read_to_string(&cli.config)
            .wrap_err_with(|| format!("read config {:?}", cli.config))?;
        let cfg = therm_config::load_toml(&text)
            .map_err(|e| eyre::eyre!("parse config {:?}: {e}", cli.config))?;
        Ok(cfg)
    } else if cli.config == Path::new("etc/thermo.toml") {
        // Stock configuration when the default path is absent
        Ok(Config::default())
    } else {
        eyre::bail!("config file {:?} not found", cli.config);
    }
}

/// Check the configured polynomial against a measured reference table.
fn verify_reference(cfg: &Config, path: &Path) -> Result<()> {
    const MAX_DEVIATION_C: f64 = 2.0;

    let rows = therm_config::load_reference_csv(path)?;
    let poly = therm_core::Polynomial::from(&cfg.sensor.polynomial);

    let mut worst: f64 = 0.0;
    for row in &rows {
        let inv = poly.inverse_temperature(row.ohms.ln());
        if !(inv.is_finite() && inv > 0.0) {
            eyre::bail!(
                "polynomial produced no temperature at {} ohm",
                row.ohms
            );
        }
        let t = 1.0 / inv - therm_core::sensor::KELVIN_OFFSET;
        worst = worst.max((t - row.celsius).abs());
    }
    tracing::info!(
        rows = rows.len(),
        worst_deviation_c = worst,
        "reference table checked"
    );
    if worst > MAX_DEVIATION_C {
        eyre::bail!(
            "polynomial deviates {worst:.2} C from the reference table (limit {MAX_DEVIATION_C} C)"
        );
    }
    Ok(())
}

fn dispatch(cli: &Cli, cfg: &Config) -> Result<()> {
    if let Some(reference) = &cli.reference {
        verify_reference(cfg, reference)?;
    }
    match &cli.cmd {
        Commands::Run {
            setpoint,
            tolerance,
            max_polls,
            enable,
            ambient,
        } => run::run(
            cfg, *setpoint, *tolerance, *max_polls, *enable, *ambient, cli.json,
        ),
        Commands::SelfCheck => run::self_check(cfg, cli.json),
        Commands::ReadTemp { count, ambient } => {
            run::read_temp(cfg, *count, *ambient, cli.json)
        }
    }
}

fn main() -> ExitCode {
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error reporting: {e}");
        return ExitCode::FAILURE;
    }

    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let result = load_config(&cli)
        .and_then(|cfg| {
            cfg.validate().wrap_err("invalid configuration")?;
            init_tracing(&cli, &cfg)?;
            Ok(cfg)
        })
        .and_then(|cfg| dispatch(&cli, &cfg));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", format_error_json(&e));
            } else {
                eprintln!("{}", humanize(&e));
            }
            tracing::error!(error = ?e, "command failed");
            let code = exit_code_for_error(&e);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
