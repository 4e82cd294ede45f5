//! Human-readable error descriptions and structured JSON error formatting.

use therm_core::error::{BuildError, ControllerError, SensorError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        let BuildError::InvalidConfig(msg) = be;
        return format!(
            "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See README for a sample."
        );
    }

    if let Some(ce) = err.downcast_ref::<ControllerError>() {
        return match ce {
            ControllerError::Display(msg) => format!(
                "What happened: Display bring-up or rendering failed ({msg}).\nLikely causes: Wrong display.controller_id in the config, or a miswired panel.\nHow to fix: Check the panel ribbon and the [display] section; known controller IDs include 0x9341."
            ),
            ControllerError::Hardware(msg) => format!(
                "What happened: Relay actuation failed ({msg}).\nLikely causes: GPIO permissions or a wrong heater pin number.\nHow to fix: Check [pins].heater_pin and that the process may access GPIO."
            ),
            ControllerError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<SensorError>() {
        return match se {
            SensorError::ResistanceOutOfRange { ohms } => format!(
                "What happened: Computed thermistor resistance ({ohms} ohm) is out of range.\nLikely causes: Open or shorted thermistor wiring, or a saturated ADC reading.\nHow to fix: Check the divider wiring and [sensor].fixed_resistance_ohms."
            ),
            SensorError::NonFiniteReading => "What happened: The calibration polynomial produced a non-finite temperature.\nLikely causes: Polynomial coefficients that do not match the thermistor.\nHow to fix: Verify [sensor].polynomial against a reference table (--reference).".to_string(),
            SensorError::Analog(msg) => format!(
                "What happened: ADC read failed ({msg}).\nLikely causes: SPI wiring or a wrong channel number.\nHow to fix: Check the converter wiring and [pins].thermistor_channel."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("reference csv must have headers") {
        return "Invalid headers in reference CSV. Expected 'ohms,celsius'.".to_string();
    }

    if lower.contains("display bring-up") || lower.contains("unknown display controller") {
        return "What happened: The display did not identify itself.\nLikely causes: Wrong display.controller_id or a disconnected panel.\nHow to fix: Check the [display] section and the panel wiring.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: config problems 2, display bring-up 3, relay
/// actuation 4; anything else 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    if let Some(ce) = err.downcast_ref::<ControllerError>() {
        return match ce {
            ControllerError::Config(_) => 2,
            ControllerError::Display(_) => 3,
            ControllerError::Hardware(_) => 4,
        };
    }
    let lower = err.to_string().to_ascii_lowercase();
    if lower.contains("config") {
        return 2;
    }
    1
}

fn error_kind(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "InvalidConfig";
    }
    if let Some(ce) = err.downcast_ref::<ControllerError>() {
        return match ce {
            ControllerError::Config(_) => "InvalidConfig",
            ControllerError::Display(_) => "Display",
            ControllerError::Hardware(_) => "Hardware",
        };
    }
    if err.downcast_ref::<SensorError>().is_some() {
        return "Sensor";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": error_kind(err),
        "message": humanize(err),
    })
    .to_string()
}
