//! Human-readable error descriptions and structured JSON error formatting.

use teststand_core::error::BuildError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(BuildError::InvalidConfig(msg)) = err.downcast_ref::<BuildError>() {
        return format!(
            "What happened: Invalid channel configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/teststand.toml for a sample."
        );
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("hx711") && lower.contains("timeout") {
        return "What happened: HX711 did not produce data within the configured timeout.\nLikely causes: Wrong dt_pin/sck_pin, wiring/power issues, or timeout configured too low.\nHow to fix: Check the [[channel]] pin values, verify 5V/GND, and raise hardware.sensor_read_timeout_ms.".to_string();
    }

    if lower.contains("gpio") {
        return "What happened: Failed to initialize GPIO pins.\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the dt_pin/sck_pin values in the config; ensure the process has permission to access GPIO.".to_string();
    }

    if lower.contains("channel") || lower.contains("must be") || lower.contains("duplicate") {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nLikely causes: A [[channel]] table is missing or has out-of-range values.\nHow to fix: Edit the TOML config and try again."
        );
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

/// Stable exit codes: invalid config is 2, everything else 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = if err.downcast_ref::<BuildError>().is_some() {
        "InvalidConfig"
    } else {
        "Error"
    };
    json!({ "reason": reason, "message": humanize(err) }).to_string()
}
