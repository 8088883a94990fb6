//! Settings loading from configuration files.
//!
//! This module provides functions to load [`Settings`] from TOML files, JSON
//! files, and to apply environment variable overrides.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `QUERYFORM_DEBUG` | `debug` |
//! | `QUERYFORM_LOG_LEVEL` | `log_level` |
//! | `QUERYFORM_UNKNOWN_FIELDS` | `unknown_fields` (`skip` / `reject`) |
//! | `QUERYFORM_MAX_TRAVERSAL_DEPTH` | `max_traversal_depth` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use queryform_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file("config/queryform.toml").unwrap();
//! let settings = settings_loader::from_toml_file_with_env("config/queryform.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::QueryFormError;
use crate::settings::{Settings, UnknownFieldPolicy};

/// Loads settings from a TOML string.
///
/// Any fields not present in the TOML keep their default values.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, QueryFormError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| QueryFormError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;
    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, QueryFormError> {
    from_toml_str(&read_config(path.as_ref(), "TOML")?)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, QueryFormError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
pub fn from_json_str(json_str: &str) -> Result<Settings, QueryFormError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| QueryFormError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;
    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, QueryFormError> {
    from_json_str(&read_config(path.as_ref(), "JSON")?)
}

/// Loads settings from a JSON file and then applies environment variable overrides.
pub fn from_json_file_with_env(path: impl AsRef<Path>) -> Result<Settings, QueryFormError> {
    let mut settings = from_json_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies environment variable overrides to a settings struct.
///
/// Unparseable values are ignored and logged at warn level.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(val) = std::env::var("QUERYFORM_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Ok(val) = std::env::var("QUERYFORM_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Ok(val) = std::env::var("QUERYFORM_UNKNOWN_FIELDS") {
        match val.parse::<UnknownFieldPolicy>() {
            Ok(policy) => settings.unknown_fields = policy,
            Err(e) => tracing::warn!(error = %e, "ignoring QUERYFORM_UNKNOWN_FIELDS"),
        }
    }

    if let Ok(val) = std::env::var("QUERYFORM_MAX_TRAVERSAL_DEPTH") {
        if let Ok(depth) = val.parse::<usize>() {
            settings.max_traversal_depth = depth;
        } else {
            tracing::warn!(value = %val, "ignoring QUERYFORM_MAX_TRAVERSAL_DEPTH");
        }
    }
}

// ============================================================
// Helpers
// ============================================================

fn read_config(path: &Path, format: &str) -> Result<String, QueryFormError> {
    std::fs::read_to_string(path).map_err(|e| {
        QueryFormError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

fn merge_over_defaults(
    value: serde_json::Value,
    format: &str,
) -> Result<Settings, QueryFormError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        QueryFormError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        QueryFormError::ConfigurationError(format!(
            "Failed to deserialize settings from {format}: {e}"
        ))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}
