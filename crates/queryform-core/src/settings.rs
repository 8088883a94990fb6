//! Settings for query form construction.
//!
//! This module provides the [`Settings`] struct, which holds every knob the
//! query form engine reads, and [`LazySettings`], a globally-accessible,
//! lazily-initialized settings instance.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{QueryFormError, QueryFormResult};

/// What to do with an included field name that exists on no model in scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFieldPolicy {
    /// Skip the name silently (logged at debug level).
    #[default]
    Skip,
    /// Fail construction with `FieldNotFound`.
    Reject,
}

impl fmt::Display for UnknownFieldPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => f.write_str("skip"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

impl FromStr for UnknownFieldPolicy {
    type Err = QueryFormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "reject" => Ok(Self::Reject),
            other => Err(QueryFormError::ConfigurationError(format!(
                "Unknown field policy must be 'skip' or 'reject', got '{other}'"
            ))),
        }
    }
}

/// The complete set of query form settings.
///
/// # Examples
///
/// ```
/// use queryform_core::settings::{Settings, UnknownFieldPolicy};
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.unknown_fields, UnknownFieldPolicy::Skip);
/// assert_eq!(settings.max_traversal_depth, 8);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled. Selects pretty log output.
    pub debug: bool,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level (e.g. "info", "debug", "warn").
    pub log_level: String,

    // ── Construction ─────────────────────────────────────────────────

    /// Handling of included field names that resolve on no model.
    pub unknown_fields: UnknownFieldPolicy,
    /// Maximum number of relation hops in a dotted field path.
    pub max_traversal_depth: usize,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            unknown_fields: UnknownFieldPolicy::Skip,
            max_traversal_depth: 8,
            extra: HashMap::new(),
        }
    }
}

/// A lazily-initialized, globally-accessible settings container.
///
/// Call [`configure`](LazySettings::configure) once at startup; forms fall
/// back to [`Settings::default`] through
/// [`get_or_default`](LazySettings::get_or_default) when nothing was configured.
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates a new, unconfigured `LazySettings`.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Configures the global settings. Succeeds only the first time.
    pub fn configure(&self, settings: Settings) -> QueryFormResult<()> {
        self.inner.set(settings).map_err(|_| {
            QueryFormError::ConfigurationError("Settings have already been configured".into())
        })
    }

    /// Returns the configured settings, if any.
    pub fn get(&self) -> Option<&Settings> {
        self.inner.get()
    }

    /// Returns a copy of the configured settings, or the defaults.
    pub fn get_or_default(&self) -> Settings {
        self.inner.get().cloned().unwrap_or_default()
    }

    /// Returns `true` if settings have been configured.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
pub static SETTINGS: LazySettings = LazySettings::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(s.debug);
        assert_eq!(s.log_level, "info");
        assert_eq!(s.unknown_fields, UnknownFieldPolicy::Skip);
        assert_eq!(s.max_traversal_depth, 8);
        assert!(s.extra.is_empty());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "reject".parse::<UnknownFieldPolicy>().unwrap(),
            UnknownFieldPolicy::Reject
        );
        assert_eq!(
            " Skip ".parse::<UnknownFieldPolicy>().unwrap(),
            UnknownFieldPolicy::Skip
        );
        assert!("explode".parse::<UnknownFieldPolicy>().is_err());
    }

    #[test]
    fn test_policy_serde_lowercase() {
        let json = serde_json::to_string(&UnknownFieldPolicy::Reject).unwrap();
        assert_eq!(json, "\"reject\"");
        let back: UnknownFieldPolicy = serde_json::from_str("\"skip\"").unwrap();
        assert_eq!(back, UnknownFieldPolicy::Skip);
    }

    #[test]
    fn test_lazy_settings_configure_and_get() {
        let lazy = LazySettings::new();
        assert!(!lazy.is_configured());
        assert!(lazy.get().is_none());

        let settings = Settings {
            debug: false,
            unknown_fields: UnknownFieldPolicy::Reject,
            ..Settings::default()
        };

        lazy.configure(settings).unwrap();
        assert!(lazy.is_configured());
        assert!(!lazy.get().unwrap().debug);
        assert_eq!(lazy.get_or_default().unknown_fields, UnknownFieldPolicy::Reject);
    }

    #[test]
    fn test_lazy_settings_double_configure_fails() {
        let lazy = LazySettings::new();
        lazy.configure(Settings::default()).unwrap();
        let err = lazy.configure(Settings::default()).unwrap_err();
        assert!(err.to_string().contains("already been configured"));
    }

    #[test]
    fn test_lazy_settings_get_or_default_unconfigured() {
        let lazy = LazySettings::new();
        let s = lazy.get_or_default();
        assert_eq!(s.max_traversal_depth, 8);
    }
}
