//! # queryform-core
//!
//! Core types, settings, and error types for the queryform crates.
//! This crate has no dependency on the other queryform crates and provides
//! the foundation they share.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and result alias
//! - [`utils`] - Utility types (`MultiValueDict`)
//! - [`settings`] - Query form settings and global configuration
//! - [`settings_loader`] - Loading settings from TOML/JSON files and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;

// Re-export the most commonly used types at the crate root.
pub use error::{QueryFormError, QueryFormResult, ValidationError};
pub use settings::{Settings, UnknownFieldPolicy, SETTINGS};
