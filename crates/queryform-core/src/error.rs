//! Core error types for queryform.
//!
//! This module provides the [`QueryFormError`] enum covering every failure a
//! query form can raise: configuration mistakes, unknown or non-traversable
//! fields, field types without a build/filter/print strategy, empty choice
//! sets, collection/model mismatches, and malformed predicates. Per-field
//! input problems use [`ValidationError`] and are recovered by the binding
//! layer rather than propagated.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Represents a validation error with optional field-level errors.
///
/// Validation errors can be either simple (a single message) or compound
/// (containing per-field error lists).
///
/// # Examples
///
/// ```
/// use queryform_core::error::ValidationError;
///
/// // Simple validation error
/// let err = ValidationError::new("Min must be less than or equal to Max", "invalid_range");
///
/// // Field-level validation errors
/// let mut field_errors = std::collections::HashMap::new();
/// field_errors.insert(
///     "integer".to_string(),
///     vec![ValidationError::new("Values in RangeField must be numeric", "invalid")],
/// );
/// let err = ValidationError::with_field_errors(field_errors);
/// ```
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The primary error message.
    pub message: String,
    /// A short code identifying the type of validation failure (e.g. "invalid").
    pub code: String,
    /// Additional parameters providing context for the error message.
    pub params: HashMap<String, String>,
    /// Per-field validation errors, keyed by field name.
    pub field_errors: HashMap<String, Vec<Self>>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: HashMap::new(),
            field_errors: HashMap::new(),
        }
    }

    /// Creates a `ValidationError` containing per-field errors.
    pub fn with_field_errors(field_errors: HashMap<String, Vec<Self>>) -> Self {
        Self {
            message: String::new(),
            code: String::new(),
            params: HashMap::new(),
            field_errors,
        }
    }

    /// Adds a parameter to this validation error.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            write!(f, "{}", self.message)?;
        } else if !self.field_errors.is_empty() {
            let mut fields: Vec<_> = self.field_errors.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            let mut first = true;
            for (field, errors) in fields {
                for error in errors {
                    if !first {
                        write!(f, "; ")?;
                    }
                    write!(f, "{field}: {error}")?;
                    first = false;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The stage of the dispatch pipeline that failed to find a strategy.
///
/// Used to build [`QueryFormError::UnsupportedField`] messages that point the
/// caller at the override they need to register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Form field construction.
    Build,
    /// Predicate construction.
    Filter,
    /// Human-readable rendering.
    Print,
}

impl Stage {
    /// Returns the lower-case stage name used in override keys and messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Filter => "filter",
            Self::Print => "print",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The primary error type for queryform.
#[derive(Error, Debug)]
pub enum QueryFormError {
    // ── Construction ─────────────────────────────────────────────────

    /// The form is improperly configured (missing model, include/traverse overlap).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A field name does not exist on the model in scope.
    #[error("Field does not exist: {0}")]
    FieldNotFound(String),

    /// A relation path names a field that cannot be traversed.
    #[error("Traversal error: {0}")]
    TraversalError(String),

    /// No build, filter, or print strategy resolves for a field.
    #[error("Unsupported field: {0}")]
    UnsupportedField(String),

    /// A multiple-choice field would be built with zero options.
    #[error("Empty choices: {0}")]
    EmptyChoices(String),

    // ── Query time ───────────────────────────────────────────────────

    /// A collection of records does not belong to the form's model.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// A filter strategy produced something that is not a usable predicate.
    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),

    /// A caller-supplied argument is out of range (e.g. unknown print subset).
    #[error("Value error: {0}")]
    ValueError(String),

    /// An operation was called in the wrong form state (e.g. before binding).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    // ── Validation ───────────────────────────────────────────────────

    /// One or more fields failed validation.
    #[error("Validation error: {0}")]
    ValidationError(ValidationError),

    // ── Collaborators ────────────────────────────────────────────────

    /// The backing record store failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl QueryFormError {
    /// Builds an [`UnsupportedField`](Self::UnsupportedField) error naming the
    /// field, its type, and the override keys that would resolve it.
    ///
    /// ```
    /// use queryform_core::error::{QueryFormError, Stage};
    ///
    /// let err = QueryFormError::unsupported_field("text", "TextField", Stage::Build);
    /// let msg = err.to_string();
    /// assert!(msg.contains("text"));
    /// assert!(msg.contains("textfield"));
    /// ```
    pub fn unsupported_field(field: &str, type_name: &str, stage: Stage) -> Self {
        let field = field.to_lowercase();
        let type_name = type_name.to_lowercase();
        Self::UnsupportedField(format!(
            "Field {field} of type {type_name} has no default {stage} strategy. \
             Register a {stage} override for the type \"{type_name}\" or for the \
             field \"{field}\" specifically"
        ))
    }

    /// Returns a stable snake_case tag for this error, suitable for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ConfigurationError(_) => "configuration_error",
            Self::FieldNotFound(_) => "field_not_found",
            Self::TraversalError(_) => "traversal_error",
            Self::UnsupportedField(_) => "unsupported_field",
            Self::EmptyChoices(_) => "empty_choices",
            Self::TypeMismatch(_) => "type_mismatch",
            Self::InvalidPredicate(_) => "invalid_predicate",
            Self::ValueError(_) => "value_error",
            Self::InvalidState(_) => "invalid_state",
            Self::ValidationError(_) => "validation_error",
            Self::DatabaseError(_) => "database_error",
            Self::SerializationError(_) => "serialization_error",
            Self::IoError(_) => "io_error",
        }
    }
}

impl From<ValidationError> for QueryFormError {
    fn from(err: ValidationError) -> Self {
        Self::ValidationError(err)
    }
}

/// A convenience type alias for `Result<T, QueryFormError>`.
pub type QueryFormResult<T> = Result<T, QueryFormError>;
