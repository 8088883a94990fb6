//! # queryform-test
//!
//! Testing utilities for the queryform crates: the two-model test schema
//! with its fixture rows, and assertion helpers for querysets and bound
//! forms.
//!
//! ## Modules
//!
//! - [`fixtures`] - The base/related test schema and its rows
//! - [`assertions`] - Assertion helpers for querysets and bound forms

pub mod assertions;
pub mod fixtures;

pub use assertions::{assert_changed, assert_field_error, assert_pks};
pub use fixtures::{base_schema, populate, populated, TestSchema};
