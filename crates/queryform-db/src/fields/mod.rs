//! Field definitions and types.
//!
//! This module provides the [`FieldDef`] struct and [`FieldType`] enum that
//! describe model fields. Query forms read them to decide which control,
//! predicate and rendering a field gets.

pub mod types;

pub use types::{FieldDef, FieldType};
