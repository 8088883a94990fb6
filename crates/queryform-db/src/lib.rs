//! # queryform-db
//!
//! The data collaborators query forms run against: the [`Model`](model::Model)
//! trait and [`ModelMeta`](model::ModelMeta), field definitions, the
//! backend-agnostic [`Value`](value::Value), composable [`Q`](query::Q)
//! predicates, and an in-memory [`QuerySet`](query::QuerySet) that evaluates
//! them, including `__` paths through relations.
//!
//! ## Module Overview
//!
//! - [`model`] - The [`Model`](model::Model) trait, [`ModelMeta`](model::ModelMeta), and [`Record`](model::Record)
//! - [`fields`] - Field definitions ([`FieldDef`](fields::FieldDef)) and types
//! - [`value`] - The backend-agnostic [`Value`](value::Value) enum
//! - [`query`] - Lookups, Q objects, evaluation, and querysets
//! - [`memory`] - A thread-safe in-memory database implementing [`Model`](model::Model)

// - doc_markdown: backtick requirements for documentation items are too strict
// - return_self_not_must_use: builder pattern methods are self-documenting
// - missing_const_for_fn: several accessors may grow non-const bodies
#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_const_for_fn)]

pub mod fields;
pub mod memory;
pub mod model;
pub mod query;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use fields::{FieldDef, FieldType};
pub use memory::{InMemoryDatabase, MemoryModel};
pub use model::{Model, ModelMeta, ModelRef, Record};
pub use query::{Lookup, QuerySet, Q, LOOKUP_SEP};
pub use value::Value;
