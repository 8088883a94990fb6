//! # queryform-engine
//!
//! Builds a query form from a model's field metadata and turns the bound
//! submission into a [`Q`](queryform_db::Q) predicate.
//!
//! Construction resolves each configured name to a field ([`introspect`]),
//! categorises it ([`classify`]) and builds a form field for it
//! ([`builder`]). At query time every changed field is turned into a
//! predicate ([`resolver`]) and the predicates are combined ([`composer`]).
//! [`printer`] renders the active selections for display. Each of the three
//! dispatch points can be overridden per field name or per field type
//! through [`Overrides`].
//!
//! ## Module Overview
//!
//! - [`introspect`] - Resolving `__` paths to terminal fields
//! - [`classify`] - Field categories and candidate choice sets
//! - [`overrides`] - Caller-supplied build, filter, print and compose strategies
//! - [`builder`] - Form field construction
//! - [`resolver`] - Per-field predicate construction
//! - [`composer`] - Combining per-field predicates
//! - [`printer`] - Human-readable rendering of selections
//! - [`query_form`] - The [`QueryForm`] engine

pub mod builder;
pub mod classify;
pub mod composer;
pub mod introspect;
pub mod overrides;
pub mod printer;
pub mod query_form;
pub mod resolver;

pub use builder::{BuildContext, BuiltField};
pub use classify::FieldCategory;
pub use introspect::ResolvedField;
pub use overrides::{Overrides, Strategy};
pub use query_form::{FormState, PrettyQuery, QueryForm, QueryFormConfig};
