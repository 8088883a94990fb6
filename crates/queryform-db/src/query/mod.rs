//! Query building and in-memory evaluation.
//!
//! - [`lookups`] - Q objects and lookup types for filtering
//! - [`eval`] - Path resolution through relations and predicate matching
//! - [`queryset`] - Model-bound record collections

pub mod eval;
pub mod lookups;
pub mod queryset;

pub use eval::{Evaluator, LOOKUP_SEP};
pub use lookups::{Lookup, Q};
pub use queryset::QuerySet;
