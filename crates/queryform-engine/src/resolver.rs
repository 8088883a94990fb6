//! Per-field predicate construction.
//!
//! A changed field's submitted value becomes a [`Q`] through, in order, a
//! filter override for its name, one for its declared type, or the default
//! for its widget kind. Whatever branch produced it, the predicate is
//! checked with [`ensure_predicate`] before it is used.

use queryform_core::error::Stage;
use queryform_core::{QueryFormError, QueryFormResult};
use queryform_db::query::{Lookup, Q};
use queryform_db::value::Value;
use queryform_forms::fields::{RangeValue, SubmittedValue};

use crate::builder::BuiltField;
use crate::overrides::{Overrides, Strategy};

/// The default predicate for a range submission.
///
/// Equal bounds produce a single equality; otherwise `path >= min AND
/// path <= max`. With `allow_empty`, rows where the path is NULL match too.
///
/// ```
/// use queryform_db::query::{Lookup, Q};
/// use queryform_db::value::Value;
/// use queryform_engine::resolver::range_filter;
/// use queryform_forms::fields::RangeValue;
///
/// let q = range_filter("integer", &RangeValue {
///     min: Value::Int(12),
///     max: Value::Int(12),
///     allow_empty: false,
/// });
/// assert_eq!(q, Q::filter("integer", Lookup::Exact(Value::Int(12))));
/// ```
pub fn range_filter(path: &str, range: &RangeValue) -> Q {
    let bounded = if range.min.loosely_equals(&range.max) {
        Q::filter(path, Lookup::Exact(range.min.clone()))
    } else {
        Q::filter(path, Lookup::Gte(range.min.clone()))
            & Q::filter(path, Lookup::Lte(range.max.clone()))
    };
    if range.allow_empty {
        Q::Or(vec![bounded, Q::filter(path, Lookup::IsNull(true))])
    } else {
        bounded
    }
}

/// The default predicate for a multiple-choice submission: one equality
/// per selected value, ORed. Returns `None` for an empty selection.
pub fn multiple_choice_filter(path: &str, selected: &[Value]) -> Option<Q> {
    selected
        .iter()
        .map(|value| Q::filter(path, Lookup::Exact(value.clone())))
        .reduce(|acc, q| acc | q)
}

/// Rejects predicates that cannot filter anything: empty `And`/`Or` nodes
/// anywhere in the tree, and filters on an empty path.
pub fn ensure_predicate(q: Q) -> QueryFormResult<Q> {
    check(&q)?;
    Ok(q)
}

fn check(q: &Q) -> QueryFormResult<()> {
    match q {
        Q::Filter { field, .. } if field.is_empty() => Err(QueryFormError::InvalidPredicate(
            "Filter has an empty field path".to_string(),
        )),
        Q::Filter { .. } => Ok(()),
        Q::And(children) | Q::Or(children) if children.is_empty() => Err(
            QueryFormError::InvalidPredicate(format!("Predicate {q} has no conditions")),
        ),
        Q::And(children) | Q::Or(children) => children.iter().try_for_each(check),
        Q::Not(inner) => check(inner),
    }
}

/// Builds the predicate for one changed field.
///
/// Returns `Ok(None)` when the default multiple-choice filter sees an empty
/// selection.
pub fn resolve_filter(
    built: &BuiltField,
    value: &SubmittedValue,
    overrides: &Overrides,
) -> QueryFormResult<Option<Q>> {
    let path = built.spec.name.as_str();
    let resolved = &built.resolved;

    let (q, strategy) = if let Some((filter_fn, strategy)) =
        overrides.filter_for(path, resolved.leaf_name(), resolved.type_name())
    {
        (Some(filter_fn(path, value)?), strategy)
    } else {
        let q = match value {
            SubmittedValue::Range(range) => Some(range_filter(path, range)),
            SubmittedValue::Choices(selected) => multiple_choice_filter(path, selected),
            SubmittedValue::Single(_) => {
                return Err(QueryFormError::unsupported_field(
                    path,
                    resolved.type_name(),
                    Stage::Filter,
                ));
            }
        };
        (q, Strategy::Default)
    };

    let Some(q) = q else {
        return Ok(None);
    };
    let q = ensure_predicate(q)?;
    tracing::debug!(field = %path, strategy = %strategy, predicate = %q, "Resolved field filter");
    Ok(Some(q))
}
