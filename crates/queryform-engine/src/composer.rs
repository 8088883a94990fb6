//! Combining per-field predicates.

use std::collections::BTreeMap;

use queryform_core::QueryFormResult;
use queryform_db::query::Q;

use crate::resolver::ensure_predicate;

/// ANDs the per-field predicates together, in field name order.
///
/// Returns `None` for an empty map, meaning no filtering. Every predicate is
/// checked with [`ensure_predicate`] first.
pub fn compose(filters: &BTreeMap<String, Q>) -> QueryFormResult<Option<Q>> {
    let mut composed: Option<Q> = None;
    for q in filters.values() {
        let q = ensure_predicate(q.clone())?;
        composed = Some(match composed {
            None => q,
            Some(acc) => acc & q,
        });
    }
    Ok(composed)
}
