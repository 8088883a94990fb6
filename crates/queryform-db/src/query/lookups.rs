//! Query lookups and Q objects for building filter predicates.
//!
//! This module provides the [`Lookup`] enum for field-level comparisons and
//! the [`Q`] enum for combining filters with AND, OR, and NOT operators.
//!
//! # Examples
//!
//! ```
//! use queryform_db::query::lookups::{Q, Lookup};
//! use queryform_db::value::Value;
//!
//! // integer >= 12 AND integer <= 19
//! let range = Q::filter("integer", Lookup::Gte(Value::from(12)))
//!     & Q::filter("integer", Lookup::Lte(Value::from(19)));
//!
//! // status = 1 OR status = 3
//! let either = Q::filter("status", Lookup::Exact(Value::from(1)))
//!     | Q::filter("status", Lookup::Exact(Value::from(3)));
//!
//! assert_eq!(either.to_string(), "(status__exact=1 OR status__exact=3)");
//! assert_eq!((range & either).leaf_count(), 4);
//! ```

use std::fmt;
use std::ops;

use crate::value::Value;

/// A field-level lookup operation.
///
/// Each variant corresponds to a lookup name (`exact`, `gte`,
/// `isnull`, ...).
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Exact match. `Exact(Value::Null)` behaves like `IsNull(true)`.
    Exact(Value),
    /// Case-insensitive exact match.
    IExact(Value),
    /// Substring match.
    Contains(String),
    /// Case-insensitive substring match.
    IContains(String),
    /// Membership test.
    In(Vec<Value>),
    /// Greater than.
    Gt(Value),
    /// Greater than or equal.
    Gte(Value),
    /// Less than.
    Lt(Value),
    /// Less than or equal.
    Lte(Value),
    /// Inclusive range test.
    Range(Value, Value),
    /// NULL test (`true` for IS NULL, `false` for IS NOT NULL).
    IsNull(bool),
    /// Regular expression match.
    Regex(String),
    /// Case-insensitive regular expression match.
    IRegex(String),
}

impl Lookup {
    /// Returns the lookup name, e.g. `"gte"`.
    pub const fn lookup_name(&self) -> &'static str {
        match self {
            Self::Exact(_) => "exact",
            Self::IExact(_) => "iexact",
            Self::Contains(_) => "contains",
            Self::IContains(_) => "icontains",
            Self::In(_) => "in",
            Self::Gt(_) => "gt",
            Self::Gte(_) => "gte",
            Self::Lt(_) => "lt",
            Self::Lte(_) => "lte",
            Self::Range(..) => "range",
            Self::IsNull(_) => "isnull",
            Self::Regex(_) => "regex",
            Self::IRegex(_) => "iregex",
        }
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) | Self::IExact(v) | Self::Gt(v) | Self::Gte(v) | Self::Lt(v) | Self::Lte(v) => {
                write!(f, "{}={v}", self.lookup_name())
            }
            Self::Contains(s) | Self::IContains(s) | Self::Regex(s) | Self::IRegex(s) => {
                write!(f, "{}={s}", self.lookup_name())
            }
            Self::In(vals) => write!(f, "in={}", Value::List(vals.clone())),
            Self::Range(lo, hi) => write!(f, "range=({lo}, {hi})"),
            Self::IsNull(b) => write!(f, "isnull={b}"),
        }
    }
}

/// A composable query filter.
///
/// `Q` objects can be combined using `&` (AND), `|` (OR), and `!` (NOT).
/// Field names use `__` to reach through relations.
#[derive(Debug, Clone, PartialEq)]
pub enum Q {
    /// A single field lookup.
    Filter {
        /// The field path (may use `__` notation for related fields).
        field: String,
        /// The lookup operation.
        lookup: Lookup,
    },
    /// Logical AND of multiple conditions.
    And(Vec<Q>),
    /// Logical OR of multiple conditions.
    Or(Vec<Q>),
    /// Logical negation of a condition.
    Not(Box<Q>),
}

impl Q {
    /// Creates a new filter Q object.
    pub fn filter(field: impl Into<String>, lookup: Lookup) -> Self {
        Self::Filter {
            field: field.into(),
            lookup,
        }
    }

    /// Returns `true` for an AND or OR with no children.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::And(children) | Self::Or(children) => children.is_empty(),
            _ => false,
        }
    }

    /// Counts the `Filter` leaves in this tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Filter { .. } => 1,
            Self::And(children) | Self::Or(children) => children.iter().map(Self::leaf_count).sum(),
            Self::Not(inner) => inner.leaf_count(),
        }
    }

    /// Returns the field paths referenced by this tree, in visit order.
    pub fn field_paths(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_paths(&mut out);
        out
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Filter { field, .. } => out.push(field),
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.collect_paths(out);
                }
            }
            Self::Not(inner) => inner.collect_paths(out),
        }
    }
}

impl fmt::Display for Q {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filter { field, lookup } => write!(f, "{field}__{lookup}"),
            Self::And(children) => write_joined(f, children, "AND"),
            Self::Or(children) => write_joined(f, children, "OR"),
            Self::Not(inner) => write!(f, "NOT {inner}"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, children: &[Q], op: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, " {op} ")?;
        }
        write!(f, "{child}")?;
    }
    write!(f, ")")
}

impl ops::BitAnd for Q {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            // Flatten nested ANDs
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), other) => {
                left.push(other);
                Self::And(left)
            }
            (other, Self::And(mut right)) => {
                right.insert(0, other);
                Self::And(right)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }
}

impl ops::BitOr for Q {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            // Flatten nested ORs
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), other) => {
                left.push(other);
                Self::Or(left)
            }
            (other, Self::Or(mut right)) => {
                right.insert(0, other);
                Self::Or(right)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }
}

impl ops::Not for Q {
    type Output = Self;

    fn not(self) -> Self::Output {
        // Double negation cancellation
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_filter() {
        let q = Q::filter("integer", Lookup::Exact(Value::from(15)));
        match &q {
            Q::Filter { field, lookup } => {
                assert_eq!(field, "integer");
                assert_eq!(*lookup, Lookup::Exact(Value::Int(15)));
            }
            _ => panic!("Expected Filter"),
        }
    }

    #[test]
    fn test_and_operator() {
        let q1 = Q::filter("integer", Lookup::Gte(Value::from(12)));
        let q2 = Q::filter("integer", Lookup::Lte(Value::from(19)));
        match &(q1 & q2) {
            Q::And(children) => assert_eq!(children.len(), 2),
            _ => panic!("Expected And"),
        }
    }

    #[test]
    fn test_not_and_double_negation() {
        let q = Q::filter("boolean", Lookup::Exact(Value::from(true)));
        assert!(matches!(!q.clone(), Q::Not(_)));
        assert_eq!(!!q.clone(), q);
    }

    #[test]
    fn test_and_flattening() {
        let q1 = Q::filter("a", Lookup::Exact(Value::from(1)));
        let q2 = Q::filter("b", Lookup::Exact(Value::from(2)));
        let q3 = Q::filter("c", Lookup::Exact(Value::from(3)));
        match &((q1 & q2) & q3) {
            Q::And(children) => assert_eq!(children.len(), 3),
            _ => panic!("Expected And with 3 children"),
        }
    }

    #[test]
    fn test_or_flattening() {
        let q1 = Q::filter("a", Lookup::Exact(Value::from(1)));
        let q2 = Q::filter("b", Lookup::Exact(Value::from(2)));
        let q3 = Q::filter("c", Lookup::Exact(Value::from(3)));
        match &(q1 | (q2 | q3)) {
            Q::Or(children) => assert_eq!(children.len(), 3),
            _ => panic!("Expected Or with 3 children"),
        }
    }

    #[test]
    fn test_range_or_null_keeps_and_nested() {
        let range = Q::filter("float", Lookup::Gte(Value::from(1.0)))
            & Q::filter("float", Lookup::Lte(Value::from(2.0)));
        let q = range | Q::filter("float", Lookup::IsNull(true));
        match &q {
            Q::Or(children) => {
                assert_eq!(children.len(), 2);
                assert!(matches!(&children[0], Q::And(_)));
            }
            _ => panic!("Expected Or"),
        }
    }

    #[test]
    fn test_q_is_empty() {
        assert!(Q::And(vec![]).is_empty());
        assert!(Q::Or(vec![]).is_empty());
        assert!(!Q::filter("x", Lookup::Exact(Value::from(1))).is_empty());
    }

    #[test]
    fn test_leaf_count_and_paths() {
        let q = (Q::filter("a", Lookup::IsNull(true)) | Q::filter("b__c", Lookup::In(vec![])))
            & !Q::filter("d", Lookup::Gt(Value::from(0)));
        assert_eq!(q.leaf_count(), 3);
        assert_eq!(q.field_paths(), vec!["a", "b__c", "d"]);
    }

    #[test]
    fn test_display() {
        let q = Q::filter("integer", Lookup::Gte(Value::from(12)))
            & Q::filter("integer", Lookup::Lte(Value::from(19)));
        assert_eq!(q.to_string(), "(integer__gte=12 AND integer__lte=19)");
        let n = !Q::filter("x", Lookup::IsNull(false));
        assert_eq!(n.to_string(), "NOT x__isnull=false");
    }
}
