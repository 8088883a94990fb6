//! Model-bound record collections.
//!
//! A [`QuerySet`] pairs a [`ModelRef`] with a snapshot of that model's
//! records. Filtering is evaluated in memory and returns a new `QuerySet`,
//! so calls chain.
//!
//! # Examples
//!
//! ```
//! use queryform_db::memory::InMemoryDatabase;
//! use queryform_db::model::ModelMeta;
//! use queryform_db::fields::{FieldDef, FieldType};
//! use queryform_db::query::{Lookup, Q, QuerySet};
//! use queryform_db::value::Value;
//!
//! let db = InMemoryDatabase::new();
//! let model = db
//!     .register(
//!         ModelMeta::new("tests", "person")
//!             .field(FieldDef::new("id", FieldType::AutoField).primary_key())
//!             .field(FieldDef::new("age", FieldType::IntegerField)),
//!     )
//!     .unwrap();
//! for age in [11, 12, 15, 19] {
//!     db.insert("person", vec![("age", Value::from(age))]).unwrap();
//! }
//!
//! let adults = QuerySet::all(&model)
//!     .unwrap()
//!     .filter(&Q::filter("age", Lookup::Gte(Value::from(12))))
//!     .unwrap();
//! assert_eq!(adults.len(), 3);
//! ```

use std::fmt;

use queryform_core::QueryFormResult;

use super::eval::Evaluator;
use super::lookups::Q;
use crate::model::{distinct_sorted, min_max, ModelRef, Record};
use crate::value::Value;

/// A model-bound collection of records.
#[derive(Clone)]
pub struct QuerySet {
    model: ModelRef,
    records: Vec<Record>,
}

impl fmt::Debug for QuerySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySet")
            .field("model", &self.model.meta().label())
            .field("pks", &self.pks())
            .finish()
    }
}

impl QuerySet {
    /// Returns every record of `model`.
    pub fn all(model: &ModelRef) -> QueryFormResult<Self> {
        Ok(Self {
            model: ModelRef::clone(model),
            records: model.records()?,
        })
    }

    /// Returns an empty collection bound to `model`.
    pub fn none(model: &ModelRef) -> Self {
        Self {
            model: ModelRef::clone(model),
            records: Vec::new(),
        }
    }

    /// Wraps records already known to belong to `model`.
    pub fn from_records(model: &ModelRef, records: Vec<Record>) -> Self {
        Self {
            model: ModelRef::clone(model),
            records,
        }
    }

    /// Returns the model this collection is bound to.
    pub const fn model(&self) -> &ModelRef {
        &self.model
    }

    /// Returns the records that satisfy `q`.
    pub fn filter(&self, q: &Q) -> QueryFormResult<Self> {
        self.retain(q, true)
    }

    /// Returns the records that do not satisfy `q`.
    pub fn exclude(&self, q: &Q) -> QueryFormResult<Self> {
        self.retain(q, false)
    }

    fn retain(&self, q: &Q, keep_matches: bool) -> QueryFormResult<Self> {
        let mut evaluator = Evaluator::new(ModelRef::clone(&self.model));
        let mut records = Vec::with_capacity(self.records.len());
        for record in &self.records {
            if evaluator.matches(q, record)? == keep_matches {
                records.push(record.clone());
            }
        }
        Ok(Self {
            model: ModelRef::clone(&self.model),
            records,
        })
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the first record, if any.
    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    /// Iterates over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Returns the records as a slice.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns the primary keys, in collection order.
    pub fn pks(&self) -> Vec<Value> {
        self.records.iter().map(|r| r.pk.clone()).collect()
    }

    /// Returns every value reachable from `record` along a `__` path.
    pub fn values_for(&self, record: &Record, path: &str) -> QueryFormResult<Vec<Value>> {
        Evaluator::new(ModelRef::clone(&self.model)).values_for(record, path)
    }

    fn path_values(&self, path: &str) -> QueryFormResult<Vec<Value>> {
        let mut evaluator = Evaluator::new(ModelRef::clone(&self.model));
        let mut out = Vec::new();
        for record in &self.records {
            out.extend(evaluator.values_for(record, path)?);
        }
        Ok(out)
    }

    /// Returns `(min, max)` over the non-null values reachable along `path`.
    pub fn aggregate_min_max(&self, path: &str) -> QueryFormResult<Option<(Value, Value)>> {
        Ok(min_max(&self.path_values(path)?))
    }

    /// Returns the distinct non-null values reachable along `path`, ascending.
    pub fn distinct_values(&self, path: &str) -> QueryFormResult<Vec<Value>> {
        Ok(distinct_sorted(&self.path_values(path)?))
    }
}

impl<'a> IntoIterator for &'a QuerySet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
