//! Model trait and metadata.
//!
//! The [`Model`] trait is the collaborator interface query forms consume: it
//! exposes field metadata, relation targets, and the stored records. It is
//! object-safe and shared as a [`ModelRef`] so that relation traversal can
//! hand out target models at runtime.
//!
//! [`ModelMeta`] captures the model-level options that
//! matter here: app label, model name, verbose names, and fields.

use std::collections::HashMap;
use std::sync::Arc;

use queryform_core::{QueryFormError, QueryFormResult};

use crate::fields::FieldDef;
use crate::value::Value;

/// A shared, dynamically-typed model handle.
pub type ModelRef = Arc<dyn Model>;

/// Metadata about a model.
///
/// # Examples
///
/// ```
/// use queryform_db::model::ModelMeta;
/// use queryform_db::fields::{FieldDef, FieldType};
///
/// let meta = ModelMeta::new("tests", "relatedmodelfortest")
///     .field(FieldDef::new("id", FieldType::AutoField).primary_key())
///     .field(FieldDef::new("related_type", FieldType::IntegerField))
///     .display_field("related_type");
///
/// assert_eq!(meta.label(), "tests.relatedmodelfortest");
/// assert_eq!(meta.pk_name(), "id");
/// assert!(meta.get_field("related_type").is_ok());
/// assert!(meta.get_field("missing").is_err());
/// ```
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ModelMeta {
    /// The application label (e.g., "tests").
    pub app_label: String,
    /// The model name in lowercase (e.g., "basemodelfortest").
    pub model_name: String,
    /// Human-readable singular name.
    pub verbose_name: String,
    /// Human-readable plural name.
    pub verbose_name_plural: String,
    /// Field definitions for this model.
    pub fields: Vec<FieldDef>,
    /// The field whose value is a record's display string. Falls back to the
    /// primary key when unset.
    pub display_field: Option<String>,
}

impl ModelMeta {
    /// Creates metadata with no fields.
    pub fn new(app_label: impl Into<String>, model_name: impl Into<String>) -> Self {
        let model_name = model_name.into().to_lowercase();
        Self {
            app_label: app_label.into(),
            verbose_name: model_name.clone(),
            verbose_name_plural: format!("{model_name}s"),
            model_name,
            fields: Vec::new(),
            display_field: None,
        }
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Sets the display field.
    #[must_use]
    pub fn display_field(mut self, name: impl Into<String>) -> Self {
        self.display_field = Some(name.into());
        self
    }

    /// Returns `"app_label.model_name"`.
    pub fn label(&self) -> String {
        format!("{}.{}", self.app_label, self.model_name)
    }

    /// Looks up a field by name.
    pub fn get_field(&self, name: &str) -> QueryFormResult<&FieldDef> {
        self.fields.iter().find(|f| f.name == name).ok_or_else(|| {
            QueryFormError::FieldNotFound(format!("{} has no field named '{name}'", self.label()))
        })
    }

    /// Returns the primary key field, if one is declared.
    pub fn pk_field(&self) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.primary_key)
    }

    /// Returns the primary key field name, defaulting to `"id"`.
    pub fn pk_name(&self) -> &str {
        self.pk_field().map_or("id", |f| f.name.as_str())
    }
}

/// One stored record: primary key, field values, and display string.
///
/// Relational fields hold the target primary key (`ForeignKey`,
/// `OneToOneField`) or a `Value::List` of keys (`ManyToManyField`).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Record {
    /// The primary key.
    pub pk: Value,
    /// Field values keyed by field name.
    pub values: HashMap<String, Value>,
    /// The record's display string (its `__str__`).
    pub display: String,
}

impl Record {
    /// Creates a record whose display string is the primary key.
    pub fn new(pk: impl Into<Value>) -> Self {
        let pk = pk.into();
        Self {
            display: pk.to_string(),
            pk,
            values: HashMap::new(),
        }
    }

    /// Sets a field value.
    #[must_use]
    pub fn with_value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(field.into(), value.into());
        self
    }

    /// Sets the display string.
    #[must_use]
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = display.into();
        self
    }

    /// Returns a field value; missing fields read as `Null`.
    pub fn get(&self, field: &str) -> &Value {
        const NULL: &Value = &Value::Null;
        self.values.get(field).unwrap_or(NULL)
    }
}

/// The collaborator interface for a queryable model.
///
/// Implementors supply metadata, relation targets, and records; aggregate and
/// distinct-value helpers have defaults computed from [`records`](Model::records).
pub trait Model: Send + Sync {
    /// Returns the metadata for this model.
    fn meta(&self) -> &ModelMeta;

    /// Looks up a field descriptor by name.
    fn get_field(&self, name: &str) -> QueryFormResult<&FieldDef> {
        self.meta().get_field(name)
    }

    /// Returns the model a relational field points at.
    ///
    /// Fails with `TraversalError` for non-relational fields.
    fn related_model(&self, field: &FieldDef) -> QueryFormResult<ModelRef>;

    /// Returns every stored record.
    fn records(&self) -> QueryFormResult<Vec<Record>>;

    /// Returns `(min, max)` over the non-null values of a local field, or
    /// `None` when there are none.
    fn aggregate_min_max(&self, field: &str) -> QueryFormResult<Option<(Value, Value)>> {
        self.get_field(field)?;
        let records = self.records()?;
        Ok(min_max(records.iter().map(|r| r.get(field))))
    }

    /// Returns the distinct non-null values of a local field, ascending.
    fn distinct_values(&self, field: &str) -> QueryFormResult<Vec<Value>> {
        self.get_field(field)?;
        let records = self.records()?;
        Ok(distinct_sorted(records.iter().map(|r| r.get(field))))
    }
}

/// Computes `(min, max)` over the ordered, non-null scalars of `values`.
pub fn min_max<'a>(values: impl IntoIterator<Item = &'a Value>) -> Option<(Value, Value)> {
    let mut bounds: Option<(&Value, &Value)> = None;
    for v in values.into_iter().flat_map(Value::scalars) {
        if v.is_null() {
            continue;
        }
        bounds = Some(match bounds {
            None => (v, v),
            Some((lo, hi)) => (
                if v < lo { v } else { lo },
                if v > hi { v } else { hi },
            ),
        });
    }
    bounds.map(|(lo, hi)| (lo.clone(), hi.clone()))
}

/// Collects the distinct non-null scalars of `values`, ascending.
///
/// Unordered pairs keep their first-seen relative order.
pub fn distinct_sorted<'a>(values: impl IntoIterator<Item = &'a Value>) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::new();
    for v in values.into_iter().flat_map(Value::scalars) {
        if !v.is_null() && !out.iter().any(|seen| seen.loosely_equals(v)) {
            out.push(v.clone());
        }
    }
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldType;

    #[test]
    fn test_meta_label_lowercases_model_name() {
        let meta = ModelMeta::new("tests", "BaseModelForTest");
        assert_eq!(meta.model_name, "basemodelfortest");
        assert_eq!(meta.label(), "tests.basemodelfortest");
        assert_eq!(meta.verbose_name_plural, "basemodelfortests");
    }

    #[test]
    fn test_meta_get_field_error() {
        let meta = ModelMeta::new("tests", "m").field(FieldDef::new("a", FieldType::IntegerField));
        let err = meta.get_field("b").unwrap_err();
        assert_eq!(err.kind(), "field_not_found");
        assert!(err.to_string().contains("'b'"));
    }

    #[test]
    fn test_pk_name_default() {
        let meta = ModelMeta::new("tests", "m");
        assert_eq!(meta.pk_name(), "id");
        let meta = meta.field(FieldDef::new("code", FieldType::CharField).primary_key());
        assert_eq!(meta.pk_name(), "code");
    }

    #[test]
    fn test_record_get_missing_is_null() {
        let r = Record::new(1).with_value("integer", 15);
        assert_eq!(r.get("integer"), &Value::Int(15));
        assert!(r.get("float").is_null());
        assert_eq!(r.display, "1");
    }

    #[test]
    fn test_min_max_skips_nulls() {
        let values = [Value::Int(15), Value::Null, Value::Int(11), Value::Int(19)];
        assert_eq!(min_max(&values), Some((Value::Int(11), Value::Int(19))));
        assert_eq!(min_max(&[Value::Null]), None);
    }

    #[test]
    fn test_min_max_mixed_numeric() {
        let values = [Value::Float(12.6), Value::Float(0.11), Value::Int(9), Value::Int(16)];
        assert_eq!(min_max(&values), Some((Value::Float(0.11), Value::Int(16))));
    }

    #[test]
    fn test_distinct_sorted() {
        let values = [
            Value::Int(2),
            Value::Int(1),
            Value::Null,
            Value::Int(2),
            Value::List(vec![Value::Int(3), Value::Int(1)]),
        ];
        assert_eq!(
            distinct_sorted(&values),
            vec![Value::Int(1), Value::Int(2), Value::Int(3)]
        );
    }
}
