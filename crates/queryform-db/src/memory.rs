//! In-memory record store.
//!
//! [`InMemoryDatabase`] keeps one table per registered model behind an
//! `Arc<RwLock<...>>`, and hands out [`MemoryModel`] handles implementing the
//! [`Model`] trait. Relation targets are looked up by the name stored on the
//! relational field, which may be a bare model name or an `app.model` label.
//!
//! # Example
//!
//! ```
//! use queryform_db::memory::InMemoryDatabase;
//! use queryform_db::model::ModelMeta;
//! use queryform_db::fields::{FieldDef, FieldType};
//! use queryform_db::value::Value;
//!
//! let db = InMemoryDatabase::new();
//! let model = db
//!     .register(
//!         ModelMeta::new("tests", "relatedmodelfortest")
//!             .field(FieldDef::new("id", FieldType::AutoField).primary_key())
//!             .field(FieldDef::new("related_type", FieldType::IntegerField))
//!             .display_field("related_type"),
//!     )
//!     .unwrap();
//! let pk = db.insert("relatedmodelfortest", vec![("related_type", Value::from(6))]).unwrap();
//! assert_eq!(pk, Value::Int(1));
//! assert_eq!(model.records().unwrap()[0].display, "6");
//! ```

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use queryform_core::{QueryFormError, QueryFormResult};

use crate::fields::FieldDef;
use crate::model::{Model, ModelMeta, ModelRef, Record};
use crate::value::Value;

/// Storage entry for a model table.
#[derive(Debug)]
struct Table {
    meta: Arc<ModelMeta>,
    rows: Vec<Record>,
    /// Auto-incrementing ID counter.
    next_id: i64,
}

#[derive(Debug, Default)]
struct Tables {
    /// Tables keyed by label (e.g. "tests.basemodelfortest").
    by_label: HashMap<String, Table>,
    /// Bare model name to label.
    aliases: HashMap<String, String>,
}

impl Tables {
    fn resolve(&self, name: &str) -> QueryFormResult<&str> {
        let name = name.to_lowercase();
        if let Some((label, _)) = self.by_label.get_key_value(&name) {
            return Ok(label);
        }
        self.aliases
            .get(&name)
            .map(String::as_str)
            .ok_or_else(|| QueryFormError::ConfigurationError(format!("Model '{name}' is not registered")))
    }

    fn table(&self, name: &str) -> QueryFormResult<&Table> {
        let label = self.resolve(name)?;
        self.by_label
            .get(label)
            .ok_or_else(|| QueryFormError::ConfigurationError(format!("Model '{name}' is not registered")))
    }

    fn table_mut(&mut self, name: &str) -> QueryFormResult<&mut Table> {
        let label = self.resolve(name)?.to_string();
        self.by_label
            .get_mut(&label)
            .ok_or_else(|| QueryFormError::ConfigurationError(format!("Model '{name}' is not registered")))
    }
}

/// A thread-safe in-memory database of model tables.
///
/// Cloning yields another handle to the same storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryDatabase {
    /// Creates a new empty database.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> QueryFormResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| QueryFormError::DatabaseError("in-memory database lock poisoned".into()))
    }

    fn write(&self) -> QueryFormResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| QueryFormError::DatabaseError("in-memory database lock poisoned".into()))
    }

    /// Registers a model and returns its handle.
    ///
    /// Re-registering a label fails with `ConfigurationError`.
    pub fn register(&self, meta: ModelMeta) -> QueryFormResult<ModelRef> {
        let label = meta.label();
        let meta = Arc::new(meta);
        {
            let mut tables = self.write()?;
            if tables.by_label.contains_key(&label) {
                return Err(QueryFormError::ConfigurationError(format!(
                    "Model '{label}' is already registered"
                )));
            }
            tables
                .aliases
                .insert(meta.model_name.clone(), label.clone());
            tables.by_label.insert(
                label.clone(),
                Table {
                    meta: Arc::clone(&meta),
                    rows: Vec::new(),
                    next_id: 1,
                },
            );
        }
        tracing::debug!(model = %label, fields = meta.fields.len(), "registered model");
        Ok(Arc::new(MemoryModel {
            meta,
            db: self.clone(),
        }))
    }

    /// Returns the handle of a registered model, by name or label.
    pub fn model(&self, name: &str) -> QueryFormResult<ModelRef> {
        let tables = self.read()?;
        let meta = Arc::clone(&tables.table(name)?.meta);
        drop(tables);
        Ok(Arc::new(MemoryModel {
            meta,
            db: self.clone(),
        }))
    }

    /// Inserts a row and returns its primary key.
    ///
    /// A missing primary key is assigned from the table's counter. Fields not
    /// supplied are stored as `Null` (an empty list for many-to-many fields).
    pub fn insert(&self, model: &str, values: Vec<(&str, Value)>) -> QueryFormResult<Value> {
        let mut tables = self.write()?;
        let table = tables.table_mut(model)?;
        let meta = Arc::clone(&table.meta);
        let pk_name = meta.pk_name().to_string();

        let mut row: HashMap<String, Value> = HashMap::new();
        for (name, value) in values {
            if name != pk_name {
                meta.get_field(name)?;
            }
            row.insert(name.to_string(), value);
        }

        let pk = match row.remove(&pk_name) {
            Some(pk) if !pk.is_null() => {
                if let Value::Int(id) = pk {
                    table.next_id = table.next_id.max(id + 1);
                }
                pk
            }
            _ => {
                let id = table.next_id;
                table.next_id += 1;
                Value::Int(id)
            }
        };

        for field in meta.fields.iter().filter(|f| !f.primary_key) {
            row.entry(field.name.clone()).or_insert_with(|| empty_value(field));
        }

        let display = meta
            .display_field
            .as_deref()
            .and_then(|f| row.get(f))
            .map_or_else(|| pk.to_string(), ToString::to_string);

        table.rows.push(Record {
            pk: pk.clone(),
            values: row,
            display,
        });
        Ok(pk)
    }

    /// Overwrites one field of an existing row. Returns `false` if no row
    /// has the given primary key.
    pub fn update_field(
        &self,
        model: &str,
        pk: &Value,
        field: &str,
        value: Value,
    ) -> QueryFormResult<bool> {
        let mut tables = self.write()?;
        let table = tables.table_mut(model)?;
        table.meta.get_field(field)?;
        let is_display = table.meta.display_field.as_deref() == Some(field);
        let Some(row) = table.rows.iter_mut().find(|r| r.pk.loosely_equals(pk)) else {
            return Ok(false);
        };
        if is_display {
            row.display = value.to_string();
        }
        row.values.insert(field.to_string(), value);
        Ok(true)
    }

    /// Deletes every row of a model and resets its counter.
    pub fn delete_all(&self, model: &str) -> QueryFormResult<()> {
        let mut tables = self.write()?;
        let table = tables.table_mut(model)?;
        table.rows.clear();
        table.next_id = 1;
        Ok(())
    }

    /// Returns the number of rows of a model.
    pub fn count(&self, model: &str) -> QueryFormResult<usize> {
        Ok(self.read()?.table(model)?.rows.len())
    }

    fn rows(&self, model: &str) -> QueryFormResult<Vec<Record>> {
        Ok(self.read()?.table(model)?.rows.clone())
    }
}

fn empty_value(field: &FieldDef) -> Value {
    if field.is_many() {
        Value::List(Vec::new())
    } else {
        Value::Null
    }
}

/// A [`Model`] backed by an [`InMemoryDatabase`] table.
#[derive(Debug)]
pub struct MemoryModel {
    meta: Arc<ModelMeta>,
    db: InMemoryDatabase,
}

impl Model for MemoryModel {
    fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    fn related_model(&self, field: &FieldDef) -> QueryFormResult<ModelRef> {
        let target = field.related_model_name().ok_or_else(|| {
            QueryFormError::TraversalError(format!(
                "Field '{}' on {} is not a relation",
                field.name,
                self.meta.label()
            ))
        })?;
        self.db.model(target)
    }

    fn records(&self) -> QueryFormResult<Vec<Record>> {
        self.db.rows(&self.meta.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldType;

    fn setup() -> (InMemoryDatabase, ModelRef) {
        let db = InMemoryDatabase::new();
        db.register(
            ModelMeta::new("tests", "related")
                .field(FieldDef::new("id", FieldType::AutoField).primary_key())
                .field(FieldDef::new("related_type", FieldType::IntegerField))
                .display_field("related_type"),
        )
        .unwrap();
        let base = db
            .register(
                ModelMeta::new("tests", "base")
                    .field(FieldDef::new("id", FieldType::AutoField).primary_key())
                    .field(FieldDef::new("integer", FieldType::IntegerField))
                    .field(
                        FieldDef::new("fk", FieldType::ForeignKey { to: "related".into() })
                            .nullable(),
                    )
                    .field(FieldDef::new(
                        "m2m",
                        FieldType::ManyToManyField {
                            to: "tests.related".into(),
                        },
                    )),
            )
            .unwrap();
        (db, base)
    }

    #[test]
    fn test_insert_auto_increment() {
        let (db, base) = setup();
        assert_eq!(db.insert("base", vec![("integer", Value::from(1))]).unwrap(), Value::Int(1));
        assert_eq!(db.insert("base", vec![("integer", Value::from(2))]).unwrap(), Value::Int(2));
        assert_eq!(db.count("tests.base").unwrap(), 2);
        let records = base.records().unwrap();
        assert!(records[0].get("fk").is_null());
        assert_eq!(records[0].get("m2m"), &Value::List(vec![]));
    }

    #[test]
    fn test_insert_explicit_pk_advances_counter() {
        let (db, _) = setup();
        db.insert("related", vec![("id", Value::from(10)), ("related_type", Value::from(1))])
            .unwrap();
        let next = db.insert("related", vec![("related_type", Value::from(2))]).unwrap();
        assert_eq!(next, Value::Int(11));
    }

    #[test]
    fn test_insert_unknown_field_fails() {
        let (db, _) = setup();
        let err = db.insert("base", vec![("nope", Value::from(1))]).unwrap_err();
        assert_eq!(err.kind(), "field_not_found");
    }

    #[test]
    fn test_unregistered_model() {
        let db = InMemoryDatabase::new();
        assert!(db.model("ghost").is_err());
        assert!(db.insert("ghost", vec![]).is_err());
    }

    #[test]
    fn test_double_register_fails() {
        let (db, _) = setup();
        let err = db.register(ModelMeta::new("tests", "base")).err().unwrap();
        assert_eq!(err.kind(), "configuration_error");
    }

    #[test]
    fn test_display_field_and_update() {
        let (db, _) = setup();
        let related = db.model("related").unwrap();
        let pk = db.insert("related", vec![("related_type", Value::from(6))]).unwrap();
        assert_eq!(related.records().unwrap()[0].display, "6");
        assert!(db.update_field("related", &pk, "related_type", Value::from(7)).unwrap());
        assert_eq!(related.records().unwrap()[0].display, "7");
        assert!(!db.update_field("related", &Value::Int(99), "related_type", Value::from(1)).unwrap());
    }

    #[test]
    fn test_related_model_lookup() {
        let (_, base) = setup();
        let fk = base.get_field("fk").unwrap().clone();
        assert_eq!(base.related_model(&fk).unwrap().meta().label(), "tests.related");
        let m2m = base.get_field("m2m").unwrap().clone();
        assert_eq!(base.related_model(&m2m).unwrap().meta().model_name, "related");
        let integer = base.get_field("integer").unwrap().clone();
        assert_eq!(base.related_model(&integer).err().unwrap().kind(), "traversal_error");
    }

    #[test]
    fn test_aggregate_and_distinct_defaults() {
        let (db, base) = setup();
        for v in [15, 11, 12, 11] {
            db.insert("base", vec![("integer", Value::from(v))]).unwrap();
        }
        db.insert("base", vec![]).unwrap();
        assert_eq!(
            base.aggregate_min_max("integer").unwrap(),
            Some((Value::Int(11), Value::Int(15)))
        );
        assert_eq!(
            base.distinct_values("integer").unwrap(),
            vec![Value::Int(11), Value::Int(12), Value::Int(15)]
        );
        assert!(base.aggregate_min_max("missing").is_err());
    }

    #[test]
    fn test_delete_all_resets_counter() {
        let (db, base) = setup();
        db.insert("base", vec![]).unwrap();
        db.delete_all("base").unwrap();
        assert!(base.records().unwrap().is_empty());
        assert_eq!(db.insert("base", vec![]).unwrap(), Value::Int(1));
    }
}
