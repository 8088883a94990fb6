//! The shared two-model test schema.
//!
//! `basemodelfortest` carries one field of every kind a query form builds
//! by default, plus a text field that needs an override, and three
//! relations to `relatedmodelfortest`:
//!
//! | field | type |
//! |---|---|
//! | `integer` | `IntegerField` |
//! | `integer_with_choices` | `IntegerField`, choices `1:a 2:b 3:c` |
//! | `float` | `FloatField` |
//! | `boolean` | `BooleanField` |
//! | `null_boolean` | `NullBooleanField` |
//! | `text` | `TextField` |
//! | `related_type` | `OneToOneField`, nullable |
//! | `foreign_related` | `ForeignKey`, nullable |
//! | `many_related` | `ManyToManyField` |
//!
//! Related records display as their `related_type`.

use queryform_core::QueryFormResult;
use queryform_db::fields::{FieldDef, FieldType};
use queryform_db::memory::InMemoryDatabase;
use queryform_db::model::{ModelMeta, ModelRef};
use queryform_db::value::Value;

/// Model name of the base model.
pub const BASE: &str = "basemodelfortest";

/// Model name of the related model.
pub const RELATED: &str = "relatedmodelfortest";

/// A registered test schema.
#[derive(Clone)]
pub struct TestSchema {
    /// The database holding both tables.
    pub db: InMemoryDatabase,
    /// Handle to `basemodelfortest`.
    pub base: ModelRef,
    /// Handle to `relatedmodelfortest`.
    pub related: ModelRef,
}

impl TestSchema {
    /// Points `field` of base row `base_pk` at `value`.
    pub fn relate(&self, base_pk: i64, field: &str, value: Value) -> QueryFormResult<bool> {
        self.db.update_field(BASE, &Value::Int(base_pk), field, value)
    }
}

/// Registers both test models on a fresh database, with no rows.
pub fn base_schema() -> QueryFormResult<TestSchema> {
    let db = InMemoryDatabase::new();
    let related = db.register(
        ModelMeta::new("tests", RELATED)
            .field(FieldDef::new("id", FieldType::AutoField).primary_key())
            .field(FieldDef::new("related_type", FieldType::IntegerField))
            .display_field("related_type"),
    )?;
    let to = || RELATED.to_string();
    let base = db.register(
        ModelMeta::new("tests", BASE)
            .field(FieldDef::new("id", FieldType::AutoField).primary_key())
            .field(FieldDef::new("integer", FieldType::IntegerField))
            .field(
                FieldDef::new("integer_with_choices", FieldType::IntegerField)
                    .choices([(1, "a"), (2, "b"), (3, "c")]),
            )
            .field(FieldDef::new("float", FieldType::FloatField))
            .field(FieldDef::new("boolean", FieldType::BooleanField))
            .field(FieldDef::new("null_boolean", FieldType::NullBooleanField).nullable())
            .field(FieldDef::new("text", FieldType::TextField))
            .field(FieldDef::new("related_type", FieldType::OneToOneField { to: to() }).nullable())
            .field(FieldDef::new("foreign_related", FieldType::ForeignKey { to: to() }).nullable())
            .field(FieldDef::new("many_related", FieldType::ManyToManyField { to: to() })),
    )?;
    Ok(TestSchema { db, base, related })
}

/// Inserts the fixture rows.
///
/// Related rows 1..=4 have `related_type` 1, 2, 6, 2. Base rows 1..=4 are:
///
/// | pk | integer | choices | float | boolean | null_boolean | text |
/// |---|---|---|---|---|---|---|
/// | 1 | 15 | 1 | 12.6 | true | NULL | foo |
/// | 2 | 11 | 2 | 0.11 | false | true | bar |
/// | 3 | 12 | 3 | 9 | true | false | baz |
/// | 4 | 19 | 2 | 16 | true | NULL | qux |
///
/// No base row is related to anything.
pub fn populate(db: &InMemoryDatabase) -> QueryFormResult<()> {
    for related_type in [1, 2, 6, 2] {
        db.insert(RELATED, vec![("related_type", Value::from(related_type))])?;
    }
    let rows = [
        (15, 1, 12.6, true, None, "foo"),
        (11, 2, 0.11, false, Some(true), "bar"),
        (12, 3, 9.0, true, Some(false), "baz"),
        (19, 2, 16.0, true, None, "qux"),
    ];
    for (integer, choice, float, boolean, null_boolean, text) in rows {
        db.insert(
            BASE,
            vec![
                ("integer", Value::from(integer)),
                ("integer_with_choices", Value::from(choice)),
                ("float", Value::from(float)),
                ("boolean", Value::from(boolean)),
                ("null_boolean", Value::from(null_boolean)),
                ("text", Value::from(text)),
            ],
        )?;
    }
    Ok(())
}

/// Registers the schema and inserts the fixture rows.
pub fn populated() -> QueryFormResult<TestSchema> {
    let schema = base_schema()?;
    populate(&schema.db)?;
    Ok(schema)
}
