//! Field categories and candidate choice sets.
//!
//! [`classify`] maps a field's declared type onto the handful of categories
//! the builder has defaults for. The `*_choices` helpers synthesize the
//! `(value, label)` pairs a multiple-choice control offers.

use std::fmt;

use queryform_core::{QueryFormError, QueryFormResult};
use queryform_db::fields::{FieldDef, FieldType};
use queryform_db::model::ModelRef;
use queryform_db::query::QuerySet;
use queryform_db::value::Value;

/// The category a model field falls into for default form construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldCategory {
    /// Integer, float and decimal fields, including auto primary keys.
    Numeric,
    /// Boolean and nullable boolean fields.
    BooleanLike,
    /// Single or multi-valued references to another model.
    Relational,
    /// Anything without a default (text, dates, uuids).
    Other,
}

impl fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Numeric => "numeric",
            Self::BooleanLike => "boolean_like",
            Self::Relational => "relational",
            Self::Other => "other",
        })
    }
}

/// Categorises a field by its declared type.
pub const fn classify(field: &FieldDef) -> FieldCategory {
    match field.field_type {
        FieldType::AutoField
        | FieldType::BigAutoField
        | FieldType::IntegerField
        | FieldType::BigIntegerField
        | FieldType::SmallIntegerField
        | FieldType::PositiveIntegerField
        | FieldType::PositiveSmallIntegerField
        | FieldType::FloatField
        | FieldType::DecimalField { .. } => FieldCategory::Numeric,
        FieldType::BooleanField | FieldType::NullBooleanField => FieldCategory::BooleanLike,
        FieldType::ForeignKey { .. }
        | FieldType::OneToOneField { .. }
        | FieldType::ManyToManyField { .. } => FieldCategory::Relational,
        FieldType::CharField
        | FieldType::TextField
        | FieldType::DateField
        | FieldType::DateTimeField
        | FieldType::UuidField => FieldCategory::Other,
    }
}

/// Returns the choice set a multiple-choice control for `field` offers.
///
/// A non-empty static choice list wins. Otherwise boolean-like fields get Yes/No (+ Unknown
/// when nullable) and relational fields get one choice per related record
/// on `owner`'s relation target. Returns `None` for every other field.
pub fn choice_set(
    field: &FieldDef,
    owner: &ModelRef,
) -> QueryFormResult<Option<Vec<(Value, String)>>> {
    if let Some(choices) = field.choices.as_ref().filter(|c| !c.is_empty()) {
        return Ok(Some(choices.clone()));
    }
    match classify(field) {
        FieldCategory::BooleanLike => Ok(Some(boolean_choices(field))),
        FieldCategory::Relational => related_choices(field, owner).map(Some),
        FieldCategory::Numeric | FieldCategory::Other => Ok(None),
    }
}

/// Yes / No choices, plus Unknown for fields that admit NULL.
pub fn boolean_choices(field: &FieldDef) -> Vec<(Value, String)> {
    let mut choices = vec![
        (Value::Bool(true), "Yes".to_string()),
        (Value::Bool(false), "No".to_string()),
    ];
    if field.null || matches!(field.field_type, FieldType::NullBooleanField) {
        choices.push((Value::Null, "Unknown".to_string()));
    }
    choices
}

/// `(pk, display)` for every record of the model `field` points at.
///
/// Every related record is listed; there is no pagination.
pub fn related_choices(field: &FieldDef, owner: &ModelRef) -> QueryFormResult<Vec<(Value, String)>> {
    if !field.is_relation() {
        return Err(QueryFormError::TraversalError(format!(
            "Field {} on {} is not a relation",
            field.name,
            owner.meta().label()
        )));
    }
    let target = owner.related_model(field)?;
    Ok(target
        .records()?
        .into_iter()
        .map(|record| (record.pk, record.display))
        .collect())
}

/// `(v, v)` pairs for the distinct stored values reachable along `path`
/// from `model`, ascending.
pub fn choices_from_distinct(model: &ModelRef, path: &str) -> QueryFormResult<Vec<(Value, String)>> {
    let values = QuerySet::all(model)?.distinct_values(path)?;
    Ok(values
        .into_iter()
        .map(|v| {
            let label = v.to_string();
            (v, label)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use queryform_test::fixtures::{base_schema, populated};

    #[test]
    fn test_classify_categories() {
        let schema = base_schema().unwrap();
        let meta = schema.base.meta();
        let category = |name: &str| classify(meta.get_field(name).unwrap());
        assert_eq!(category("id"), FieldCategory::Numeric);
        assert_eq!(category("integer"), FieldCategory::Numeric);
        assert_eq!(category("float"), FieldCategory::Numeric);
        assert_eq!(category("boolean"), FieldCategory::BooleanLike);
        assert_eq!(category("null_boolean"), FieldCategory::BooleanLike);
        assert_eq!(category("many_related"), FieldCategory::Relational);
        assert_eq!(category("text"), FieldCategory::Other);
        assert_eq!(FieldCategory::BooleanLike.to_string(), "boolean_like");
    }

    #[test]
    fn test_decimal_is_numeric() {
        let field = FieldDef::new(
            "price",
            FieldType::DecimalField {
                max_digits: 8,
                decimal_places: 2,
            },
        );
        assert_eq!(classify(&field), FieldCategory::Numeric);
    }

    #[test]
    fn test_boolean_choices() {
        let plain = FieldDef::new("boolean", FieldType::BooleanField);
        assert_eq!(boolean_choices(&plain).len(), 2);

        let nullable = FieldDef::new("null_boolean", FieldType::NullBooleanField);
        let choices = boolean_choices(&nullable);
        assert_eq!(choices[2], (Value::Null, "Unknown".to_string()));
    }

    #[test]
    fn test_static_choices_win() {
        let schema = base_schema().unwrap();
        let field = schema.base.get_field("integer_with_choices").unwrap();
        let choices = choice_set(field, &schema.base).unwrap().unwrap();
        assert_eq!(choices[0], (Value::Int(1), "a".to_string()));
        let integer = schema.base.get_field("integer").unwrap();
        assert!(choice_set(integer, &schema.base).unwrap().is_none());
    }

    #[test]
    fn test_empty_static_choices_are_ignored() {
        let schema = base_schema().unwrap();
        let field = FieldDef::new("age", FieldType::IntegerField).choices(Vec::<(i64, &str)>::new());
        assert!(choice_set(&field, &schema.base).unwrap().is_none());

        let flag = FieldDef::new("flag", FieldType::BooleanField).choices(Vec::<(bool, &str)>::new());
        assert_eq!(choice_set(&flag, &schema.base).unwrap().unwrap().len(), 2);
    }

    #[test]
    fn test_related_choices() {
        let schema = populated().unwrap();
        let field = schema.base.get_field("foreign_related").unwrap();
        let choices = related_choices(field, &schema.base).unwrap();
        assert_eq!(
            choices,
            [
                (Value::Int(1), "1".to_string()),
                (Value::Int(2), "2".to_string()),
                (Value::Int(3), "6".to_string()),
                (Value::Int(4), "2".to_string()),
            ]
        );

        let integer = schema.base.get_field("integer").unwrap();
        let err = related_choices(integer, &schema.base).unwrap_err();
        assert_eq!(err.kind(), "traversal_error");
    }

    #[test]
    fn test_choices_from_distinct() {
        let schema = populated().unwrap();
        let choices = choices_from_distinct(&schema.base, "integer").unwrap();
        let labels: Vec<&str> = choices.iter().map(|(_, l)| l.as_str()).collect();
        assert_eq!(labels, ["11", "12", "15", "19"]);

        let related = choices_from_distinct(&schema.related, "related_type").unwrap();
        assert_eq!(related.len(), 3);
    }
}
