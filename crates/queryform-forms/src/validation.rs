//! Validation pass for bound query forms.
//!
//! Every field is cleaned independently and errors accumulate rather than
//! short-circuiting. A field that fails is recorded in `errors` and left out
//! of `cleaned_data`, so it never takes part in filtering.

use std::collections::{BTreeSet, HashMap};

use crate::fields::{clean_field_value, FormFieldDef, SubmittedValue};
use crate::form::Form;
use crate::widgets::RawInput;

/// Performs field-level validation for all fields.
///
/// For each field definition:
/// 1. Looks up the raw input the field's widget extracted
/// 2. Runs [`clean_field_value`]
/// 3. Populates `cleaned_data` with filled values, or `errors` on failure
pub fn clean_fields(
    field_defs: &[FormFieldDef],
    raw_data: &HashMap<String, RawInput>,
    cleaned_data: &mut HashMap<String, SubmittedValue>,
    errors: &mut HashMap<String, Vec<String>>,
) {
    let missing = RawInput::Missing;
    for field in field_defs {
        let raw = raw_data.get(&field.name).unwrap_or(&missing);
        match clean_field_value(field, raw) {
            Ok(Some(value)) => {
                cleaned_data.insert(field.name.clone(), value);
            }
            Ok(None) => {}
            Err(field_errors) => {
                tracing::warn!(
                    field = %field.name,
                    errors = ?field_errors,
                    "Field failed validation and is excluded from the query"
                );
                errors.insert(field.name.clone(), field_errors);
            }
        }
    }
}

/// Returns the sorted names of the cleaned values that differ from the
/// unfilled default.
pub fn changed_fields(cleaned_data: &HashMap<String, SubmittedValue>) -> BTreeSet<String> {
    cleaned_data
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, _)| name.clone())
        .collect()
}

/// Validates `form` and returns its errors as `(field_name, messages)`
/// pairs sorted by field name.
pub fn full_clean(form: &mut dyn Form) -> Result<(), Vec<(String, Vec<String>)>> {
    if form.is_valid() {
        Ok(())
    } else {
        let mut errors: Vec<(String, Vec<String>)> = form
            .errors()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        errors.sort_by(|a, b| a.0.cmp(&b.0));
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FormFieldType;
    use queryform_db::value::Value;

    fn fields() -> Vec<FormFieldDef> {
        vec![
            FormFieldDef::range("integer", None, false),
            FormFieldDef::multiple_choice(
                "boolean",
                vec![(Value::Bool(true), "Yes".into()), (Value::Bool(false), "No".into())],
            )
            .unwrap(),
            FormFieldDef::new("text", FormFieldType::Char),
        ]
    }

    #[test]
    fn test_clean_fields_valid() {
        let mut raw = HashMap::new();
        raw.insert(
            "integer".to_string(),
            RawInput::Range {
                min: "1".into(),
                max: Some("5".into()),
                allow_empty: false,
            },
        );
        raw.insert("boolean".to_string(), RawInput::Multi(vec!["true".into()]));

        let mut cleaned = HashMap::new();
        let mut errors = HashMap::new();
        clean_fields(&fields(), &raw, &mut cleaned, &mut errors);

        assert!(errors.is_empty());
        assert_eq!(cleaned.len(), 2);
        assert_eq!(
            cleaned.get("boolean"),
            Some(&SubmittedValue::Choices(vec![Value::Bool(true)]))
        );
        assert!(!cleaned.contains_key("text"));
    }

    #[test]
    fn test_clean_fields_errors_accumulate() {
        let mut raw = HashMap::new();
        raw.insert(
            "integer".to_string(),
            RawInput::Range {
                min: "9".into(),
                max: Some("1".into()),
                allow_empty: false,
            },
        );
        raw.insert("boolean".to_string(), RawInput::Multi(vec!["maybe".into()]));
        raw.insert("text".to_string(), RawInput::Single("kept".into()));

        let mut cleaned = HashMap::new();
        let mut errors = HashMap::new();
        clean_fields(&fields(), &raw, &mut cleaned, &mut errors);

        assert!(errors.contains_key("integer"));
        assert!(errors.contains_key("boolean"));
        assert_eq!(cleaned.len(), 1);
        assert!(cleaned.contains_key("text"));
    }

    #[test]
    fn test_changed_fields_sorted_and_non_empty() {
        let mut cleaned = HashMap::new();
        cleaned.insert("zeta".to_string(), SubmittedValue::Single(Value::Int(1)));
        cleaned.insert("alpha".to_string(), SubmittedValue::Choices(vec![Value::Int(1)]));
        cleaned.insert("empty".to_string(), SubmittedValue::Choices(vec![]));
        let changed: Vec<String> = changed_fields(&cleaned).into_iter().collect();
        assert_eq!(changed, ["alpha", "zeta"]);
    }

    #[test]
    fn test_full_clean_reports_sorted_errors() {
        use crate::form::BaseForm;
        use crate::querydict::QueryDict;

        let mut form = BaseForm::new(fields());
        form.bind(&QueryDict::parse("integer_0=x&integer_1=2&boolean=nope"));
        let errors = full_clean(&mut form).unwrap_err();
        let names: Vec<&str> = errors.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["boolean", "integer"]);

        let mut ok = BaseForm::new(fields());
        ok.bind(&QueryDict::new());
        assert!(full_clean(&mut ok).is_ok());
    }
}
