//! Form field definitions and value cleaning.
//!
//! Each [`FormFieldDef`] describes one query form control: its label, its
//! [`FormFieldType`] and the widget that reads it. Query form fields are
//! never required, since an unfilled control simply does not filter.
//!
//! [`clean_field_value`] turns the [`RawInput`] a widget extracted into a
//! typed [`SubmittedValue`], or the list of messages explaining why it could
//! not.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use queryform_core::{QueryFormError, QueryFormResult};
use queryform_db::value::Value;

use crate::widgets::{
    checkbox_checked, create_widget_with_choices, RangeWidget, RawInput, Widget, WidgetType,
};

/// Message for range bounds that are not both numbers.
pub const RANGE_NOT_NUMERIC: &str = "Values in RangeField must be numeric";

/// Message for a range whose min exceeds its max.
pub const RANGE_MIN_GT_MAX: &str = "Min must be less than or equal to Max";

/// The broad kind of control a field renders as.
///
/// Default filters and printers exist for `Range` and `MultiChoice`;
/// `Custom` fields need an override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    /// A numeric interval.
    Range,
    /// A discrete selection.
    MultiChoice,
    /// Anything built by an override.
    Custom,
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Range => "range",
            Self::MultiChoice => "multi_choice",
            Self::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// Defines the type of a form field, including type-specific parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum FormFieldType {
    /// A numeric interval over a stored field.
    Range {
        /// `(min, max)` over the stored values, or `None` if there are none.
        bounds: Option<(Value, Value)>,
        /// Whether the field is nullable, enabling the include-empty control.
        allow_null: bool,
    },
    /// A selection of any number of choices.
    MultipleChoice {
        /// Available choices as `(value, display_label)` pairs.
        choices: Vec<(Value, String)>,
    },
    /// A free text field.
    Char,
    /// An integer field.
    Integer,
    /// A floating-point field.
    Float,
    /// A boolean checkbox.
    Boolean,
    /// A yes/no/unknown select.
    NullBoolean,
    /// A date field (YYYY-MM-DD).
    Date,
}

impl FormFieldType {
    /// Returns the kind of control this type renders as.
    pub const fn kind(&self) -> WidgetKind {
        match self {
            Self::Range { .. } => WidgetKind::Range,
            Self::MultipleChoice { .. } => WidgetKind::MultiChoice,
            _ => WidgetKind::Custom,
        }
    }
}

/// Complete definition of a query form field.
#[derive(Debug, Clone, PartialEq)]
pub struct FormFieldDef {
    /// The field name (HTML name attribute), a `__` path for related fields.
    pub name: String,
    /// The field type, controlling parsing and coercion.
    pub field_type: FormFieldType,
    /// Whether a value must be submitted. Off for query forms.
    pub required: bool,
    /// Help text displayed alongside the field.
    pub help_text: String,
    /// Human-readable label. Also the key used when printing the query.
    pub label: String,
    /// The widget type used for rendering.
    pub widget: WidgetType,
}

impl FormFieldDef {
    /// Creates a new, optional `FormFieldDef` using the default widget for
    /// its type.
    pub fn new(name: impl Into<String>, field_type: FormFieldType) -> Self {
        let name = name.into();
        let widget = default_widget_for_field_type(&field_type);
        let label = pretty_name(&name);
        Self {
            name,
            field_type,
            required: false,
            help_text: String::new(),
            label,
            widget,
        }
    }

    /// Creates a range field.
    pub fn range(name: impl Into<String>, bounds: Option<(Value, Value)>, allow_null: bool) -> Self {
        Self::new(name, FormFieldType::Range { bounds, allow_null })
    }

    /// Creates a multiple choice field.
    ///
    /// Fails with `EmptyChoices` if `choices` is empty.
    pub fn multiple_choice(
        name: impl Into<String>,
        choices: Vec<(Value, String)>,
    ) -> QueryFormResult<Self> {
        let name = name.into();
        if choices.is_empty() {
            return Err(QueryFormError::EmptyChoices(format!(
                "Field {name} has no choices to select from"
            )));
        }
        Ok(Self::new(name, FormFieldType::MultipleChoice { choices }))
    }

    /// Sets whether this field is required.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the help text.
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = text.into();
        self
    }

    /// Sets the label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the widget type.
    pub fn widget(mut self, widget: WidgetType) -> Self {
        self.widget = widget;
        self
    }

    /// Returns the kind of control this field renders as.
    pub const fn kind(&self) -> WidgetKind {
        self.field_type.kind()
    }

    /// Returns the choices of a multiple choice field.
    pub fn choices(&self) -> Option<&[(Value, String)]> {
        match &self.field_type {
            FormFieldType::MultipleChoice { choices } => Some(choices),
            _ => None,
        }
    }

    /// Returns the display label of the choice whose stringified key equals
    /// the stringified `value`.
    pub fn choice_label(&self, value: &Value) -> Option<&str> {
        let key = choice_key(value);
        self.choices()?
            .iter()
            .find(|(k, _)| choice_key(k) == key)
            .map(|(_, label)| label.as_str())
    }

    /// Instantiates the widget that reads and renders this field.
    pub fn create_widget(&self) -> Box<dyn Widget> {
        match &self.field_type {
            FormFieldType::Range { bounds, allow_null } if self.widget == WidgetType::RangeWidget => {
                Box::new(RangeWidget::new(bounds.clone(), *allow_null))
            }
            FormFieldType::MultipleChoice { choices } => {
                let keyed: Vec<(String, String)> = choices
                    .iter()
                    .map(|(k, label)| (choice_key(k), label.clone()))
                    .collect();
                create_widget_with_choices(self.widget, &keyed)
            }
            FormFieldType::NullBoolean => create_widget_with_choices(
                self.widget,
                &[
                    ("unknown".to_string(), "Unknown".to_string()),
                    ("true".to_string(), "Yes".to_string()),
                    ("false".to_string(), "No".to_string()),
                ],
            ),
            _ => create_widget_with_choices(self.widget, &[]),
        }
    }
}

/// Returns the default widget type for a given form field type.
pub const fn default_widget_for_field_type(field_type: &FormFieldType) -> WidgetType {
    match field_type {
        FormFieldType::Range { .. } => WidgetType::RangeWidget,
        FormFieldType::MultipleChoice { .. } => WidgetType::SelectMultiple,
        FormFieldType::Char => WidgetType::TextInput,
        FormFieldType::Integer | FormFieldType::Float => WidgetType::NumberInput,
        FormFieldType::Boolean => WidgetType::CheckboxInput,
        FormFieldType::NullBoolean => WidgetType::Select,
        FormFieldType::Date => WidgetType::DateInput,
    }
}

/// Turns a field name into a label: underscores become spaces and the first
/// letter is capitalised.
pub fn pretty_name(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.trim().chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// The string a choice value is submitted and looked up as.
pub fn choice_key(value: &Value) -> String {
    value.to_string()
}

/// A cleaned range submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeValue {
    /// Lower bound, inclusive.
    pub min: Value,
    /// Upper bound, inclusive.
    pub max: Value,
    /// Whether rows with no value should match too.
    pub allow_empty: bool,
}

/// A cleaned, typed submission for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SubmittedValue {
    /// The bounds of a range field.
    Range(RangeValue),
    /// The selected values of a multiple choice field, in submission order.
    Choices(Vec<Value>),
    /// The value of a single-valued custom field.
    Single(Value),
}

impl SubmittedValue {
    /// Returns `true` if this value equals the unfilled default and should
    /// not filter anything.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Range(_) => false,
            Self::Choices(values) => values.is_empty(),
            Self::Single(value) => value.is_null() || value.as_str().is_some_and(str::is_empty),
        }
    }

    /// Returns the range of a range submission.
    pub const fn as_range(&self) -> Option<&RangeValue> {
        match self {
            Self::Range(range) => Some(range),
            _ => None,
        }
    }

    /// Returns the selection of a multiple choice submission.
    pub fn as_choices(&self) -> Option<&[Value]> {
        match self {
            Self::Choices(values) => Some(values),
            _ => None,
        }
    }
}

/// Cleans the raw input of one field.
///
/// Returns `Ok(None)` when nothing was submitted for an optional field.
/// Range bounds are parsed as integers, or as floats if either is not an
/// integer, and must satisfy `min <= max`.
pub fn clean_field_value(
    field: &FormFieldDef,
    raw: &RawInput,
) -> Result<Option<SubmittedValue>, Vec<String>> {
    if raw.is_missing() || raw.as_single().is_some_and(|s| s.trim().is_empty()) {
        if field.required {
            return Err(vec!["This field is required.".to_string()]);
        }
        return Ok(None);
    }

    match &field.field_type {
        FormFieldType::Range { .. } => clean_range(raw).map(|r| Some(SubmittedValue::Range(r))),
        FormFieldType::MultipleChoice { choices } => {
            clean_choices(choices, raw).map(|v| Some(SubmittedValue::Choices(v)))
        }
        other => {
            let text = raw.as_single().map(str::trim).unwrap_or_default();
            clean_single(other, text).map(|v| {
                let value = SubmittedValue::Single(v);
                (!value.is_empty()).then_some(value)
            })
        }
    }
}

fn clean_range(raw: &RawInput) -> Result<RangeValue, Vec<String>> {
    let RawInput::Range {
        min,
        max,
        allow_empty,
    } = raw
    else {
        return Err(vec![RANGE_NOT_NUMERIC.to_string()]);
    };
    let min = min.trim();
    let max = max.as_deref().map(str::trim).unwrap_or_default();

    let (min, max) = match (min.parse::<i64>(), max.parse::<i64>()) {
        (Ok(lo), Ok(hi)) => (Value::Int(lo), Value::Int(hi)),
        _ => match (min.parse::<f64>(), max.parse::<f64>()) {
            (Ok(lo), Ok(hi)) if lo.is_finite() && hi.is_finite() => {
                (Value::Float(lo), Value::Float(hi))
            }
            _ => return Err(vec![RANGE_NOT_NUMERIC.to_string()]),
        },
    };

    if min.partial_cmp(&max).is_some_and(std::cmp::Ordering::is_gt) {
        return Err(vec![RANGE_MIN_GT_MAX.to_string()]);
    }
    Ok(RangeValue {
        min,
        max,
        allow_empty: *allow_empty,
    })
}

fn clean_choices(choices: &[(Value, String)], raw: &RawInput) -> Result<Vec<Value>, Vec<String>> {
    let submitted: Vec<&str> = match raw {
        RawInput::Multi(values) => values.iter().map(String::as_str).collect(),
        RawInput::Single(value) => vec![value.as_str()],
        _ => Vec::new(),
    };

    let mut selected: Vec<Value> = Vec::new();
    let mut errors = Vec::new();
    for key in submitted {
        let found = choices.iter().find(|(value, _)| {
            let candidate = choice_key(value);
            candidate == key
                || (matches!(value, Value::Bool(_) | Value::Null)
                    && candidate.eq_ignore_ascii_case(key))
        });
        match found {
            Some((value, _)) if !selected.contains(value) => selected.push(value.clone()),
            Some(_) => {}
            None => errors.push(format!(
                "Select a valid choice. {key} is not one of the available choices."
            )),
        }
    }
    if errors.is_empty() {
        Ok(selected)
    } else {
        Err(errors)
    }
}

fn clean_single(field_type: &FormFieldType, text: &str) -> Result<Value, Vec<String>> {
    match field_type {
        FormFieldType::Char => Ok(Value::String(text.to_string())),
        FormFieldType::Integer => text
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| vec!["Enter a whole number.".to_string()]),
        FormFieldType::Float => text
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::Float)
            .ok_or_else(|| vec!["Enter a number.".to_string()]),
        FormFieldType::Boolean => Ok(Value::Bool(checkbox_checked(Some(text)))),
        FormFieldType::NullBoolean => Ok(match text.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Value::Bool(true),
            "false" | "0" | "no" | "off" => Value::Bool(false),
            _ => Value::Null,
        }),
        FormFieldType::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Value::Date)
            .map_err(|_| vec!["Enter a valid date.".to_string()]),
        FormFieldType::Range { .. } | FormFieldType::MultipleChoice { .. } => {
            Err(vec!["Enter a valid value.".to_string()])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range_raw(min: &str, max: &str, allow_empty: bool) -> RawInput {
        RawInput::Range {
            min: min.to_string(),
            max: Some(max.to_string()),
            allow_empty,
        }
    }

    fn status_field() -> FormFieldDef {
        FormFieldDef::multiple_choice(
            "status",
            vec![
                (Value::Int(1), "a".into()),
                (Value::Int(2), "b".into()),
                (Value::Int(3), "c".into()),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_new_field_is_optional() {
        let f = FormFieldDef::new("integer_with_choices", FormFieldType::Integer);
        assert!(!f.required);
        assert_eq!(f.label, "Integer with choices");
        assert_eq!(f.widget, WidgetType::NumberInput);
        assert_eq!(f.kind(), WidgetKind::Custom);
    }

    #[test]
    fn test_pretty_name() {
        assert_eq!(pretty_name("status"), "Status");
        assert_eq!(pretty_name("null_boolean"), "Null boolean");
        assert_eq!(pretty_name(""), "");
    }

    #[test]
    fn test_multiple_choice_rejects_empty() {
        let err = FormFieldDef::multiple_choice("status", vec![]).unwrap_err();
        assert_eq!(err.kind(), "empty_choices");
        assert!(err.to_string().contains("status"));
    }

    #[test]
    fn test_range_integers() {
        let f = FormFieldDef::range("integer", None, false);
        let cleaned = clean_field_value(&f, &range_raw("12", "19", false)).unwrap();
        assert_eq!(
            cleaned,
            Some(SubmittedValue::Range(RangeValue {
                min: Value::Int(12),
                max: Value::Int(19),
                allow_empty: false,
            }))
        );
    }

    #[test]
    fn test_range_falls_back_to_floats_for_both() {
        let f = FormFieldDef::range("float", None, true);
        let cleaned = clean_field_value(&f, &range_raw("1", "2.5", true)).unwrap().unwrap();
        let range = cleaned.as_range().unwrap();
        assert_eq!(range.min, Value::Float(1.0));
        assert_eq!(range.max, Value::Float(2.5));
        assert!(range.allow_empty);
    }

    #[test]
    fn test_range_not_numeric() {
        let f = FormFieldDef::range("integer", None, false);
        assert_eq!(
            clean_field_value(&f, &range_raw("a", "2", false)).unwrap_err(),
            vec![RANGE_NOT_NUMERIC.to_string()]
        );
        let missing_max = RawInput::Range {
            min: "1".into(),
            max: None,
            allow_empty: false,
        };
        assert_eq!(
            clean_field_value(&f, &missing_max).unwrap_err(),
            vec![RANGE_NOT_NUMERIC.to_string()]
        );
    }

    #[test]
    fn test_range_min_greater_than_max() {
        let f = FormFieldDef::range("integer", None, false);
        assert_eq!(
            clean_field_value(&f, &range_raw("19", "12", false)).unwrap_err(),
            vec![RANGE_MIN_GT_MAX.to_string()]
        );
        assert!(clean_field_value(&f, &range_raw("12", "12", false)).is_ok());
    }

    #[test]
    fn test_missing_input_is_unfilled() {
        let f = FormFieldDef::range("integer", None, false);
        assert_eq!(clean_field_value(&f, &RawInput::Missing), Ok(None));
        let required = f.required(true);
        assert!(clean_field_value(&required, &RawInput::Missing).is_err());
    }

    #[test]
    fn test_choices_keep_submission_order_without_duplicates() {
        let cleaned = clean_field_value(
            &status_field(),
            &RawInput::Multi(vec!["3".into(), "1".into(), "3".into()]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(cleaned.as_choices().unwrap(), [Value::Int(3), Value::Int(1)]);
    }

    #[test]
    fn test_choices_reject_unknown_key() {
        let errors =
            clean_field_value(&status_field(), &RawInput::Multi(vec!["9".into()])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains('9'));
    }

    #[test]
    fn test_boolean_choices_case_insensitive() {
        let f = FormFieldDef::multiple_choice(
            "null_boolean",
            vec![
                (Value::Bool(true), "Yes".into()),
                (Value::Bool(false), "No".into()),
                (Value::Null, "Unknown".into()),
            ],
        )
        .unwrap();
        let cleaned = clean_field_value(
            &f,
            &RawInput::Multi(vec!["True".into(), "null".into()]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(cleaned.as_choices().unwrap(), [Value::Bool(true), Value::Null]);
        assert_eq!(f.choice_label(&Value::Null), Some("Unknown"));
    }

    #[test]
    fn test_choice_label_by_stringified_key() {
        let f = status_field();
        assert_eq!(f.choice_label(&Value::Int(3)), Some("c"));
        assert_eq!(f.choice_label(&Value::from("3")), Some("c"));
        assert_eq!(f.choice_label(&Value::Int(4)), None);
    }

    #[test]
    fn test_custom_kinds() {
        let int = FormFieldDef::new("n", FormFieldType::Integer);
        assert_eq!(
            clean_field_value(&int, &RawInput::Single(" 7 ".into())),
            Ok(Some(SubmittedValue::Single(Value::Int(7))))
        );
        assert!(clean_field_value(&int, &RawInput::Single("x".into())).is_err());

        let date = FormFieldDef::new("d", FormFieldType::Date);
        assert_eq!(
            clean_field_value(&date, &RawInput::Single("2024-02-29".into())),
            Ok(Some(SubmittedValue::Single(Value::Date(
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
            ))))
        );

        let nb = FormFieldDef::new("nb", FormFieldType::NullBoolean);
        assert_eq!(clean_field_value(&nb, &RawInput::Single("unknown".into())), Ok(None));
        let text = FormFieldDef::new("t", FormFieldType::Char);
        assert_eq!(clean_field_value(&text, &RawInput::Single("  ".into())), Ok(None));
    }

    #[test]
    fn test_create_widget_matches_field() {
        let f = FormFieldDef::range("integer", Some((Value::Int(1), Value::Int(5))), true);
        assert_eq!(f.create_widget().widget_type(), WidgetType::RangeWidget);
        let checkboxes = status_field().widget(WidgetType::CheckboxSelectMultiple);
        assert_eq!(
            checkboxes.create_widget().widget_type(),
            WidgetType::CheckboxSelectMultiple
        );
    }

    #[test]
    fn test_submitted_value_is_empty() {
        assert!(SubmittedValue::Choices(vec![]).is_empty());
        assert!(SubmittedValue::Single(Value::Null).is_empty());
        assert!(!SubmittedValue::Single(Value::Bool(false)).is_empty());
    }
}
