//! Widget system for query form controls.
//!
//! Widgets are the bridge between form fields and submitted data. Each widget
//! knows how to render itself as HTML, extract its raw input from a
//! [`QueryDict`], and generate an `id` for its `<label>`.
//!
//! [`RangeWidget`] is a composite control: two number inputs named
//! `<name>_0` and `<name>_1` and, for nullable fields, an include-empty
//! checkbox named `<name>_2`.

use std::collections::HashMap;
use std::fmt;

use queryform_db::value::Value;

use crate::querydict::QueryDict;

/// Enumerates the built-in widget types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetType {
    /// `<input type="text">`.
    TextInput,
    /// `<input type="number">`.
    NumberInput,
    /// `<input type="checkbox">`.
    CheckboxInput,
    /// `<input type="date">`.
    DateInput,
    /// `<select>`.
    Select,
    /// `<select multiple>`.
    SelectMultiple,
    /// A set of `<input type="checkbox">` elements.
    CheckboxSelectMultiple,
    /// Min and max number inputs plus an optional include-empty checkbox.
    RangeWidget,
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TextInput => "TextInput",
            Self::NumberInput => "NumberInput",
            Self::CheckboxInput => "CheckboxInput",
            Self::DateInput => "DateInput",
            Self::Select => "Select",
            Self::SelectMultiple => "SelectMultiple",
            Self::CheckboxSelectMultiple => "CheckboxSelectMultiple",
            Self::RangeWidget => "RangeWidget",
        };
        write!(f, "{name}")
    }
}

/// Raw, uncleaned input extracted from submitted data by a widget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RawInput {
    /// Nothing was submitted for the field.
    #[default]
    Missing,
    /// A single submitted string.
    Single(String),
    /// Every value submitted under the field name, in submission order.
    Multi(Vec<String>),
    /// The parts of a range control. `min` is always present.
    Range {
        /// Text of the `_0` input.
        min: String,
        /// Text of the `_1` input, if submitted.
        max: Option<String>,
        /// Whether the include-empty checkbox was ticked.
        allow_empty: bool,
    },
}

impl RawInput {
    /// Returns `true` if nothing was submitted.
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Returns the submitted string of a single-valued input.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns the submitted strings of a multi-valued input.
    pub fn as_multi(&self) -> &[String] {
        match self {
            Self::Multi(values) => values,
            _ => &[],
        }
    }
}

/// A trait for form widgets.
pub trait Widget: Send + Sync + fmt::Debug {
    /// Returns the widget type enum variant.
    fn widget_type(&self) -> WidgetType;

    /// Renders the widget as an HTML string.
    ///
    /// # Arguments
    /// - `name` - The HTML `name` attribute
    /// - `value` - The current raw input to display
    /// - `attrs` - Additional HTML attributes
    fn render(&self, name: &str, value: &RawInput, attrs: &HashMap<String, String>) -> String;

    /// Extracts the raw input for `name` from the submitted data.
    fn value_from_data(&self, data: &QueryDict, name: &str) -> RawInput;

    /// Returns the HTML `id` attribute value for a label targeting this widget.
    fn id_for_label(&self, id: &str) -> String {
        id.to_string()
    }
}

/// Formats an HTML attributes map into a string like ` key="value" key2="value2"`.
fn render_attrs(attrs: &HashMap<String, String>) -> String {
    let mut parts: Vec<String> = attrs
        .iter()
        .map(|(k, v)| format!(r#" {k}="{v}""#))
        .collect();
    parts.sort();
    parts.join("")
}

fn single_from_data(data: &QueryDict, name: &str) -> RawInput {
    data.get(name)
        .map_or(RawInput::Missing, |v| RawInput::Single(v.to_string()))
}

fn multi_from_data(data: &QueryDict, name: &str) -> RawInput {
    let values = data.get_list(name);
    if values.is_empty() {
        RawInput::Missing
    } else {
        RawInput::Multi(values.to_vec())
    }
}

/// Interprets a checkbox submission. `false`, `0` and `off` are unchecked.
pub fn checkbox_checked(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        !v.is_empty() && !matches!(v.to_ascii_lowercase().as_str(), "false" | "0" | "off")
    })
}

// ---------------------------------------------------------------------------
// Built-in widgets
// ---------------------------------------------------------------------------

/// A `<input type="text">` widget.
#[derive(Debug, Clone)]
pub struct TextInput;

impl Widget for TextInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::TextInput
    }

    fn render(&self, name: &str, value: &RawInput, attrs: &HashMap<String, String>) -> String {
        let val = value.as_single().unwrap_or("");
        format!(
            r#"<input type="text" name="{name}" value="{val}"{} />"#,
            render_attrs(attrs)
        )
    }

    fn value_from_data(&self, data: &QueryDict, name: &str) -> RawInput {
        single_from_data(data, name)
    }
}

/// A `<input type="number">` widget.
#[derive(Debug, Clone)]
pub struct NumberInput;

impl Widget for NumberInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::NumberInput
    }

    fn render(&self, name: &str, value: &RawInput, attrs: &HashMap<String, String>) -> String {
        let val = value.as_single().unwrap_or("");
        format!(
            r#"<input type="number" name="{name}" value="{val}"{} />"#,
            render_attrs(attrs)
        )
    }

    fn value_from_data(&self, data: &QueryDict, name: &str) -> RawInput {
        single_from_data(data, name)
    }
}

/// A `<input type="checkbox">` widget.
#[derive(Debug, Clone)]
pub struct CheckboxInput;

impl Widget for CheckboxInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::CheckboxInput
    }

    fn render(&self, name: &str, value: &RawInput, attrs: &HashMap<String, String>) -> String {
        let checked_attr = if checkbox_checked(value.as_single()) {
            " checked"
        } else {
            ""
        };
        format!(
            r#"<input type="checkbox" name="{name}"{checked_attr}{} />"#,
            render_attrs(attrs)
        )
    }

    fn value_from_data(&self, data: &QueryDict, name: &str) -> RawInput {
        single_from_data(data, name)
    }
}

/// A `<input type="date">` widget.
#[derive(Debug, Clone)]
pub struct DateInput;

impl Widget for DateInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::DateInput
    }

    fn render(&self, name: &str, value: &RawInput, attrs: &HashMap<String, String>) -> String {
        let val = value.as_single().unwrap_or("");
        format!(
            r#"<input type="date" name="{name}" value="{val}"{} />"#,
            render_attrs(attrs)
        )
    }

    fn value_from_data(&self, data: &QueryDict, name: &str) -> RawInput {
        single_from_data(data, name)
    }
}

/// A `<select>` widget.
#[derive(Debug, Clone)]
pub struct Select {
    /// The available choices as `(value, display_label)` pairs.
    pub choices: Vec<(String, String)>,
}

impl Select {
    /// Creates a new `Select` widget with the given choices.
    pub fn new(choices: Vec<(String, String)>) -> Self {
        Self { choices }
    }
}

impl Widget for Select {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Select
    }

    fn render(&self, name: &str, value: &RawInput, attrs: &HashMap<String, String>) -> String {
        let current = value.as_single().unwrap_or("");
        let mut options = String::new();
        for (val, label) in &self.choices {
            let selected = if val == current { " selected" } else { "" };
            options.push_str(&format!(
                r#"<option value="{val}"{selected}>{label}</option>"#
            ));
        }
        format!(
            r#"<select name="{name}"{}>{options}</select>"#,
            render_attrs(attrs)
        )
    }

    fn value_from_data(&self, data: &QueryDict, name: &str) -> RawInput {
        single_from_data(data, name)
    }
}

/// A `<select multiple>` widget.
#[derive(Debug, Clone)]
pub struct SelectMultiple {
    /// The available choices as `(value, display_label)` pairs.
    pub choices: Vec<(String, String)>,
}

impl SelectMultiple {
    /// Creates a new `SelectMultiple` widget with the given choices.
    pub fn new(choices: Vec<(String, String)>) -> Self {
        Self { choices }
    }
}

impl Widget for SelectMultiple {
    fn widget_type(&self) -> WidgetType {
        WidgetType::SelectMultiple
    }

    fn render(&self, name: &str, value: &RawInput, attrs: &HashMap<String, String>) -> String {
        let selected_values = value.as_multi();
        let mut options = String::new();
        for (val, label) in &self.choices {
            let selected = if selected_values.contains(val) {
                " selected"
            } else {
                ""
            };
            options.push_str(&format!(
                r#"<option value="{val}"{selected}>{label}</option>"#
            ));
        }
        format!(
            r#"<select name="{name}" multiple{}>{options}</select>"#,
            render_attrs(attrs)
        )
    }

    fn value_from_data(&self, data: &QueryDict, name: &str) -> RawInput {
        multi_from_data(data, name)
    }
}

/// A set of checkboxes for multiple selection.
#[derive(Debug, Clone)]
pub struct CheckboxSelectMultiple {
    /// The available choices as `(value, display_label)` pairs.
    pub choices: Vec<(String, String)>,
}

impl CheckboxSelectMultiple {
    /// Creates a new `CheckboxSelectMultiple` widget with the given choices.
    pub fn new(choices: Vec<(String, String)>) -> Self {
        Self { choices }
    }
}

impl Widget for CheckboxSelectMultiple {
    fn widget_type(&self) -> WidgetType {
        WidgetType::CheckboxSelectMultiple
    }

    fn render(&self, name: &str, value: &RawInput, attrs: &HashMap<String, String>) -> String {
        let selected_values = value.as_multi();
        let id_base = attrs.get("id").map_or(name, String::as_str);
        let mut html = String::from("<div>");
        for (i, (val, label)) in self.choices.iter().enumerate() {
            let checked = if selected_values.contains(val) {
                " checked"
            } else {
                ""
            };
            let option_id = format!("{id_base}_{i}");
            html.push_str(&format!(
                r#"<div><input type="checkbox" name="{name}" value="{val}" id="{option_id}"{checked} />"#
            ));
            html.push_str(&format!(
                r#" <label for="{option_id}">{label}</label></div>"#
            ));
        }
        html.push_str("</div>");
        html
    }

    fn value_from_data(&self, data: &QueryDict, name: &str) -> RawInput {
        multi_from_data(data, name)
    }

    fn id_for_label(&self, id: &str) -> String {
        format!("{id}_0")
    }
}

/// A min/max pair of number inputs with an optional include-empty checkbox.
///
/// The aggregated bounds of the underlying field are rendered as the `min`
/// and `max` attributes of both inputs.
#[derive(Debug, Clone)]
pub struct RangeWidget {
    /// The smallest and largest stored values, if any rows exist.
    pub bounds: Option<(Value, Value)>,
    /// Whether the include-empty checkbox is rendered and read.
    pub allow_null: bool,
}

impl RangeWidget {
    /// Creates a new `RangeWidget`.
    pub const fn new(bounds: Option<(Value, Value)>, allow_null: bool) -> Self {
        Self { bounds, allow_null }
    }

    /// Splits a range input into the values shown by each sub-control.
    ///
    /// Returns `[min, max]`, plus the include-empty flag when the widget
    /// allows nulls. An unfilled input decompresses to `[None, None]`.
    pub fn decompress(&self, value: &RawInput) -> Vec<Option<String>> {
        match value {
            RawInput::Range {
                min,
                max,
                allow_empty,
            } => {
                let mut parts = vec![Some(min.clone()), max.clone()];
                if self.allow_null {
                    parts.push(Some(allow_empty.to_string()));
                }
                parts
            }
            _ => vec![None, None],
        }
    }

    fn bound_attrs(&self, attrs: &HashMap<String, String>) -> HashMap<String, String> {
        let mut merged = attrs.clone();
        if let Some((lo, hi)) = &self.bounds {
            merged.insert("min".to_string(), lo.to_string());
            merged.insert("max".to_string(), hi.to_string());
        }
        merged
    }
}

impl Widget for RangeWidget {
    fn widget_type(&self) -> WidgetType {
        WidgetType::RangeWidget
    }

    fn render(&self, name: &str, value: &RawInput, attrs: &HashMap<String, String>) -> String {
        let parts = self.decompress(value);
        let part = |i: usize| {
            parts
                .get(i)
                .cloned()
                .flatten()
                .map_or(RawInput::Missing, RawInput::Single)
        };
        let number_attrs = self.bound_attrs(attrs);
        let mut html = format!(
            "{} {}",
            NumberInput.render(&format!("{name}_0"), &part(0), &number_attrs),
            NumberInput.render(&format!("{name}_1"), &part(1), &number_attrs),
        );
        if self.allow_null {
            let checkbox = CheckboxInput.render(&format!("{name}_2"), &part(2), &HashMap::new());
            html.push_str(&format!(" <br/> Include Empty values {checkbox}"));
        }
        html
    }

    fn value_from_data(&self, data: &QueryDict, name: &str) -> RawInput {
        let min = match data.get(&format!("{name}_0")) {
            Some(min) if !min.is_empty() => min.to_string(),
            _ => return RawInput::Missing,
        };
        let max = data.get(&format!("{name}_1")).map(String::from);
        let allow_empty = self.allow_null && checkbox_checked(data.get(&format!("{name}_2")));
        RawInput::Range {
            min,
            max,
            allow_empty,
        }
    }

    fn id_for_label(&self, id: &str) -> String {
        format!("{id}_0")
    }
}

/// Creates a boxed widget from a `WidgetType` enum.
///
/// Choice-based widgets get the given choices. A `RangeWidget` built here
/// has no bounds and no include-empty checkbox; range fields build their
/// own widget from their bounds instead.
pub fn create_widget_with_choices(
    widget_type: WidgetType,
    choices: &[(String, String)],
) -> Box<dyn Widget> {
    match widget_type {
        WidgetType::TextInput => Box::new(TextInput),
        WidgetType::NumberInput => Box::new(NumberInput),
        WidgetType::CheckboxInput => Box::new(CheckboxInput),
        WidgetType::DateInput => Box::new(DateInput),
        WidgetType::Select => Box::new(Select::new(choices.to_vec())),
        WidgetType::SelectMultiple => Box::new(SelectMultiple::new(choices.to_vec())),
        WidgetType::CheckboxSelectMultiple => {
            Box::new(CheckboxSelectMultiple::new(choices.to_vec()))
        }
        WidgetType::RangeWidget => Box::new(RangeWidget::new(None, false)),
    }
}
