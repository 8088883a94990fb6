//! Form trait and `BaseForm` implementation.
//!
//! The [`Form`] trait is the binding contract a query form engine relies on:
//! bind submitted data, validate it, and report which fields changed.
//! [`BaseForm`] implements it over a list of [`FormFieldDef`]s.

use std::collections::{BTreeSet, HashMap};

use crate::fields::{FormFieldDef, SubmittedValue};
use crate::querydict::QueryDict;
use crate::validation;
use crate::widgets::RawInput;

static MISSING: RawInput = RawInput::Missing;

/// The core form trait.
pub trait Form: Send + Sync {
    /// Returns the form's field definitions.
    fn fields(&self) -> &[FormFieldDef];

    /// Returns the form prefix (for namespacing multiple forms on one page).
    fn prefix(&self) -> Option<&str>;

    /// Binds submitted data to this form.
    fn bind(&mut self, data: &QueryDict);

    /// Returns `true` if this form has been bound to data.
    fn is_bound(&self) -> bool;

    /// Validates the bound data. Returns `true` if no field failed.
    ///
    /// After calling this, `errors()`, `cleaned_data()` and `changed_data()`
    /// are populated.
    fn is_valid(&mut self) -> bool;

    /// Returns per-field validation errors.
    fn errors(&self) -> &HashMap<String, Vec<String>>;

    /// Returns the cleaned values of the fields that were filled in and
    /// passed validation.
    fn cleaned_data(&self) -> &HashMap<String, SubmittedValue>;

    /// Returns the sorted names of fields whose cleaned value differs from
    /// the unfilled default.
    fn changed_data(&self) -> &BTreeSet<String>;

    /// Cross-field validation hook. The default implementation does nothing.
    fn clean(&self) -> Result<(), HashMap<String, Vec<String>>> {
        Ok(())
    }
}

/// A general-purpose form implementation.
#[derive(Debug, Clone, Default)]
pub struct BaseForm {
    field_defs: Vec<FormFieldDef>,
    prefix: Option<String>,
    bound: bool,
    raw_data: HashMap<String, RawInput>,
    errors: HashMap<String, Vec<String>>,
    cleaned_data: HashMap<String, SubmittedValue>,
    changed: BTreeSet<String>,
}

impl BaseForm {
    /// Creates a new `BaseForm` with the given field definitions.
    pub fn new(fields: Vec<FormFieldDef>) -> Self {
        Self {
            field_defs: fields,
            ..Self::default()
        }
    }

    /// Sets the form prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Returns the field named `name`.
    pub fn field(&self, name: &str) -> Option<&FormFieldDef> {
        self.field_defs.iter().find(|f| f.name == name)
    }

    /// Returns the HTML name a field is submitted under.
    pub fn html_name(&self, name: &str) -> String {
        match &self.prefix {
            Some(p) => format!("{p}-{name}"),
            None => name.to_string(),
        }
    }

    /// Returns the raw input bound to `name`.
    pub fn raw_value(&self, name: &str) -> &RawInput {
        self.raw_data.get(name).unwrap_or(&MISSING)
    }

    /// Renders the widget of `name` with its bound input.
    pub fn render_field(&self, name: &str) -> Option<String> {
        let field = self.field(name)?;
        let widget = field.create_widget();
        let mut attrs = HashMap::new();
        attrs.insert("id".to_string(), format!("id_{}", self.html_name(name)));
        Some(widget.render(&self.html_name(name), self.raw_value(name), &attrs))
    }

    /// Returns the errors as a JSON object keyed by field name.
    pub fn errors_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .errors
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::json!(v)))
            .collect();
        serde_json::Value::Object(map)
    }

    /// Returns the non-field (form-level) errors.
    pub fn non_field_errors(&self) -> &[String] {
        self.errors.get("__all__").map_or(&[], Vec::as_slice)
    }
}

impl Form for BaseForm {
    fn fields(&self) -> &[FormFieldDef] {
        &self.field_defs
    }

    fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    fn bind(&mut self, data: &QueryDict) {
        self.bound = true;
        self.raw_data.clear();
        self.errors.clear();
        self.cleaned_data.clear();
        self.changed.clear();

        for field in &self.field_defs {
            let html_name = self.html_name(&field.name);
            let value = field.create_widget().value_from_data(data, &html_name);
            self.raw_data.insert(field.name.clone(), value);
        }
    }

    fn is_bound(&self) -> bool {
        self.bound
    }

    fn is_valid(&mut self) -> bool {
        if !self.bound {
            return false;
        }

        self.errors.clear();
        self.cleaned_data.clear();

        // Step 1: Field-level validation
        validation::clean_fields(
            &self.field_defs,
            &self.raw_data,
            &mut self.cleaned_data,
            &mut self.errors,
        );

        // Step 2: Form-level cross-field validation
        if let Err(form_errors) = self.clean() {
            for (key, msgs) in form_errors {
                self.errors.entry(key).or_default().extend(msgs);
            }
        }

        self.changed = validation::changed_fields(&self.cleaned_data);
        self.errors.is_empty()
    }

    fn errors(&self) -> &HashMap<String, Vec<String>> {
        &self.errors
    }

    fn cleaned_data(&self) -> &HashMap<String, SubmittedValue> {
        &self.cleaned_data
    }

    fn changed_data(&self) -> &BTreeSet<String> {
        &self.changed
    }
}
