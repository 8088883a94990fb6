//! The query form engine.
//!
//! A [`QueryForm`] is built once per request from a [`QueryFormConfig`]:
//! every included field name is resolved on the model and turned into a
//! form field. The submission is then bound with [`QueryForm::bind`], after
//! which [`QueryForm::process`] filters a collection and
//! [`QueryForm::pretty_print_query`] describes the active filters.
//!
//! # Examples
//!
//! ```
//! use queryform_engine::{QueryForm, QueryFormConfig};
//! use queryform_forms::QueryDict;
//! use queryform_test::fixtures::populated;
//!
//! let schema = populated().unwrap();
//! let mut form = QueryForm::new(
//!     QueryFormConfig::new(schema.base.clone()).include(["integer", "integer_with_choices"]),
//! )
//! .unwrap();
//!
//! form.bind(&QueryDict::parse("integer_0=12&integer_1=19"));
//! let results = form.process(None).unwrap();
//! assert_eq!(results.len(), 3);
//! assert_eq!(form.pretty_print_query(None).unwrap().get("Integer"), Some("12 - 19"));
//! ```

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use queryform_core::logging::form_span;
use queryform_core::{QueryFormError, QueryFormResult, Settings, UnknownFieldPolicy, SETTINGS};
use queryform_db::model::ModelRef;
use queryform_db::query::{QuerySet, Q, LOOKUP_SEP};
use queryform_forms::fields::{FormFieldDef, SubmittedValue};
use queryform_forms::form::{BaseForm, Form};
use queryform_forms::querydict::QueryDict;

use crate::builder::{self, BuiltField};
use crate::introspect::{self, ResolvedField};
use crate::overrides::Overrides;
use crate::{composer, printer, resolver};

/// Where a form is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    /// Fields are built; nothing is bound yet.
    Built,
    /// A submission is bound and validated.
    Validated,
    /// The submission has been applied to a collection.
    Processed,
    /// The submission has been rendered for display.
    Printed,
}

/// Configuration for a [`QueryForm`].
#[derive(Clone, Default)]
pub struct QueryFormConfig {
    /// The model the form queries. Required.
    pub model: Option<ModelRef>,
    /// Field names or `__` paths to build fields for, in order.
    pub include: Vec<String>,
    /// Relation paths whose target models the `include` names are also
    /// looked up on.
    pub traverse: Vec<String>,
    /// Build, filter, print and compose overrides.
    pub overrides: Overrides,
    /// Settings to use instead of the global ones.
    pub settings: Option<Settings>,
}

impl fmt::Debug for QueryFormConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryFormConfig")
            .field("model", &self.model.as_ref().map(|m| m.meta().label()))
            .field("include", &self.include)
            .field("traverse", &self.traverse)
            .field("overrides", &self.overrides)
            .field("settings", &self.settings)
            .finish()
    }
}

impl QueryFormConfig {
    /// Creates a configuration for `model` with no fields.
    pub fn new(model: ModelRef) -> Self {
        Self {
            model: Some(model),
            ..Self::default()
        }
    }

    /// Sets the included field names.
    #[must_use]
    pub fn include<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the traversed relation paths.
    #[must_use]
    pub fn traverse<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.traverse = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the overrides.
    #[must_use]
    pub fn overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Sets explicit settings.
    #[must_use]
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }
}

/// The rendered filters of a form: `(label, description)` pairs in field
/// name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PrettyQuery(Vec<(String, String)>);

impl PrettyQuery {
    /// Returns the description rendered under `label`.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, text)| text.as_str())
    }

    /// Returns the number of rendered fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no field is rendered.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the `(label, description)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(l, t)| (l.as_str(), t.as_str()))
    }
}

/// A query form built for one model.
pub struct QueryForm {
    model: ModelRef,
    fields: Vec<BuiltField>,
    form: BaseForm,
    overrides: Overrides,
    state: Cell<FormState>,
}

impl fmt::Debug for QueryForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryForm")
            .field("model", &self.model.meta().label())
            .field("fields", &self.field_names())
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}

impl QueryForm {
    /// Builds the form described by `config`.
    ///
    /// # Errors
    ///
    /// - `ConfigurationError` if no model is set, or a name appears in both
    ///   `include` and `traverse`
    /// - `FieldNotFound` for an unknown include name under
    ///   [`UnknownFieldPolicy::Reject`], or an unknown traverse segment
    /// - `TraversalError` if a traverse path, or an include path under
    ///   [`UnknownFieldPolicy::Reject`], crosses a non-relational field or is
    ///   too deep
    /// - any error a field's build strategy returns
    pub fn new(config: QueryFormConfig) -> QueryFormResult<Self> {
        let QueryFormConfig {
            model,
            include,
            traverse,
            overrides,
            settings,
        } = config;
        let model = model.ok_or_else(|| {
            QueryFormError::ConfigurationError("QueryForm has no model configured".to_string())
        })?;
        if let Some(name) = include.iter().find(|name| traverse.contains(name)) {
            return Err(QueryFormError::ConfigurationError(format!(
                "'{name}' cannot be both included and traversed"
            )));
        }
        let settings = settings.unwrap_or_else(|| SETTINGS.get_or_default());

        let span = form_span(&model.meta().label());
        let _guard = span.enter();

        let mut builder = FieldSetBuilder {
            root: &model,
            overrides: &overrides,
            fields: Vec::new(),
        };

        let mut found: BTreeSet<&str> = BTreeSet::new();
        for name in &include {
            match introspect::resolve_with_depth(name, &model, settings.max_traversal_depth) {
                Ok(resolved) => {
                    builder.push(&resolved)?;
                    found.insert(name);
                }
                Err(QueryFormError::FieldNotFound(msg)) => {
                    tracing::debug!(field = %name, reason = %msg, "Include name not found on model");
                }
                Err(QueryFormError::TraversalError(msg))
                    if settings.unknown_fields == UnknownFieldPolicy::Skip =>
                {
                    tracing::debug!(field = %name, reason = %msg, "Include path does not traverse");
                }
                Err(err) => return Err(err),
            }
        }

        for path in &traverse {
            let target = introspect::resolve_relation_chain(path, &model, settings.max_traversal_depth)?;
            for name in &include {
                if target.get_field(name).is_err() {
                    tracing::debug!(field = %name, traverse = %path, "Include name not found on traversed model");
                    continue;
                }
                let full = format!("{path}{LOOKUP_SEP}{name}");
                let resolved = introspect::resolve_with_depth(&full, &model, settings.max_traversal_depth)?;
                builder.push(&resolved)?;
                found.insert(name);
            }
        }

        if settings.unknown_fields == UnknownFieldPolicy::Reject {
            if let Some(missing) = include.iter().find(|name| !found.contains(name.as_str())) {
                return Err(QueryFormError::FieldNotFound(format!(
                    "'{missing}' does not resolve on {} or any traversed model",
                    model.meta().label()
                )));
            }
        }

        let fields = builder.fields;
        let form = BaseForm::new(fields.iter().map(|f| f.spec.clone()).collect());
        tracing::debug!(fields = fields.len(), "Built query form");
        Ok(Self {
            model,
            fields,
            form,
            overrides,
            state: Cell::new(FormState::Built),
        })
    }

    /// Binds and validates a submission, returning the changed field names.
    ///
    /// Fields that fail validation are recorded in [`errors`](Self::errors)
    /// and left out of the changed set.
    pub fn bind(&mut self, data: &QueryDict) -> &BTreeSet<String> {
        self.form.bind(data);
        self.form.is_valid();
        self.state.set(FormState::Validated);
        self.form.changed_data()
    }

    /// Filters `queryset`, or every record of the model when `None`, by the
    /// bound submission.
    ///
    /// Returns the collection unchanged when no field is changed.
    pub fn process(&self, queryset: Option<&QuerySet>) -> QueryFormResult<QuerySet> {
        self.ensure_validated("process")?;
        let span = form_span(&self.model.meta().label());
        let _guard = span.enter();

        let base = match queryset {
            Some(qs) => {
                let given = qs.model().meta().label();
                let expected = self.model.meta().label();
                if given != expected {
                    return Err(QueryFormError::TypeMismatch(format!(
                        "Expected records of {expected}, got {given}"
                    )));
                }
                qs.clone()
            }
            None => QuerySet::all(&self.model)?,
        };

        let result = match self.get_query()? {
            Some(q) => base.filter(&q)?,
            None => base.clone(),
        };
        tracing::info!(
            fields = self.form.changed_data().len(),
            rows_in = base.len(),
            rows_out = result.len(),
            "Processed query form"
        );
        self.state.set(FormState::Processed);
        Ok(result)
    }

    /// Returns one predicate per changed field, keyed by field name.
    pub fn get_filters(&self) -> QueryFormResult<BTreeMap<String, Q>> {
        let mut filters = BTreeMap::new();
        for (built, value) in self.changed_values() {
            if let Some(q) = resolver::resolve_filter(built, value, &self.overrides)? {
                filters.insert(built.spec.name.clone(), q);
            }
        }
        Ok(filters)
    }

    /// Returns the combined predicate, or `None` when nothing filters.
    pub fn get_query(&self) -> QueryFormResult<Option<Q>> {
        let filters = self.get_filters()?;
        match self.overrides.compose_fn() {
            Some(compose) => compose(&filters)?.map(resolver::ensure_predicate).transpose(),
            None => composer::compose(&filters),
        }
    }

    /// Renders the changed fields, or the given subset of them, as
    /// `(label, description)` pairs in field name order.
    ///
    /// # Errors
    ///
    /// `ValueError` if `fields` names a field that is not changed.
    pub fn pretty_print_query(&self, fields: Option<&[&str]>) -> QueryFormResult<PrettyQuery> {
        self.ensure_validated("pretty_print_query")?;
        let changed = self.form.changed_data();
        let names: BTreeSet<&str> = match fields {
            Some(subset) => {
                if let Some(unknown) = subset.iter().find(|name| !changed.contains(**name)) {
                    return Err(QueryFormError::ValueError(format!(
                        "'{unknown}' is not a changed field of this form"
                    )));
                }
                subset.iter().copied().collect()
            }
            None => changed.iter().map(String::as_str).collect(),
        };

        let mut pairs = Vec::with_capacity(names.len());
        for name in names {
            let (Some(built), Some(value)) = (self.built(name), self.form.cleaned_data().get(name))
            else {
                continue;
            };
            let text = printer::render_field(built, value, &self.overrides)?;
            pairs.push((built.spec.label.clone(), text));
        }
        self.state.set(FormState::Printed);
        Ok(PrettyQuery(pairs))
    }

    /// Returns the lowercase hex SHA-256 of the JSON form of
    /// [`pretty_print_query`](Self::pretty_print_query).
    pub fn query_fingerprint(&self) -> QueryFormResult<String> {
        use std::fmt::Write;

        let pretty = self.pretty_print_query(None)?;
        let json = serde_json::to_string(&pretty)
            .map_err(|e| QueryFormError::SerializationError(e.to_string()))?;
        let digest = Sha256::digest(json.as_bytes());
        Ok(digest.iter().fold(String::with_capacity(64), |mut s, b| {
            let _ = write!(s, "{b:02x}");
            s
        }))
    }

    /// Returns the model the form queries.
    pub const fn model(&self) -> &ModelRef {
        &self.model
    }

    /// Returns the built fields, in construction order.
    pub fn fields(&self) -> &[BuiltField] {
        &self.fields
    }

    /// Returns the form field named `name`.
    pub fn field(&self, name: &str) -> Option<&FormFieldDef> {
        self.built(name).map(|b| &b.spec)
    }

    /// Returns the form field names, in construction order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.spec.name.as_str()).collect()
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> FormState {
        self.state.get()
    }

    /// Returns the validation errors of the bound submission.
    pub fn errors(&self) -> &HashMap<String, Vec<String>> {
        self.form.errors()
    }

    /// Returns the names of the changed fields.
    pub fn changed_data(&self) -> &BTreeSet<String> {
        self.form.changed_data()
    }

    /// Returns the cleaned values of the bound submission.
    pub fn cleaned_data(&self) -> &HashMap<String, SubmittedValue> {
        self.form.cleaned_data()
    }

    /// Returns the underlying binding form, e.g. for rendering.
    pub const fn form(&self) -> &BaseForm {
        &self.form
    }

    fn built(&self, name: &str) -> Option<&BuiltField> {
        self.fields.iter().find(|f| f.spec.name == name)
    }

    fn changed_values(&self) -> impl Iterator<Item = (&BuiltField, &SubmittedValue)> {
        self.form.changed_data().iter().filter_map(move |name| {
            Some((self.built(name)?, self.form.cleaned_data().get(name)?))
        })
    }

    fn ensure_validated(&self, operation: &str) -> QueryFormResult<()> {
        if self.state.get() == FormState::Built {
            return Err(QueryFormError::InvalidState(format!(
                "{operation} called before a submission was bound"
            )));
        }
        Ok(())
    }
}

struct FieldSetBuilder<'a> {
    root: &'a ModelRef,
    overrides: &'a Overrides,
    fields: Vec<BuiltField>,
}

impl FieldSetBuilder<'_> {
    fn push(&mut self, resolved: &ResolvedField) -> QueryFormResult<()> {
        if self.fields.iter().any(|f| f.spec.name == resolved.path) {
            tracing::debug!(field = %resolved.path, "Skipping duplicate field");
            return Ok(());
        }
        let built = builder::build(resolved, self.root, self.overrides)?;
        self.fields.push(built);
        Ok(())
    }
}
