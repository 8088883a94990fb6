//! Caller-supplied build, filter, print and compose strategies.
//!
//! Each dispatch point (building a form field, turning a submitted value
//! into a predicate, rendering it for display) can be overridden for one
//! field by name or for every field of a declared type. Name keys are
//! matched against the full form field path first and then the terminal
//! field name; type keys are the lower-cased declared type name
//! (`"integerfield"`, `"textfield"`, ...). Keys are case-insensitive.
//!
//! # Examples
//!
//! ```
//! use queryform_db::query::{Lookup, Q};
//! use queryform_engine::overrides::Overrides;
//! use queryform_forms::fields::{FormFieldDef, FormFieldType, SubmittedValue};
//!
//! let overrides = Overrides::new()
//!     .build_type("TextField", |ctx| {
//!         Ok(FormFieldDef::new(&ctx.name, FormFieldType::Char))
//!     })
//!     .filter_type("textfield", |path, value| match value {
//!         SubmittedValue::Single(v) => Ok(Q::filter(path, Lookup::IContains(v.to_string()))),
//!         _ => Ok(Q::And(vec![])),
//!     });
//! assert!(overrides.build_for("text", "text", "TextField").is_some());
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use queryform_core::QueryFormResult;
use queryform_db::query::Q;
use queryform_forms::fields::{FormFieldDef, SubmittedValue};

use crate::builder::BuildContext;

/// Builds a form field for one model field.
pub type BuildFn = Arc<dyn Fn(&BuildContext<'_>) -> QueryFormResult<FormFieldDef> + Send + Sync>;

/// Turns a submitted value into a predicate on the given path.
pub type FilterFn = Arc<dyn Fn(&str, &SubmittedValue) -> QueryFormResult<Q> + Send + Sync>;

/// Renders a submitted value for display.
pub type PrintFn =
    Arc<dyn Fn(&FormFieldDef, &SubmittedValue) -> QueryFormResult<String> + Send + Sync>;

/// Combines the per-field predicates into one, or `None` for no filtering.
pub type ComposeFn =
    Arc<dyn Fn(&BTreeMap<String, Q>) -> QueryFormResult<Option<Q>> + Send + Sync>;

/// Which branch of a dispatch chain produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// An override registered for the field's name.
    FieldOverride,
    /// An override registered for the field's declared type.
    TypeOverride,
    /// The field's static choice set.
    Choices,
    /// The default for the field's category or widget kind.
    Default,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FieldOverride => "field_override",
            Self::TypeOverride => "type_override",
            Self::Choices => "choices",
            Self::Default => "default",
        })
    }
}

/// A set of registered overrides.
#[derive(Clone, Default)]
pub struct Overrides {
    build_by_name: HashMap<String, BuildFn>,
    build_by_type: HashMap<String, BuildFn>,
    filter_by_name: HashMap<String, FilterFn>,
    filter_by_type: HashMap<String, FilterFn>,
    print_by_name: HashMap<String, PrintFn>,
    print_by_type: HashMap<String, PrintFn>,
    compose: Option<ComposeFn>,
}

impl fmt::Debug for Overrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn keys<V>(map: &HashMap<String, V>) -> Vec<&str> {
            let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
            keys.sort_unstable();
            keys
        }
        f.debug_struct("Overrides")
            .field("build_by_name", &keys(&self.build_by_name))
            .field("build_by_type", &keys(&self.build_by_type))
            .field("filter_by_name", &keys(&self.filter_by_name))
            .field("filter_by_type", &keys(&self.filter_by_type))
            .field("print_by_name", &keys(&self.print_by_name))
            .field("print_by_type", &keys(&self.print_by_type))
            .field("compose", &self.compose.is_some())
            .finish()
    }
}

fn key(name: &str) -> String {
    name.to_lowercase()
}

/// Looks a name up by full path, then by terminal field name.
fn by_name<'a, V>(map: &'a HashMap<String, V>, path: &str, leaf: &str) -> Option<&'a V> {
    map.get(&key(path)).or_else(|| map.get(&key(leaf)))
}

impl Overrides {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides form field construction for a field name or path.
    #[must_use]
    pub fn build_field<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&BuildContext<'_>) -> QueryFormResult<FormFieldDef> + Send + Sync + 'static,
    {
        self.build_by_name.insert(key(name), Arc::new(f));
        self
    }

    /// Overrides form field construction for every field of a type.
    #[must_use]
    pub fn build_type<F>(mut self, type_name: &str, f: F) -> Self
    where
        F: Fn(&BuildContext<'_>) -> QueryFormResult<FormFieldDef> + Send + Sync + 'static,
    {
        self.build_by_type.insert(key(type_name), Arc::new(f));
        self
    }

    /// Overrides predicate construction for a field name or path.
    #[must_use]
    pub fn filter_field<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&str, &SubmittedValue) -> QueryFormResult<Q> + Send + Sync + 'static,
    {
        self.filter_by_name.insert(key(name), Arc::new(f));
        self
    }

    /// Overrides predicate construction for every field of a type.
    #[must_use]
    pub fn filter_type<F>(mut self, type_name: &str, f: F) -> Self
    where
        F: Fn(&str, &SubmittedValue) -> QueryFormResult<Q> + Send + Sync + 'static,
    {
        self.filter_by_type.insert(key(type_name), Arc::new(f));
        self
    }

    /// Overrides display rendering for a field name or path.
    #[must_use]
    pub fn print_field<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&FormFieldDef, &SubmittedValue) -> QueryFormResult<String> + Send + Sync + 'static,
    {
        self.print_by_name.insert(key(name), Arc::new(f));
        self
    }

    /// Overrides display rendering for every field of a type.
    #[must_use]
    pub fn print_type<F>(mut self, type_name: &str, f: F) -> Self
    where
        F: Fn(&FormFieldDef, &SubmittedValue) -> QueryFormResult<String> + Send + Sync + 'static,
    {
        self.print_by_type.insert(key(type_name), Arc::new(f));
        self
    }

    /// Replaces the default AND composition of per-field predicates.
    #[must_use]
    pub fn compose<F>(mut self, f: F) -> Self
    where
        F: Fn(&BTreeMap<String, Q>) -> QueryFormResult<Option<Q>> + Send + Sync + 'static,
    {
        self.compose = Some(Arc::new(f));
        self
    }

    /// Returns the build override for a field and where it was found.
    pub fn build_for(&self, path: &str, leaf: &str, type_name: &str) -> Option<(&BuildFn, Strategy)> {
        lookup(&self.build_by_name, &self.build_by_type, path, leaf, type_name)
    }

    /// Returns the filter override for a field and where it was found.
    pub fn filter_for(
        &self,
        path: &str,
        leaf: &str,
        type_name: &str,
    ) -> Option<(&FilterFn, Strategy)> {
        lookup(&self.filter_by_name, &self.filter_by_type, path, leaf, type_name)
    }

    /// Returns the print override for a field and where it was found.
    pub fn print_for(&self, path: &str, leaf: &str, type_name: &str) -> Option<(&PrintFn, Strategy)> {
        lookup(&self.print_by_name, &self.print_by_type, path, leaf, type_name)
    }

    /// Returns the compose override, if any.
    pub fn compose_fn(&self) -> Option<&ComposeFn> {
        self.compose.as_ref()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.build_by_name.is_empty()
            && self.build_by_type.is_empty()
            && self.filter_by_name.is_empty()
            && self.filter_by_type.is_empty()
            && self.print_by_name.is_empty()
            && self.print_by_type.is_empty()
            && self.compose.is_none()
    }
}

fn lookup<'a, V>(
    names: &'a HashMap<String, V>,
    types: &'a HashMap<String, V>,
    path: &str,
    leaf: &str,
    type_name: &str,
) -> Option<(&'a V, Strategy)> {
    by_name(names, path, leaf)
        .map(|f| (f, Strategy::FieldOverride))
        .or_else(|| types.get(&key(type_name)).map(|f| (f, Strategy::TypeOverride)))
}
