//! Form field construction.
//!
//! [`build`] picks the first strategy that applies, in order:
//!
//! 1. a build override registered for the field's name
//! 2. a build override registered for the field's declared type
//! 3. the field's static choices, as a multiple-choice field
//! 4. numeric fields, as a range bounded by the stored min and max
//! 5. boolean-like fields, as Yes / No (/ Unknown) choices
//! 6. relational fields, as one choice per related record
//!
//! and fails with `UnsupportedField` when none does.

use queryform_core::error::Stage;
use queryform_core::{QueryFormError, QueryFormResult};
use queryform_db::model::ModelRef;
use queryform_db::query::QuerySet;
use queryform_db::value::Value;
use queryform_forms::fields::{pretty_name, FormFieldDef};

use crate::classify::{self, FieldCategory};
use crate::introspect::ResolvedField;
use crate::overrides::{Overrides, Strategy};

/// What a build override sees.
pub struct BuildContext<'a> {
    /// The form field name, the full `__` path.
    pub name: String,
    /// The resolved terminal field.
    pub resolved: &'a ResolvedField,
    /// The model the form is built for.
    pub root: &'a ModelRef,
}

impl BuildContext<'_> {
    /// `(min, max)` over the stored values along this field's path.
    pub fn bounds(&self) -> QueryFormResult<Option<(Value, Value)>> {
        if self.resolved.is_traversed() {
            QuerySet::all(self.root)?.aggregate_min_max(&self.name)
        } else {
            self.resolved.model.aggregate_min_max(self.resolved.leaf_name())
        }
    }

    /// `(v, v)` choices for the distinct stored values along this field's
    /// path.
    pub fn distinct_choices(&self) -> QueryFormResult<Vec<(Value, String)>> {
        classify::choices_from_distinct(self.root, &self.name)
    }

    /// The default label: the field's verbose name with its first letter
    /// capitalised.
    pub fn label(&self) -> String {
        let verbose = &self.resolved.field.verbose_name;
        if verbose.is_empty() {
            pretty_name(self.resolved.leaf_name())
        } else {
            capfirst(verbose)
        }
    }
}

/// A built form field and how it was built.
#[derive(Debug, Clone)]
pub struct BuiltField {
    /// The form field.
    pub spec: FormFieldDef,
    /// The model field it was built for.
    pub resolved: ResolvedField,
    /// The strategy that produced it.
    pub strategy: Strategy,
}

fn capfirst(s: &str) -> String {
    let mut chars = s.chars();
    chars
        .next()
        .map_or_else(String::new, |first| first.to_uppercase().chain(chars).collect())
}

/// Builds the form field for `resolved`.
pub fn build(
    resolved: &ResolvedField,
    root: &ModelRef,
    overrides: &Overrides,
) -> QueryFormResult<BuiltField> {
    let ctx = BuildContext {
        name: resolved.path.clone(),
        resolved,
        root,
    };
    let field = &resolved.field;

    let (spec, strategy) = if let Some((build_fn, strategy)) =
        overrides.build_for(&resolved.path, resolved.leaf_name(), resolved.type_name())
    {
        let mut spec = build_fn(&ctx)?;
        spec.name.clone_from(&resolved.path);
        (spec, strategy)
    } else if let Some(choices) = field.choices.as_ref().filter(|c| !c.is_empty()) {
        (choice_field(&ctx, choices.clone())?, Strategy::Choices)
    } else {
        let spec = match classify::classify(field) {
            FieldCategory::Numeric => {
                FormFieldDef::range(&ctx.name, ctx.bounds()?, field.null)
            }
            FieldCategory::BooleanLike => {
                choice_field(&ctx, classify::boolean_choices(field))?
            }
            FieldCategory::Relational => {
                choice_field(&ctx, classify::related_choices(field, &resolved.model)?)?
            }
            FieldCategory::Other => {
                return Err(QueryFormError::unsupported_field(
                    &resolved.path,
                    resolved.type_name(),
                    Stage::Build,
                ));
            }
        };
        (with_field_text(&ctx, spec), Strategy::Default)
    };

    tracing::debug!(
        field = %resolved.path,
        kind = %spec.kind(),
        strategy = %strategy,
        "Built query form field"
    );
    Ok(BuiltField {
        spec,
        resolved: resolved.clone(),
        strategy,
    })
}

fn choice_field(ctx: &BuildContext<'_>, choices: Vec<(Value, String)>) -> QueryFormResult<FormFieldDef> {
    FormFieldDef::multiple_choice(&ctx.name, choices).map(|spec| with_field_text(ctx, spec))
}

fn with_field_text(ctx: &BuildContext<'_>, spec: FormFieldDef) -> FormFieldDef {
    spec.label(ctx.label())
        .help_text(ctx.resolved.field.help_text.clone())
}
