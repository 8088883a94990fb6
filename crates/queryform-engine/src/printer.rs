//! Human-readable rendering of selections.
//!
//! Dispatch mirrors [`resolver`](crate::resolver): a print override for the
//! field's name, then its type, then the default for the submitted kind.

use queryform_core::error::Stage;
use queryform_core::{QueryFormError, QueryFormResult};
use queryform_db::value::Value;
use queryform_forms::fields::{FormFieldDef, RangeValue, SubmittedValue};

use crate::builder::BuiltField;
use crate::overrides::Overrides;

/// `"{min} - {max}"`, with `" (include empty values)"` appended when empty
/// values are included.
///
/// Float bounds keep a decimal point, so `9.0` never prints like the
/// integer `9`.
pub fn range_print(range: &RangeValue) -> String {
    let mut out = format!("{} - {}", bound_text(&range.min), bound_text(&range.max));
    if range.allow_empty {
        out.push_str(" (include empty values)");
    }
    out
}

fn bound_text(bound: &Value) -> String {
    match bound {
        Value::Float(v) => format!("{v:?}"),
        other => other.to_string(),
    }
}

/// The display labels of the selected choices, comma-joined.
pub fn multichoice_print(spec: &FormFieldDef, selected: &[Value]) -> QueryFormResult<String> {
    let labels = selected
        .iter()
        .map(|value| {
            spec.choice_label(value).ok_or_else(|| {
                QueryFormError::ValueError(format!(
                    "{value} is not one of the choices of field {}",
                    spec.name
                ))
            })
        })
        .collect::<QueryFormResult<Vec<&str>>>()?;
    Ok(labels.join(","))
}

/// Renders one changed field's submitted value.
pub fn render_field(
    built: &BuiltField,
    value: &SubmittedValue,
    overrides: &Overrides,
) -> QueryFormResult<String> {
    let spec = &built.spec;
    let resolved = &built.resolved;
    if let Some((print_fn, _)) = overrides.print_for(&spec.name, resolved.leaf_name(), resolved.type_name()) {
        return print_fn(spec, value);
    }
    match value {
        SubmittedValue::Range(range) => Ok(range_print(range)),
        SubmittedValue::Choices(selected) => multichoice_print(spec, selected),
        SubmittedValue::Single(_) => Err(QueryFormError::unsupported_field(
            &spec.name,
            resolved.type_name(),
            Stage::Print,
        )),
    }
}
