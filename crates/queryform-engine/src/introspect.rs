//! Resolving `__` paths to terminal model fields.
//!
//! A path such as `related_type__related_type` names a field on the root
//! model followed by fields on each related model in turn. Every segment
//! except the last must be relational; the last segment is the terminal
//! field a form field is built for.

use queryform_core::{QueryFormError, QueryFormResult};
use queryform_db::fields::FieldDef;
use queryform_db::model::ModelRef;
use queryform_db::query::LOOKUP_SEP;

/// Default maximum number of relation hops a path may take.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// A path resolved against a root model.
#[derive(Clone)]
pub struct ResolvedField {
    /// The full `__` path, as configured.
    pub path: String,
    /// The terminal field.
    pub field: FieldDef,
    /// The model that owns the terminal field.
    pub model: ModelRef,
    /// The relational field names crossed to reach the terminal model.
    pub hops: Vec<String>,
}

impl std::fmt::Debug for ResolvedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedField")
            .field("path", &self.path)
            .field("field", &self.field.name)
            .field("model", &self.model.meta().label())
            .field("hops", &self.hops)
            .finish()
    }
}

impl ResolvedField {
    /// Returns the terminal field's name, the last path segment.
    pub fn leaf_name(&self) -> &str {
        &self.field.name
    }

    /// Returns `true` if the path crosses at least one relation.
    pub fn is_traversed(&self) -> bool {
        !self.hops.is_empty()
    }

    /// Returns the declared class name of the terminal field.
    pub fn type_name(&self) -> &'static str {
        self.field.internal_type()
    }
}

fn split_path(path: &str) -> QueryFormResult<Vec<&str>> {
    let segments: Vec<&str> = path.split(LOOKUP_SEP).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(QueryFormError::FieldNotFound(format!(
            "'{path}' is not a valid field path"
        )));
    }
    Ok(segments)
}

/// Resolves `path` against `root` with the default depth limit.
pub fn resolve(path: &str, root: &ModelRef) -> QueryFormResult<ResolvedField> {
    resolve_with_depth(path, root, DEFAULT_MAX_DEPTH)
}

/// Resolves `path` against `root`, crossing at most `max_depth` relations.
///
/// # Errors
///
/// - `FieldNotFound` if any segment names no field on the model in scope
/// - `TraversalError` if a non-final segment is not relational, or the path
///   is deeper than `max_depth`
pub fn resolve_with_depth(
    path: &str,
    root: &ModelRef,
    max_depth: usize,
) -> QueryFormResult<ResolvedField> {
    let segments = split_path(path)?;
    let hop_count = segments.len() - 1;
    if hop_count > max_depth {
        return Err(QueryFormError::TraversalError(format!(
            "Path '{path}' crosses {hop_count} relations, more than the limit of {max_depth}"
        )));
    }

    let mut model = ModelRef::clone(root);
    let mut hops = Vec::with_capacity(hop_count);
    for segment in &segments[..hop_count] {
        let next = step(&model, segment)?;
        hops.push((*segment).to_string());
        model = next;
    }

    let leaf = segments[hop_count];
    let field = model.get_field(leaf)?.clone();
    tracing::trace!(path, model = %model.meta().label(), "Resolved field path");
    Ok(ResolvedField {
        path: path.to_string(),
        field,
        model,
        hops,
    })
}

/// Follows a relation path whose every segment is relational, returning the
/// model at its end.
pub fn resolve_relation_chain(
    path: &str,
    root: &ModelRef,
    max_depth: usize,
) -> QueryFormResult<ModelRef> {
    let segments = split_path(path)?;
    if segments.len() > max_depth {
        return Err(QueryFormError::TraversalError(format!(
            "Path '{path}' crosses {} relations, more than the limit of {max_depth}",
            segments.len()
        )));
    }
    let mut model = ModelRef::clone(root);
    for segment in segments {
        model = step(&model, segment)?;
    }
    Ok(model)
}

fn step(model: &ModelRef, segment: &str) -> QueryFormResult<ModelRef> {
    let field = model.get_field(segment)?;
    if !field.is_relation() {
        return Err(QueryFormError::TraversalError(format!(
            "Field {segment} on {} is not a relation",
            model.meta().label()
        )));
    }
    model.related_model(field)
}
