//! In-memory predicate evaluation.
//!
//! [`Evaluator`] walks `__`-separated field paths through relations and
//! decides whether a record satisfies a [`Q`] tree. A path that crosses a
//! many-valued hop yields every reachable value, and a lookup matches when
//! any of them matches. NULL tests (`IsNull(true)` and `Exact(Null)`) match
//! when the path yields no non-null value.

use std::collections::HashMap;
use std::sync::Arc;

use queryform_core::{QueryFormError, QueryFormResult};

use super::lookups::{Lookup, Q};
use crate::model::{ModelRef, Record};
use crate::value::Value;

/// The separator between relation hops in a field path.
pub const LOOKUP_SEP: &str = "__";

/// Evaluates predicates against the records of one model.
///
/// Related records and compiled regular expressions are cached for the
/// lifetime of the evaluator, so one evaluator should serve a whole filter
/// pass.
pub struct Evaluator {
    root: ModelRef,
    related: HashMap<String, Arc<HashMap<String, Record>>>,
    regexes: HashMap<(String, bool), regex::Regex>,
}

impl Evaluator {
    /// Creates an evaluator rooted at `model`.
    pub fn new(model: ModelRef) -> Self {
        Self {
            root: model,
            related: HashMap::new(),
            regexes: HashMap::new(),
        }
    }

    /// Returns every value reachable from `record` along `path`.
    ///
    /// The segment `pk` reads the primary key of the record in scope.
    pub fn values_for(&mut self, record: &Record, path: &str) -> QueryFormResult<Vec<Value>> {
        let segments: Vec<&str> = path.split(LOOKUP_SEP).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(QueryFormError::InvalidPredicate(format!(
                "Malformed field path '{path}'"
            )));
        }
        let root = Arc::clone(&self.root);
        let mut out = Vec::new();
        self.walk(&root, record, &segments, &mut out)?;
        Ok(out)
    }

    fn walk(
        &mut self,
        model: &ModelRef,
        record: &Record,
        segments: &[&str],
        out: &mut Vec<Value>,
    ) -> QueryFormResult<()> {
        let Some((head, rest)) = segments.split_first() else {
            return Ok(());
        };
        if *head == "pk" {
            if rest.is_empty() {
                out.push(record.pk.clone());
                return Ok(());
            }
            return Err(QueryFormError::TraversalError(format!(
                "Cannot traverse past 'pk' on {}",
                model.meta().label()
            )));
        }

        let field = model.get_field(head)?;
        let value = record.get(head);
        if rest.is_empty() {
            out.extend(value.scalars().cloned());
            return Ok(());
        }

        if !field.is_relation() {
            return Err(QueryFormError::TraversalError(format!(
                "Field '{head}' on {} is not a relation",
                model.meta().label()
            )));
        }
        let target = model.related_model(field)?;
        let index = self.related_index(&target)?;
        for key in value.scalars().filter(|v| !v.is_null()) {
            if let Some(related) = index.get(&key.to_string()) {
                self.walk(&target, related, rest, out)?;
            }
        }
        Ok(())
    }

    fn related_index(&mut self, model: &ModelRef) -> QueryFormResult<Arc<HashMap<String, Record>>> {
        let label = model.meta().label();
        if let Some(index) = self.related.get(&label) {
            return Ok(Arc::clone(index));
        }
        let index: HashMap<String, Record> = model
            .records()?
            .into_iter()
            .map(|r| (r.pk.to_string(), r))
            .collect();
        let index = Arc::new(index);
        self.related.insert(label, Arc::clone(&index));
        Ok(index)
    }

    /// Returns `true` if `record` satisfies `q`.
    ///
    /// An empty AND is true and an empty OR is false.
    pub fn matches(&mut self, q: &Q, record: &Record) -> QueryFormResult<bool> {
        match q {
            Q::Filter { field, lookup } => {
                let values = self.values_for(record, field)?;
                self.lookup_matches(lookup, &values)
            }
            Q::And(children) => {
                for child in children {
                    if !self.matches(child, record)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Q::Or(children) => {
                for child in children {
                    if self.matches(child, record)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Q::Not(inner) => Ok(!self.matches(inner, record)?),
        }
    }

    fn lookup_matches(&mut self, lookup: &Lookup, values: &[Value]) -> QueryFormResult<bool> {
        let present = || values.iter().filter(|v| !v.is_null());
        let ordered = |pred: fn(std::cmp::Ordering) -> bool, rhs: &Value| {
            present().any(|v| v.partial_cmp(rhs).is_some_and(pred))
        };
        Ok(match lookup {
            Lookup::Exact(Value::Null) | Lookup::IsNull(true) => present().next().is_none(),
            Lookup::IsNull(false) => present().next().is_some(),
            Lookup::Exact(rhs) => present().any(|v| v.loosely_equals(rhs)),
            Lookup::IExact(rhs) => {
                let rhs = rhs.to_string().to_lowercase();
                present().any(|v| v.to_string().to_lowercase() == rhs)
            }
            Lookup::Contains(s) => present().any(|v| v.to_string().contains(s.as_str())),
            Lookup::IContains(s) => {
                let s = s.to_lowercase();
                present().any(|v| v.to_string().to_lowercase().contains(&s))
            }
            Lookup::In(options) => present().any(|v| options.iter().any(|o| v.loosely_equals(o))),
            Lookup::Gt(rhs) => ordered(std::cmp::Ordering::is_gt, rhs),
            Lookup::Gte(rhs) => ordered(std::cmp::Ordering::is_ge, rhs),
            Lookup::Lt(rhs) => ordered(std::cmp::Ordering::is_lt, rhs),
            Lookup::Lte(rhs) => ordered(std::cmp::Ordering::is_le, rhs),
            Lookup::Range(lo, hi) => present().any(|v| {
                v.partial_cmp(lo).is_some_and(std::cmp::Ordering::is_ge)
                    && v.partial_cmp(hi).is_some_and(std::cmp::Ordering::is_le)
            }),
            Lookup::Regex(pattern) | Lookup::IRegex(pattern) => {
                let insensitive = matches!(lookup, Lookup::IRegex(_));
                let re = self.regex(pattern, insensitive)?;
                present().any(|v| re.is_match(&v.to_string()))
            }
        })
    }

    fn regex(&mut self, pattern: &str, insensitive: bool) -> QueryFormResult<regex::Regex> {
        let key = (pattern.to_string(), insensitive);
        if let Some(re) = self.regexes.get(&key) {
            return Ok(re.clone());
        }
        let re = regex::RegexBuilder::new(pattern)
            .case_insensitive(insensitive)
            .build()
            .map_err(|e| {
                QueryFormError::InvalidPredicate(format!("Invalid regex '{pattern}': {e}"))
            })?;
        self.regexes.insert(key, re.clone());
        Ok(re)
    }
}
