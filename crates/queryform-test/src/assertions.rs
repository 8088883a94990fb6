//! Assertion helpers for query form tests.
//!
//! - [`assert_pks`] - Assert a queryset holds exactly the given integer pks
//! - [`assert_changed`] - Assert a bound form's changed fields
//! - [`assert_field_error`] - Assert a bound form recorded a field error

use queryform_db::query::QuerySet;
use queryform_db::value::Value;
use queryform_forms::form::Form;

/// Asserts that `queryset` holds exactly the records with the given integer
/// primary keys, in any order.
///
/// # Panics
///
/// Panics if the primary key sets differ.
pub fn assert_pks(queryset: &QuerySet, expected: &[i64]) {
    let mut actual: Vec<i64> = queryset.pks().iter().filter_map(Value::as_int).collect();
    actual.sort_unstable();
    let mut expected = expected.to_vec();
    expected.sort_unstable();
    assert_eq!(
        actual, expected,
        "Expected primary keys {expected:?}, found {actual:?}"
    );
}

/// Asserts that the form's changed fields are exactly `expected`.
///
/// # Panics
///
/// Panics if the changed set differs.
pub fn assert_changed(form: &dyn Form, expected: &[&str]) {
    let actual: Vec<&str> = form.changed_data().iter().map(String::as_str).collect();
    let mut expected = expected.to_vec();
    expected.sort_unstable();
    assert_eq!(actual, expected, "Changed fields differ");
}

/// Asserts that `field` has a validation error equal to `error`.
///
/// # Panics
///
/// Panics if the field has no such error.
pub fn assert_field_error(form: &dyn Form, field: &str, error: &str) {
    let errors = form.errors().get(field);
    assert!(
        errors.is_some_and(|errs| errs.iter().any(|e| e == error)),
        "Expected error '{error}' on field '{field}', got: {errors:?}"
    );
}
