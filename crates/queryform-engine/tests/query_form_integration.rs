//! End-to-end tests: build a query form over the test schema, bind a
//! submission, and check the filtered records and the printed query.

use queryform_core::{Settings, UnknownFieldPolicy};
use queryform_db::query::{Lookup, QuerySet, Q};
use queryform_db::value::Value;
use queryform_engine::{Overrides, QueryForm, QueryFormConfig, Strategy};
use queryform_forms::fields::{FormFieldDef, FormFieldType, SubmittedValue, WidgetKind};
use queryform_forms::QueryDict;
use queryform_test::fixtures::{populated, TestSchema, BASE};
use queryform_test::{assert_changed, assert_pks};

// ============================================================================
// Shared helpers
// ============================================================================

const DEFAULT_FIELDS: [&str; 6] = [
    "integer",
    "integer_with_choices",
    "float",
    "boolean",
    "null_boolean",
    "foreign_related",
];

fn config(schema: &TestSchema, include: &[&str]) -> QueryFormConfig {
    QueryFormConfig::new(schema.base.clone()).include(include.iter().copied())
}

fn bound(schema: &TestSchema, include: &[&str], query: &str) -> QueryForm {
    let mut form = QueryForm::new(config(schema, include)).unwrap();
    form.bind(&QueryDict::parse(query));
    form
}

fn text_overrides() -> Overrides {
    Overrides::new()
        .build_type("TextField", |ctx| {
            Ok(FormFieldDef::new(&ctx.name, FormFieldType::Char).label("Text contains"))
        })
        .filter_type("TextField", |path, value| match value {
            SubmittedValue::Single(v) => Ok(Q::filter(path, Lookup::IContains(v.to_string()))),
            _ => Ok(Q::And(vec![])),
        })
        .print_type("TextField", |_, value| match value {
            SubmittedValue::Single(v) => Ok(format!("\"{v}\"")),
            _ => Ok(String::new()),
        })
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_default_fields_build() {
    let schema = populated().unwrap();
    let form = QueryForm::new(config(&schema, &DEFAULT_FIELDS)).unwrap();
    assert_eq!(form.field_names(), DEFAULT_FIELDS);
    let kinds: Vec<WidgetKind> = form.fields().iter().map(|f| f.spec.kind()).collect();
    assert_eq!(
        kinds,
        [
            WidgetKind::Range,
            WidgetKind::MultiChoice,
            WidgetKind::Range,
            WidgetKind::MultiChoice,
            WidgetKind::MultiChoice,
            WidgetKind::MultiChoice,
        ]
    );
    assert!(form.fields().iter().all(|f| !f.spec.required));
}

#[test]
fn test_float_bounds_are_stored_min_max() {
    let schema = populated().unwrap();
    let form = QueryForm::new(config(&schema, &["float"])).unwrap();
    assert_eq!(
        form.field("float").unwrap().field_type,
        FormFieldType::Range {
            bounds: Some((Value::Float(0.11), Value::Float(16.0))),
            allow_null: false,
        }
    );
}

#[test]
fn test_text_field_without_override_is_unsupported() {
    let schema = populated().unwrap();
    let err = QueryForm::new(config(&schema, &["integer", "text"])).unwrap_err();
    assert_eq!(err.kind(), "unsupported_field");
    let msg = err.to_string();
    assert!(msg.contains("text"));
    assert!(msg.contains("textfield"));
}

#[test]
fn test_unknown_names_skipped_by_default() {
    let schema = populated().unwrap();
    let form = QueryForm::new(config(&schema, &["integer", "nope", "related_type__nope"])).unwrap();
    assert_eq!(form.field_names(), ["integer"]);
}

#[test]
fn test_unknown_names_rejected_when_strict() {
    let schema = populated().unwrap();
    let settings = Settings {
        unknown_fields: UnknownFieldPolicy::Reject,
        ..Settings::default()
    };
    let err = QueryForm::new(config(&schema, &["integer", "nope"]).settings(settings)).unwrap_err();
    assert_eq!(err.kind(), "field_not_found");
    assert!(err.to_string().contains("nope"));
}

#[test]
fn test_path_through_non_relation_fails_when_strict() {
    let schema = populated().unwrap();
    let settings = Settings {
        unknown_fields: UnknownFieldPolicy::Reject,
        ..Settings::default()
    };
    let err = QueryForm::new(config(&schema, &["integer__related_type", "float"]).settings(settings))
        .unwrap_err();
    assert_eq!(err.kind(), "traversal_error");
}

#[test]
fn test_path_through_non_relation_is_skipped_when_lenient() {
    let schema = populated().unwrap();
    let form = QueryForm::new(config(&schema, &["integer__x", "float"])).unwrap();
    assert_eq!(form.field_names(), ["float"]);
}

#[test]
fn test_traverse_through_non_relation_fails_when_lenient() {
    let schema = populated().unwrap();
    let err = QueryForm::new(config(&schema, &["float"]).traverse(["integer"])).unwrap_err();
    assert_eq!(err.kind(), "traversal_error");
}

#[test]
fn test_traversal_depth_is_capped() {
    let schema = populated().unwrap();
    let settings = Settings {
        max_traversal_depth: 0,
        unknown_fields: UnknownFieldPolicy::Reject,
        ..Settings::default()
    };
    let err = QueryForm::new(
        config(&schema, &["foreign_related__related_type"]).settings(settings.clone()),
    )
    .unwrap_err();
    assert_eq!(err.kind(), "traversal_error");

    let lenient = Settings {
        unknown_fields: UnknownFieldPolicy::Skip,
        ..settings
    };
    let form = QueryForm::new(
        config(&schema, &["foreign_related__related_type", "integer"]).settings(lenient),
    )
    .unwrap();
    assert_eq!(form.field_names(), ["integer"]);
}

#[test]
fn test_traverse_list_builds_related_fields() {
    let schema = populated().unwrap();
    let form = QueryForm::new(
        config(&schema, &["integer", "related_type"]).traverse(["foreign_related", "many_related"]),
    )
    .unwrap();
    assert_eq!(
        form.field_names(),
        [
            "integer",
            "related_type",
            "foreign_related__related_type",
            "many_related__related_type",
        ]
    );
    assert_eq!(form.field("related_type").unwrap().kind(), WidgetKind::MultiChoice);
    assert_eq!(form.field("many_related__related_type").unwrap().kind(), WidgetKind::Range);
}

#[test]
fn test_traverse_overlap_is_configuration_error() {
    let schema = populated().unwrap();
    let err = QueryForm::new(config(&schema, &["integer", "foreign_related"]).traverse(["foreign_related"]))
        .unwrap_err();
    assert_eq!(err.kind(), "configuration_error");
}

#[test]
fn test_traverse_non_relation_fails() {
    let schema = populated().unwrap();
    let err = QueryForm::new(config(&schema, &["integer"]).traverse(["float"])).unwrap_err();
    assert_eq!(err.kind(), "traversal_error");
    let err = QueryForm::new(config(&schema, &["integer"]).traverse(["missing"])).unwrap_err();
    assert_eq!(err.kind(), "field_not_found");
}

// ============================================================================
// Processing
// ============================================================================

#[test]
fn test_integer_range_excludes_outside_values() {
    let schema = populated().unwrap();
    let form = bound(&schema, &DEFAULT_FIELDS, "integer_0=12&integer_1=19");
    assert_changed(form.form(), &["integer"]);
    assert_pks(&form.process(None).unwrap(), &[1, 3, 4]);
}

#[test]
fn test_choices_are_ored() {
    let schema = populated().unwrap();
    let form = bound(
        &schema,
        &DEFAULT_FIELDS,
        "integer_with_choices=1&integer_with_choices=3",
    );
    assert_eq!(
        form.get_query().unwrap(),
        Some(Q::Or(vec![
            Q::filter("integer_with_choices", Lookup::Exact(Value::Int(1))),
            Q::filter("integer_with_choices", Lookup::Exact(Value::Int(3))),
        ]))
    );
    assert_pks(&form.process(None).unwrap(), &[1, 3]);
    let pretty = form.pretty_print_query(None).unwrap();
    assert_eq!(pretty.len(), 1);
    assert_eq!(pretty.get("Integer with choices"), Some("a,c"));
}

#[test]
fn test_fields_are_anded() {
    let schema = populated().unwrap();
    let form = bound(
        &schema,
        &DEFAULT_FIELDS,
        "integer_0=12&integer_1=19&boolean=true&float_0=10&float_1=20",
    );
    assert_pks(&form.process(None).unwrap(), &[1, 4]);
    assert_eq!(form.get_filters().unwrap().len(), 3);
}

#[test]
fn test_empty_submission_returns_everything() {
    let schema = populated().unwrap();
    let form = bound(&schema, &DEFAULT_FIELDS, "");
    assert!(form.get_query().unwrap().is_none());
    assert_pks(&form.process(None).unwrap(), &[1, 2, 3, 4]);
    assert!(form.pretty_print_query(None).unwrap().is_empty());
}

#[test]
fn test_process_narrows_given_queryset() {
    let schema = populated().unwrap();
    let form = bound(&schema, &DEFAULT_FIELDS, "integer_0=12&integer_1=19");
    let subset = QuerySet::all(&schema.base)
        .unwrap()
        .filter(&Q::filter("boolean", Lookup::Exact(Value::Bool(true))))
        .unwrap()
        .exclude(&Q::filter("integer", Lookup::Exact(Value::Int(19))))
        .unwrap();
    assert_pks(&form.process(Some(&subset)).unwrap(), &[1, 3]);

    let unfiltered = bound(&schema, &DEFAULT_FIELDS, "");
    assert_pks(&unfiltered.process(Some(&subset)).unwrap(), &[1, 3]);
}

#[test]
fn test_process_rejects_other_model() {
    let schema = populated().unwrap();
    let form = bound(&schema, &DEFAULT_FIELDS, "");
    let related = QuerySet::all(&schema.related).unwrap();
    assert_eq!(form.process(Some(&related)).unwrap_err().kind(), "type_mismatch");
}

#[test]
fn test_null_choice_matches_null_rows() {
    let schema = populated().unwrap();
    let form = bound(&schema, &DEFAULT_FIELDS, "null_boolean=NULL");
    assert_pks(&form.process(None).unwrap(), &[1, 4]);

    let form = bound(&schema, &DEFAULT_FIELDS, "null_boolean=false&null_boolean=NULL");
    assert_pks(&form.process(None).unwrap(), &[1, 3, 4]);
    assert_eq!(
        form.pretty_print_query(None).unwrap().get("Null boolean"),
        Some("No,Unknown")
    );
}

#[test]
fn test_invalid_range_is_ignored() {
    let schema = populated().unwrap();
    let form = bound(&schema, &DEFAULT_FIELDS, "integer_0=19&integer_1=12&boolean=false");
    assert_eq!(
        form.errors().get("integer"),
        Some(&vec!["Min must be less than or equal to Max".to_string()])
    );
    assert_pks(&form.process(None).unwrap(), &[2]);
}

#[test]
fn test_related_choices_filter() {
    let schema = populated().unwrap();
    schema.relate(1, "foreign_related", Value::Int(3)).unwrap();
    schema.relate(4, "foreign_related", Value::Int(3)).unwrap();
    let form = bound(&schema, &DEFAULT_FIELDS, "foreign_related=3");
    assert_pks(&form.process(None).unwrap(), &[1, 4]);
    assert_eq!(form.pretty_print_query(None).unwrap().get("Foreign related"), Some("6"));
}

#[test]
fn test_traversed_range_filter() {
    let schema = populated().unwrap();
    schema.relate(1, "related_type", Value::Int(1)).unwrap();
    let include = [
        "integer",
        "float",
        "related_type__related_type",
        "foreign_related__related_type",
        "many_related__related_type",
    ];
    let form = bound(
        &schema,
        &include,
        "related_type__related_type_0=0&related_type__related_type_1=4",
    );
    assert_eq!(form.fields().len(), 5);
    assert_pks(&form.process(None).unwrap(), &[1]);
}

#[test]
fn test_many_to_many_traversal_filter() {
    let schema = populated().unwrap();
    schema
        .relate(2, "many_related", Value::List(vec![Value::Int(3), Value::Int(4)]))
        .unwrap();
    schema
        .relate(3, "many_related", Value::List(vec![Value::Int(1)]))
        .unwrap();
    let form = bound(
        &schema,
        &["many_related__related_type"],
        "many_related__related_type_0=5&many_related__related_type_1=6",
    );
    assert_pks(&form.process(None).unwrap(), &[2]);
}

#[test]
fn test_include_empty_values() {
    let schema = populated().unwrap();
    schema.db.insert(BASE, vec![("integer", Value::Int(30))]).unwrap();
    let overrides = Overrides::new().build_field("float", |ctx| {
        Ok(FormFieldDef::range(&ctx.name, ctx.bounds()?, true).label(ctx.label()))
    });
    let mut form = QueryForm::new(config(&schema, &["float"]).overrides(overrides)).unwrap();
    assert_eq!(form.fields()[0].strategy, Strategy::FieldOverride);

    form.bind(&QueryDict::parse("float_0=9&float_1=13&float_2=on"));
    assert_pks(&form.process(None).unwrap(), &[1, 3, 5]);
    assert_eq!(
        form.pretty_print_query(None).unwrap().get("Float"),
        Some("9 - 13 (include empty values)")
    );

    form.bind(&QueryDict::parse("float_0=9&float_1=13"));
    assert_pks(&form.process(None).unwrap(), &[1, 3]);
}

// ============================================================================
// Overrides
// ============================================================================

#[test]
fn test_type_overrides_for_text() {
    let schema = populated().unwrap();
    let mut form =
        QueryForm::new(config(&schema, &["integer", "text"]).overrides(text_overrides())).unwrap();
    form.bind(&QueryDict::parse("text=BA"));
    assert_pks(&form.process(None).unwrap(), &[2, 3]);
    assert_eq!(form.pretty_print_query(None).unwrap().get("Text contains"), Some("\"BA\""));
}

#[test]
fn test_field_filter_override() {
    let schema = populated().unwrap();
    let overrides = Overrides::new().filter_field("integer", |path, value| {
        let range = value.as_range().map(|r| r.min.clone()).unwrap_or(Value::Null);
        Ok(Q::filter(path, Lookup::Gt(range)))
    });
    let mut form = QueryForm::new(config(&schema, &DEFAULT_FIELDS).overrides(overrides)).unwrap();
    form.bind(&QueryDict::parse("integer_0=12&integer_1=12"));
    assert_pks(&form.process(None).unwrap(), &[1, 4]);
}

#[test]
fn test_compose_override_ors_fields() {
    let schema = populated().unwrap();
    let overrides = Overrides::new().compose(|filters| {
        Ok(filters.values().cloned().reduce(|acc, q| acc | q))
    });
    let mut form = QueryForm::new(config(&schema, &DEFAULT_FIELDS).overrides(overrides)).unwrap();
    form.bind(&QueryDict::parse("integer_0=19&integer_1=19&integer_with_choices=1"));
    assert_pks(&form.process(None).unwrap(), &[1, 4]);
}

// ============================================================================
// Printing
// ============================================================================

#[test]
fn test_pretty_print_sorted_by_field_name() {
    let schema = populated().unwrap();
    let form = bound(
        &schema,
        &DEFAULT_FIELDS,
        "integer_0=12&integer_1=19&float_0=1&float_1=12.6&boolean=true",
    );
    let pretty = form.pretty_print_query(None).unwrap();
    let labels: Vec<&str> = pretty.iter().map(|(label, _)| label).collect();
    assert_eq!(labels, ["Boolean", "Float", "Integer"]);
    assert_eq!(pretty.get("Float"), Some("1.0 - 12.6"));
    assert_eq!(pretty, form.pretty_print_query(None).unwrap());
}

#[test]
fn test_pretty_print_subset() {
    let schema = populated().unwrap();
    let form = bound(&schema, &DEFAULT_FIELDS, "integer_0=12&integer_1=19&boolean=true");
    let pretty = form.pretty_print_query(Some(&["integer"][..])).unwrap();
    assert_eq!(pretty.len(), 1);
    assert_eq!(pretty.get("Integer"), Some("12 - 19"));

    let err = form.pretty_print_query(Some(&["integer", "float"][..])).unwrap_err();
    assert_eq!(err.kind(), "value_error");
}

#[test]
fn test_fingerprint_is_stable() {
    let schema = populated().unwrap();
    let first = bound(&schema, &DEFAULT_FIELDS, "integer_0=12&integer_1=19&boolean=true");
    let second = bound(&schema, &DEFAULT_FIELDS, "boolean=true&integer_1=19&integer_0=12");
    let other = bound(&schema, &DEFAULT_FIELDS, "integer_0=12&integer_1=15");

    let hash = first.query_fingerprint().unwrap();
    assert_eq!(hash.len(), 64);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(hash, second.query_fingerprint().unwrap());
    assert_ne!(hash, other.query_fingerprint().unwrap());

    let ints = bound(&schema, &DEFAULT_FIELDS, "float_0=9&float_1=16");
    let floats = bound(&schema, &DEFAULT_FIELDS, "float_0=9.0&float_1=16.0");
    assert_eq!(floats.pretty_print_query(None).unwrap().get("Float"), Some("9.0 - 16.0"));
    assert_ne!(
        ints.query_fingerprint().unwrap(),
        floats.query_fingerprint().unwrap()
    );
}
