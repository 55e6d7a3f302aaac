use json_schema::{
    create_schema, create_schema_async, CompilationError, CompilationOptions, Draft,
    FormatRegistry, ValidationOptions,
};
use serde_json::{json, Value};
use test_case::test_case;

fn compiled(schema: Value) -> json_schema::Schema {
    create_schema(&schema, None).unwrap()
}

#[test]
fn verdict_agrees_with_error_list() {
    let cases = [
        (json!({"type": "integer"}), json!(3)),
        (json!({"type": "integer"}), json!("3")),
        (json!({"minLength": 2, "pattern": "^a"}), json!("b")),
        (
            json!({"properties": {"a": {"minimum": 0}}, "required": ["b"]}),
            json!({"a": -1}),
        ),
        (json!({"oneOf": [{"type": "string"}, {"maxLength": 3}]}), json!("hi")),
    ];
    for (schema, instance) in cases {
        let schema = compiled(schema);
        assert_eq!(
            schema.is_valid(&instance),
            schema.validate_with_errors(&instance).is_empty()
        );
    }
}

#[test]
fn boolean_schemas() {
    let accept = compiled(json!(true));
    let reject = compiled(json!(false));
    for instance in [json!(null), json!(1), json!("x"), json!([1]), json!({"a": 1})] {
        assert!(accept.is_valid(&instance));
        assert!(!reject.is_valid(&instance));
    }
    let error = &reject.validate_with_errors(&json!(1))[0];
    assert_eq!(error.instance_path, "");
    assert_eq!(format!("{}", error), "# (root): False schema does not allow '1'");
}

#[test]
fn double_negation_preserves_acceptance() {
    let inner = json!({"type": "integer", "minimum": 0});
    let doubled = compiled(json!({"not": {"not": inner.clone()}}));
    let plain = compiled(inner);
    for instance in [json!(5), json!(-2), json!("x")] {
        assert_eq!(plain.is_valid(&instance), doubled.is_valid(&instance));
    }
}

// Scenario: an integral float is an integer from draft-06 on.
#[test_case(Draft::Draft4, false)]
#[test_case(Draft::Draft6, true)]
#[test_case(Draft::Draft7, true)]
fn integral_float_against_integer(draft: Draft, expected: bool) {
    let schema = create_schema(&json!({"type": "integer"}), Some(draft)).unwrap();
    assert_eq!(schema.is_valid(&json!(3.0)), expected);
    assert!(schema.is_valid(&json!(3)));
    assert!(!schema.is_valid(&json!(3.5)));
}

#[test]
fn one_of_with_two_matching_branches() {
    let schema = compiled(json!({"oneOf": [{"type": "string"}, {"maxLength": 3}]}));
    assert!(!schema.is_valid(&json!("hi")));
    let errors = schema.validate_with_errors(&json!("hi"));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].schema_path, "/oneOf");
    assert_eq!(
        errors[0].message,
        "'\"hi\"' is valid under more than one of the given schemas"
    );
    // A long non-string matches neither branch
    assert!(!schema.is_valid(&json!(12345)));
    // A long string matches exactly one
    assert!(schema.is_valid(&json!("long enough")));
}

#[test]
fn tuple_items_with_additional_items_false() {
    let schema = compiled(json!({
        "type": "array",
        "items": [{"type": "integer"}, {"type": "string"}],
        "additionalItems": false
    }));
    assert!(schema.is_valid(&json!([1, "a"])));
    assert!(schema.is_valid(&json!([1])));
    let errors = schema.validate_with_errors(&json!([1, "a", true]));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].schema_path, "/additionalItems");
    assert_eq!(
        errors[0].message,
        "Additional items are not allowed (true was unexpected)"
    );
}

#[test]
fn conditional_validation() {
    let schema = compiled(json!({
        "if": {"type": "integer"},
        "then": {"minimum": 0},
        "else": {"type": "string"}
    }));
    assert!(!schema.is_valid(&json!(-1)));
    assert!(schema.is_valid(&json!(7)));
    assert!(schema.is_valid(&json!("foo")));
    assert!(!schema.is_valid(&json!(1.5)));

    let errors = schema.validate_with_errors(&json!(-1));
    assert_eq!(errors[0].schema_path, "/then");
    assert!(errors
        .iter()
        .any(|error| error.schema_path == "/then/minimum"));
}

#[test]
fn conditional_without_branches_is_inert() {
    let schema = compiled(json!({"if": {"type": "integer"}}));
    assert!(schema.is_valid(&json!(1)));
    assert!(schema.is_valid(&json!("x")));
}

#[test]
fn local_ref_to_definition() {
    let schema = compiled(json!({
        "definitions": {"n": {"type": "number"}},
        "$ref": "#/definitions/n"
    }));
    assert!(schema.is_valid(&json!(7)));
    let errors = schema.validate_with_errors(&json!("x"));
    assert_eq!(errors.len(), 1);
    // The error points into the referenced definition
    assert_eq!(errors[0].schema_path, "/definitions/n/type");
}

#[test]
fn ref_cycle_fails_compilation() {
    let schema = json!({
        "definitions": {"a": {"$ref": "#/definitions/a"}},
        "$ref": "#/definitions/a"
    });
    assert!(matches!(
        create_schema(&schema, None),
        Err(CompilationError::RefCycle { .. })
    ));
}

#[test]
fn recursive_schema_through_properties_is_fine() {
    let schema = compiled(json!({
        "type": "object",
        "properties": {
            "value": {"type": "integer"},
            "next": {"$ref": "#"}
        },
        "required": ["value"]
    }));
    assert!(schema.is_valid(&json!({"value": 1, "next": {"value": 2}})));
    assert!(!schema.is_valid(&json!({"value": 1, "next": {"value": "x"}})));
    assert!(!schema.is_valid(&json!({"value": 1, "next": {}})));
}

#[test]
fn unique_items_reports_first_offending_pair() {
    let schema = compiled(json!({"uniqueItems": true}));
    assert!(schema.is_valid(&json!([1, 2, 3])));
    assert!(schema.is_valid(&json!([1, "1", true])));
    assert!(!schema.is_valid(&json!([1, 2, 1.0])));
    let errors = schema.validate_with_errors(&json!([0, 0, 1, 1]));
    assert_eq!(errors.len(), 1);
}

#[test_case(6, 3, true)]
#[test_case(7, 3, false)]
#[test_case(0, 3, true)]
#[test_case(-9, 3, true)]
fn integer_multiple_of(instance: i64, multiple: i64, expected: bool) {
    let schema = compiled(json!({"type": "integer", "multipleOf": multiple}));
    assert_eq!(schema.is_valid(&json!(instance)), expected);
}

#[test]
fn float_multiple_of() {
    let schema = compiled(json!({"multipleOf": 0.5}));
    assert!(schema.is_valid(&json!(4.5)));
    assert!(!schema.is_valid(&json!(4.7)));
}

#[test]
fn string_length_counts_scalar_values() {
    let schema = compiled(json!({"type": "string", "minLength": 2, "maxLength": 3}));
    assert!(schema.is_valid(&json!("ab")));
    assert!(schema.is_valid(&json!("äöü")));
    assert!(schema.is_valid(&json!("日本語")));
    assert!(!schema.is_valid(&json!("a")));
    assert!(!schema.is_valid(&json!("abcd")));
}

#[test]
fn required_properties() {
    let schema = compiled(json!({"required": ["a", "b"]}));
    assert!(schema.is_valid(&json!({"a": 1, "b": 2, "c": 3})));
    let errors = schema.validate_with_errors(&json!({"a": 1}));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "'b' is a required property");
    // Non-objects are untouched by object keywords
    assert!(schema.is_valid(&json!(42)));
}

#[test]
fn const_and_enum() {
    let null_const = compiled(json!({"const": null}));
    assert!(null_const.is_valid(&json!(null)));
    assert!(!null_const.is_valid(&json!(0)));

    let schema = compiled(json!({"enum": [1, "two", [3], {"four": 4}, null]}));
    assert!(schema.is_valid(&json!(1.0)));
    assert!(schema.is_valid(&json!({"four": 4.0})));
    assert!(!schema.is_valid(&json!("three")));
}

#[test]
fn property_coverage_and_additional_properties() {
    let schema = compiled(json!({
        "properties": {"a": {"type": "integer"}},
        "patternProperties": {"^x-": {"type": "string"}},
        "additionalProperties": false
    }));
    assert!(schema.is_valid(&json!({"a": 1, "x-note": "hi"})));
    let errors = schema.validate_with_errors(&json!({"b": 2}));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].instance_path, "/b");
    assert_eq!(
        errors[0].message,
        "Additional properties are not allowed ('b' was unexpected)"
    );

    let lenient = compiled(json!({
        "properties": {"a": {"type": "integer"}},
        "additionalProperties": {"type": "string"}
    }));
    assert!(lenient.is_valid(&json!({"a": 1, "b": "x"})));
    assert!(!lenient.is_valid(&json!({"a": 1, "b": 2})));
}

#[test]
fn property_names() {
    let schema = compiled(json!({"propertyNames": {"maxLength": 3}}));
    assert!(schema.is_valid(&json!({"abc": 1})));
    assert!(!schema.is_valid(&json!({"abcd": 1})));
}

#[test]
fn dependencies_as_keys_and_schema() {
    let schema = compiled(json!({
        "dependencies": {
            "credit_card": ["billing_address"],
            "shipping": {"required": ["address"]}
        }
    }));
    assert!(schema.is_valid(&json!({"credit_card": 1, "billing_address": "x"})));
    assert!(!schema.is_valid(&json!({"credit_card": 1})));
    assert!(!schema.is_valid(&json!({"shipping": true})));
    assert!(schema.is_valid(&json!({"shipping": true, "address": "x"})));
    assert!(schema.is_valid(&json!({})));

    let errors = schema.validate_with_errors(&json!({"credit_card": 1}));
    assert_eq!(errors[0].message, "'billing_address' is a dependency of 'credit_card'");
}

#[test]
fn pattern_is_unanchored() {
    let schema = compiled(json!({"pattern": "b.t"}));
    assert!(schema.is_valid(&json!("rabbit bites")));
    assert!(!schema.is_valid(&json!("carrot")));
    // Non-strings are not checked
    assert!(schema.is_valid(&json!(1)));
}

#[test]
fn contains_keyword() {
    let schema = compiled(json!({"contains": {"type": "integer"}}));
    assert!(schema.is_valid(&json!(["a", 1])));
    assert!(!schema.is_valid(&json!(["a", "b"])));
}

#[test]
fn draft4_exclusive_bounds_are_flags() {
    let schema = create_schema(
        &json!({"maximum": 10, "exclusiveMaximum": true, "minimum": 0, "exclusiveMinimum": false}),
        Some(Draft::Draft4),
    )
    .unwrap();
    assert!(!schema.is_valid(&json!(10)));
    assert!(schema.is_valid(&json!(9)));
    assert!(schema.is_valid(&json!(0)));
    assert!(!schema.is_valid(&json!(-1)));
}

#[test]
fn draft6_numeric_exclusive_takes_precedence_over_maximum() {
    let schema = compiled(json!({"maximum": 100, "exclusiveMaximum": 10}));
    let errors = schema.validate_with_errors(&json!(50));
    // Only the exclusive bound is checked when both are present
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].schema_path, "/exclusiveMaximum");
}

#[test]
fn multiple_errors_are_collected_and_fast_fail_keeps_one() {
    let schema = compiled(json!({"minProperties": 2, "propertyNames": {"minLength": 3}}));
    let instance = json!({"a": 3});
    let errors = schema.validate_with_errors(&instance);
    assert!(errors.len() >= 2);
    assert!(!schema.validate(&instance, &ValidationOptions::new()));
}

#[test]
fn error_paths_are_json_pointers() {
    let schema = compiled(json!({
        "properties": {
            "items": {"items": {"properties": {"deep": {"type": "integer"}}}}
        }
    }));
    let errors =
        schema.validate_with_errors(&json!({"items": [{"deep": 1}, {"deep": "oops"}]}));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].instance_path, "/items/1/deep");
    assert_eq!(
        errors[0].schema_path,
        "/properties/items/items/properties/deep/type"
    );
}

#[test]
fn parse_json_option() {
    let schema = compiled(json!({"type": "object", "required": ["a"]}));
    let options = ValidationOptions::new().with_parse_json(true);
    assert!(schema.validate(&json!("{\"a\": 1}"), &options));
    assert!(!schema.validate(&json!("{}"), &options));
    // Broken JSON text is a validation failure, not a panic
    assert!(!schema.validate(&json!("{"), &options));
    let errors =
        schema.validate_with_errors_and_options(&json!("{"), &options);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.starts_with("Invalid JSON input"));
}

#[test]
fn format_validation_can_be_disabled() {
    let schema = compiled(json!({"format": "ipv4"}));
    assert!(!schema.is_valid(&json!("not an ip")));
    let options = ValidationOptions::new().with_validate_formats(false);
    assert!(schema.validate(&json!("not an ip"), &options));
    // Formats only apply to strings
    assert!(schema.is_valid(&json!(17)));
}

#[test]
fn custom_format_registry() {
    let mut options = CompilationOptions::default();
    options.with_format_registry(
        FormatRegistry::default().with_email(|value| value.ends_with("@example.com")),
    );
    let schema = options.compile(&json!({"format": "email"})).unwrap();
    assert!(schema.is_valid(&json!("user@example.com")));
    assert!(!schema.is_valid(&json!("user@other.org")));
}

#[test]
fn resolve_path_walks_into_sub_schemas() {
    let schema = compiled(json!({
        "definitions": {"n": {"type": "number", "title": "a number"}},
        "properties": {"a": {"$ref": "#/definitions/n"}}
    }));
    let resolved = schema.resolve_path("#/definitions/n").unwrap();
    assert_eq!(resolved.schema_path(), "/definitions/n");
    assert_eq!(resolved.title(), Some("a number"));
    assert!(resolved.is_valid(&json!(3)));
    assert!(!resolved.is_valid(&json!("3")));

    // Following a property that is a ref lands on the ref's target
    let through_ref = schema.resolve_path("/properties/a").unwrap();
    assert_eq!(through_ref.schema_path(), "/definitions/n");

    assert!(matches!(
        schema.resolve_path("#/definitions/missing"),
        Err(CompilationError::UnresolvableRef { .. })
    ));
}

#[test]
fn sync_provider_supplies_remote_documents() {
    let mut documents = std::collections::HashMap::new();
    documents.insert(
        "http://example.com/integer.json".to_string(),
        json!({"type": "integer"}),
    );
    let mut options = CompilationOptions::default();
    options.with_provider(documents);
    let schema = options
        .compile(&json!({"$ref": "http://example.com/integer.json"}))
        .unwrap();
    assert!(schema.is_valid(&json!(1)));
    assert!(!schema.is_valid(&json!("1")));
}

#[test]
fn sync_provider_fragment_into_remote_document() {
    let mut documents = std::collections::HashMap::new();
    documents.insert(
        "http://example.com/defs.json".to_string(),
        json!({"definitions": {"positive": {"minimum": 1}}}),
    );
    let mut options = CompilationOptions::default();
    options.with_provider(documents);
    let schema = options
        .compile(&json!({"$ref": "http://example.com/defs.json#/definitions/positive"}))
        .unwrap();
    assert!(schema.is_valid(&json!(3)));
    assert!(!schema.is_valid(&json!(0)));
}

#[test]
fn missing_remote_document_is_a_compile_error() {
    let error = create_schema(
        &json!({"$ref": "http://example.com/nowhere.json"}),
        None,
    )
    .unwrap_err();
    assert!(matches!(error, CompilationError::UnresolvableRef { .. }));
}

#[test]
fn relative_refs_resolve_against_the_base_uri() {
    let mut documents = std::collections::HashMap::new();
    documents.insert(
        "http://example.com/schemas/integer.json".to_string(),
        json!({"type": "integer"}),
    );
    let mut options = CompilationOptions::default();
    options
        .with_base_uri("http://example.com/schemas/root.json")
        .with_provider(documents);
    let schema = options.compile(&json!({"$ref": "integer.json"})).unwrap();
    assert!(schema.is_valid(&json!(1)));
}

#[test]
fn embedded_id_changes_the_base() {
    let mut documents = std::collections::HashMap::new();
    documents.insert(
        "http://example.com/folder/item.json".to_string(),
        json!({"type": "string"}),
    );
    let mut options = CompilationOptions::default();
    options.with_provider(documents);
    let schema = options
        .compile(&json!({
            "$id": "http://example.com/root.json",
            "properties": {
                "list": {
                    "$id": "folder/",
                    "items": {"$ref": "item.json"}
                }
            }
        }))
        .unwrap();
    assert!(schema.is_valid(&json!({"list": ["a", "b"]})));
    assert!(!schema.is_valid(&json!({"list": [1]})));
}

#[test]
fn remote_document_keeps_its_own_draft() {
    // The remote document declares draft-04, where 3.0 is not an integer
    let mut documents = std::collections::HashMap::new();
    documents.insert(
        "http://example.com/old.json".to_string(),
        json!({
            "$schema": "http://json-schema.org/draft-04/schema#",
            "type": "integer"
        }),
    );
    let mut options = CompilationOptions::default();
    options.with_provider(documents);
    let schema = options
        .compile(&json!({"$ref": "http://example.com/old.json"}))
        .unwrap();
    assert!(!schema.is_valid(&json!(3.0)));
    assert!(schema.is_valid(&json!(3)));
}

struct MapProvider(std::collections::HashMap<String, Value>);

#[async_trait::async_trait]
impl json_schema::AsyncSchemaProvider for MapProvider {
    async fn provide(&self, uri: &str) -> Option<json_schema::ProvidedSchema> {
        self.0
            .get(uri)
            .cloned()
            .map(json_schema::ProvidedSchema::Raw)
    }
}

#[tokio::test]
async fn async_compilation_fans_out_over_the_provider() {
    let mut documents = std::collections::HashMap::new();
    documents.insert(
        "http://example.com/a.json".to_string(),
        json!({"type": "integer"}),
    );
    documents.insert(
        "http://example.com/b.json".to_string(),
        // This document drags in one more
        json!({"items": {"$ref": "http://example.com/a.json"}}),
    );
    let mut options = CompilationOptions::default();
    options.with_async_provider(MapProvider(documents));
    let schema = options
        .compile_async(&json!({
            "properties": {
                "a": {"$ref": "http://example.com/a.json"},
                "b": {"$ref": "http://example.com/b.json"}
            }
        }))
        .await
        .unwrap();
    assert!(schema.is_valid(&json!({"a": 1, "b": [2, 3]})));
    assert!(!schema.is_valid(&json!({"a": "x"})));
    assert!(!schema.is_valid(&json!({"b": ["x"]})));
}

#[tokio::test]
async fn async_compilation_without_remote_refs_needs_no_network() {
    let schema = create_schema_async(&json!({"type": "string"}), None)
        .await
        .unwrap();
    assert!(schema.is_valid(&json!("x")));
}

#[tokio::test]
async fn compile_url_uses_the_provider() {
    let mut documents = std::collections::HashMap::new();
    documents.insert(
        "http://example.com/root.json".to_string(),
        json!({"definitions": {"n": {"type": "number"}}, "$ref": "#/definitions/n"}),
    );
    let mut options = CompilationOptions::default();
    options.with_async_provider(MapProvider(documents));
    let schema = options.compile_url("http://example.com/root.json").await.unwrap();
    assert!(schema.is_valid(&json!(7)));
    assert!(!schema.is_valid(&json!("x")));
}

#[test]
fn provider_can_hand_back_a_compiled_schema() {
    let shared = compiled(json!({"type": "integer", "minimum": 0}));

    struct SharedProvider(json_schema::Schema);
    impl json_schema::SchemaProvider for SharedProvider {
        fn provide(&self, uri: &str) -> Option<json_schema::ProvidedSchema> {
            if uri == "http://example.com/shared.json" {
                Some(json_schema::ProvidedSchema::Compiled(self.0.clone()))
            } else {
                None
            }
        }
    }

    let mut options = CompilationOptions::default();
    options.with_provider(SharedProvider(shared));
    let schema = options
        .compile(&json!({"items": {"$ref": "http://example.com/shared.json"}}))
        .unwrap();
    assert!(schema.is_valid(&json!([0, 1, 2])));
    assert!(!schema.is_valid(&json!([-1])));
}

#[test]
fn annotations_are_kept_but_not_applied() {
    let schema = compiled(json!({
        "title": "thing",
        "description": "a thing",
        "default": {"a": 1},
        "examples": [1, 2],
        "readOnly": true,
        "contentMediaType": "application/json",
        "type": "object"
    }));
    assert_eq!(schema.title(), Some("thing"));
    assert_eq!(schema.description(), Some("a thing"));
    assert_eq!(schema.default_value(), Some(&json!({"a": 1})));
    assert_eq!(schema.content_media_type(), Some("application/json"));
    // `default` is never injected into the instance
    assert!(!schema.is_valid(&json!("not an object")));
}

#[test]
fn escaped_pointer_tokens_resolve() {
    let schema = compiled(json!({
        "definitions": {"a/b": {"type": "integer"}},
        "$ref": "#/definitions/a~1b"
    }));
    assert!(schema.is_valid(&json!(1)));
    assert!(!schema.is_valid(&json!("1")));
}
