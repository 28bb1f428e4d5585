//! Compiled documents driving the validator.

use std::sync::Arc;

use filecfg_codec::Codec;
use filecfg_core::{DeclaredType, FieldDescriptor, FieldValue, Instance, Record, ShapeCache};
use filecfg_schema::{SchemaCompiler, SchemaValidationError, SchemaValidator};
use proptest::prelude::*;
use serde_json::{json, Value};

fn project() -> (Arc<Record>, Arc<Record>) {
    let dependency = Record::builder("Project.Dependency")
        .field(FieldDescriptor::new("name", DeclaredType::string()))
        .field(FieldDescriptor::new("version", DeclaredType::pattern(r"^v\d+$").unwrap()))
        .build()
        .unwrap();
    let project = Record::builder("Project")
        .field(FieldDescriptor::new("name", DeclaredType::string()).min(1))
        .field(FieldDescriptor::new(
            "dependencies",
            DeclaredType::map_of(DeclaredType::string(), DeclaredType::record(&dependency)),
        ))
        .field(
            FieldDescriptor::new("tags", DeclaredType::list_of(DeclaredType::string()))
                .optional()
                .max(3),
        )
        .build()
        .unwrap();
    (project, dependency)
}

fn validator_for(record: &Arc<Record>) -> SchemaValidator {
    let schema = SchemaCompiler::new(ShapeCache::shared()).compile(record).unwrap();
    SchemaValidator::new(&schema).unwrap()
}

#[test]
fn pattern_string_accepts_v12_and_rejects_12() {
    let r = Record::builder("Release")
        .field(FieldDescriptor::new("version", DeclaredType::pattern(r"^v\d+$").unwrap()))
        .build()
        .unwrap();
    let v = validator_for(&r);
    assert!(v.is_valid(&json!({"version": "v12"})));
    assert!(!v.is_valid(&json!({"version": "12"})));
}

#[test]
fn encoded_project_validates() {
    let (project, dependency) = project();
    let d1 = Instance::new(&dependency)
        .with("name", "D")
        .unwrap()
        .with("version", "v3")
        .unwrap();
    let p = Instance::new(&project)
        .with("name", "P")
        .unwrap()
        .with("dependencies", FieldValue::map([("d1", d1)]))
        .unwrap();

    let cache = ShapeCache::shared();
    let encoded = Codec::new(Arc::clone(&cache)).encode(&p).unwrap();
    let schema = SchemaCompiler::new(cache).compile(&project).unwrap();
    let v = SchemaValidator::new(&schema).unwrap();
    v.validate(&Value::Object(encoded)).unwrap();
}

#[test]
fn nested_violations_carry_instance_paths() {
    let (project, _) = project();
    let v = validator_for(&project);
    let bad = json!({
        "name": "P",
        "dependencies": {"d1": {"name": "D", "version": "3"}}
    });
    match v.validate(&bad).unwrap_err() {
        SchemaValidationError::ValidationFailed { violations, .. } => {
            assert_eq!(violations.len(), 1);
            assert_eq!(
                violations.violations()[0].instance_path,
                "/dependencies/d1/version"
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_required_field_and_bounds_are_enforced() {
    let (project, _) = project();
    let v = validator_for(&project);
    assert!(!v.is_valid(&json!({"name": "P"})));
    assert!(!v.is_valid(&json!({"name": "", "dependencies": {}})));
    assert!(!v.is_valid(&json!({
        "name": "P",
        "dependencies": {},
        "tags": ["a", "b", "c", "d"]
    })));
    assert!(v.is_valid(&json!({"name": "P", "dependencies": {}, "tags": ["a"]})));
}

#[test]
fn decode_is_lenient_where_validation_is_not() {
    let (project, _) = project();
    let raw = json!({"name": 42, "dependencies": {}});
    let decoded = Codec::default()
        .decode(raw.as_object().unwrap(), &project)
        .unwrap();
    assert_eq!(decoded.get("name"), Some(&FieldValue::from("42")));

    let raw = json!({"name": ["x"], "dependencies": {}});
    Codec::default()
        .decode(raw.as_object().unwrap(), &project)
        .unwrap();
    assert!(!validator_for(&project).is_valid(&raw));
}

#[test]
fn set_fields_reject_duplicates() {
    let r = Record::builder("R")
        .field(FieldDescriptor::new("s", DeclaredType::set_of(DeclaredType::integer())))
        .build()
        .unwrap();
    let v = validator_for(&r);
    assert!(v.is_valid(&json!({"s": [1, 2]})));
    assert!(!v.is_valid(&json!({"s": [1, 1]})));
}

#[test]
fn contains_requires_the_member() {
    let r = Record::builder("R")
        .field(
            FieldDescriptor::new("l", DeclaredType::list_of(DeclaredType::string()))
                .contains("main"),
        )
        .build()
        .unwrap();
    let v = validator_for(&r);
    assert!(v.is_valid(&json!({"l": ["dev", "main"]})));
    assert!(!v.is_valid(&json!({"l": ["dev"]})));
}

fn declared_type() -> impl Strategy<Value = DeclaredType> {
    let leaf = prop_oneof![
        Just(DeclaredType::string()),
        Just(DeclaredType::integer()),
        Just(DeclaredType::number()),
        Just(DeclaredType::boolean()),
        Just(DeclaredType::opaque("datetime")),
    ];
    leaf.prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(DeclaredType::list_of),
            inner.clone().prop_map(DeclaredType::set_of),
            inner.prop_map(|v| DeclaredType::map_of(DeclaredType::string(), v)),
        ]
    })
}

proptest! {
    #[test]
    fn compilation_is_deterministic(
        types in prop::collection::vec((declared_type(), any::<bool>()), 1..6)
    ) {
        let mut builder = Record::builder("Generated");
        for (i, (t, required)) in types.into_iter().enumerate() {
            builder = builder.field(FieldDescriptor::new(&format!("f{i}"), t).required(required));
        }
        let record = builder.build().unwrap();

        let first = SchemaCompiler::new(ShapeCache::shared()).compile(&record).unwrap();
        let second = SchemaCompiler::new(ShapeCache::shared()).compile(&record).unwrap();
        prop_assert_eq!(
            serde_json::to_string(&first.document).unwrap(),
            serde_json::to_string(&second.document).unwrap()
        );

        let required = first.document["required"].as_array().unwrap().clone();
        for field in record.fields() {
            prop_assert_eq!(
                required.contains(&json!(field.wire())),
                field.is_required()
            );
        }
        SchemaValidator::new(&first).unwrap();
    }
}
