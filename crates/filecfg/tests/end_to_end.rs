//! Declare, validate, serialize and reload a nested config through every
//! bundled format.

use std::io::Cursor;
use std::sync::{Arc, Once};

use filecfg::{
    DeclaredType, EnumType, FieldDescriptor, FieldValue, FileConfig, FileConfigError,
    HandlerOptions, Instance, Record, SchemaValidationError, Warning,
};
use serde_json::json;

const FORMATS: [&str; 7] = ["json", "yaml", "toml", "ini", "xml", "msgpack", "binary"];

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

struct Records {
    dependency: Arc<Record>,
    project: Arc<Record>,
}

fn records() -> Records {
    let license = Arc::new(
        EnumType::new("License", [("MIT", "mit"), ("ISC", "isc"), ("APACHE", "apache-2.0")])
            .unwrap(),
    );
    let dependency = Record::builder("Project.Dependency")
        .field(FieldDescriptor::new("name", DeclaredType::string()).min(1))
        .field(FieldDescriptor::new("version", DeclaredType::pattern(r"^v\d+$").unwrap()))
        .field(FieldDescriptor::new("optional", DeclaredType::boolean()).default_value(false))
        .build()
        .unwrap();
    let project = Record::builder("Project")
        .description("A package manifest")
        .field(FieldDescriptor::new("name", DeclaredType::string()).min(1).max(64))
        .field(FieldDescriptor::new("downloads", DeclaredType::integer()).min(0))
        .field(FieldDescriptor::new("rating", DeclaredType::number()).optional())
        .field(
            FieldDescriptor::new("license", DeclaredType::enumeration(&license))
                .default_value(FieldValue::enum_member("ISC")),
        )
        .field(
            FieldDescriptor::new("keywords", DeclaredType::set_of(DeclaredType::string()))
                .min(1)
                .unique(),
        )
        .field(
            FieldDescriptor::new(
                "dependencies",
                DeclaredType::map_of(DeclaredType::string(), DeclaredType::record(&dependency)),
            )
            .wire_name("deps"),
        )
        .build()
        .unwrap();
    Records {
        dependency,
        project,
    }
}

fn project(r: &Records) -> Instance {
    let serde = Instance::new(&r.dependency)
        .with("name", "serde")
        .unwrap()
        .with("version", "v1")
        .unwrap();
    let log = Instance::new(&r.dependency)
        .with("name", "log")
        .unwrap()
        .with("version", "v0")
        .unwrap()
        .with("optional", true)
        .unwrap();
    Instance::new(&r.project)
        .with("name", "filecfg demo")
        .unwrap()
        .with("downloads", 1200)
        .unwrap()
        .with("rating", 4.5)
        .unwrap()
        .with("keywords", FieldValue::set(["config", "schema"]))
        .unwrap()
        .with(
            "dependencies",
            FieldValue::map([
                ("serde", FieldValue::Record(serde)),
                ("log", FieldValue::Record(log)),
            ]),
        )
        .unwrap()
}

#[test]
fn every_format_restores_the_instance() {
    init_tracing();
    let r = records();
    let fc = FileConfig::new();
    let instance = project(&r);
    fc.validate(&instance).unwrap();

    for format in FORMATS {
        let (content, warnings) = fc
            .dumps(&instance, format, None, &HandlerOptions::new())
            .unwrap_or_else(|e| panic!("{format}: {e}"));
        assert!(warnings.is_empty(), "{format}");
        let (back, warnings) = fc
            .loads(&content, format, &r.project, None, &HandlerOptions::new())
            .unwrap_or_else(|e| panic!("{format}: {e}"));
        assert!(warnings.is_empty(), "{format}");
        assert_eq!(back, instance, "{format}");
    }
}

#[test]
fn generic_map_uses_wire_names_and_enum_values() {
    let r = records();
    let fc = FileConfig::new();
    let map = fc.to_dict(&project(&r)).unwrap();
    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec!["name", "downloads", "rating", "license", "keywords", "deps"]
    );
    assert_eq!(map["license"], json!("isc"));
    assert_eq!(map["deps"]["log"], json!({"name": "log", "version": "v0", "optional": true}));
}

#[test]
fn stream_dump_and_load() {
    let r = records();
    let fc = FileConfig::new();
    let instance = project(&r);

    let mut out = Vec::new();
    let warnings = fc
        .dump(&instance, "yaml", &mut out, None, &HandlerOptions::new())
        .unwrap();
    assert!(warnings.is_empty());
    assert!(String::from_utf8(out.clone()).unwrap().contains("name: filecfg demo"));

    let (back, _) = fc
        .load(&mut Cursor::new(out), "yaml", &r.project, None, &HandlerOptions::new())
        .unwrap();
    assert_eq!(back, instance);
}

#[test]
fn unsupported_options_surface_as_warnings() {
    init_tracing();
    let r = records();
    let fc = FileConfig::new();
    let mut options = HandlerOptions::new();
    options.insert("indent".into(), json!(4));
    let (_, warnings) = fc.dumps(&project(&r), "yaml", None, &options).unwrap();
    assert_eq!(
        warnings,
        vec![Warning::UnsupportedOption {
            format: "yaml".into(),
            backend: "serde_yaml".into(),
            option: "indent".into(),
        }]
    );
}

#[test]
fn lenient_load_then_strict_validation() {
    let r = records();
    let fc = FileConfig::new();
    let content = r#"{
        "name": "",
        "downloads": -1,
        "keywords": ["a"],
        "deps": {"bad": {"name": "x", "version": "1.0"}}
    }"#;
    let (instance, _) = fc
        .loads(&content.into(), "json", &r.project, None, &HandlerOptions::new())
        .unwrap();
    assert_eq!(instance.get("license"), Some(&FieldValue::enum_member("ISC")));

    let Err(FileConfigError::Validation(SchemaValidationError::ValidationFailed {
        violations,
        ..
    })) = fc.validate(&instance)
    else {
        panic!("expected a validation failure");
    };
    let mut paths: Vec<&str> = violations
        .violations()
        .iter()
        .map(|v| v.instance_path.as_str())
        .collect();
    paths.sort_unstable();
    assert_eq!(paths, vec!["/deps/bad/version", "/downloads", "/name"]);
}

#[test]
fn schema_describes_the_declaration() {
    let r = records();
    let fc = FileConfig::new();
    let schema = fc.build_schema(&r.project).unwrap();
    assert!(schema.warnings.is_empty());
    assert_eq!(schema.id(), Some("Project.json"));
    let doc = &schema.document;
    assert_eq!(doc["description"], json!("A package manifest"));
    assert_eq!(doc["properties"]["license"]["default"], json!("isc"));
    assert_eq!(doc["properties"]["keywords"]["uniqueItems"], json!(true));
    assert_eq!(
        doc["properties"]["deps"]["patternProperties"]["^(.*)$"]["properties"]["version"]["pattern"],
        json!(r"^v\d+$")
    );
}

#[test]
fn unknown_enum_value_fails_decode() {
    let r = records();
    let fc = FileConfig::new();
    let err = fc
        .loads(
            &r#"{"name": "x", "license": "gpl"}"#.into(),
            "json",
            &r.project,
            None,
            &HandlerOptions::new(),
        )
        .unwrap_err();
    assert!(matches!(err, FileConfigError::Codec(_)));
}
