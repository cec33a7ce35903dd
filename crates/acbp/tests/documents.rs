//! Policies compiled from model documents.

use std::path::PathBuf;

use acbp::prelude::*;
use acbp::{ConfigError, PolicyError};

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("acbp-{}-{name}", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_yaml_document_matches_builder() {
    let decl = ModelDeclaration::from_yaml_str(acbp_test::inpatient::MODEL_YAML).unwrap();
    let from_doc = CompiledPolicy::compile(decl, EngineConfig::default()).unwrap();
    let from_builder = CompiledPolicy::compile(
        acbp_test::inpatient::declaration(),
        EngineConfig::default(),
    )
    .unwrap();

    assert_eq!(from_doc.model().width(), 6);
    assert_eq!(from_doc.model().category_count(), 48);
    assert_eq!(
        from_doc.decision_space().unwrap(),
        from_builder.decision_space().unwrap()
    );
}

#[test]
fn test_from_file() {
    let path = write_temp(
        "visit.json",
        r#"{
            "name": "visit",
            "flags": ["booked", "checked_in"],
            "categories": {"modality": ["InPerson", "Virtual"]},
            "constraints": [
                {"type": "implies", "when_bits": ["checked_in"], "require_bits": ["booked"]}
            ]
        }"#,
    );
    let policy = CompiledPolicy::from_file(&path, EngineConfig::default()).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(policy.model().name(), "visit");
    assert_eq!(policy.valid_masks().unwrap().as_slice(), &[0b00, 0b01, 0b11]);
    assert_eq!(policy.decision_space().unwrap().len(), 6);
}

#[test]
fn test_from_file_errors() {
    let path = write_temp("visit.txt", "name = \"visit\"");
    let err = CompiledPolicy::from_file(&path, EngineConfig::default()).unwrap_err();
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(err, PolicyError::Document(ConfigError::Invalid(_))));

    let path = write_temp(
        "broken.toml",
        r#"
        name = "broken"
        flags = ["booked"]

        [[constraints]]
        type = "mutex"
        a = "booked"
        b = "missing"
        "#,
    );
    let err = CompiledPolicy::from_file(&path, EngineConfig::default()).unwrap_err();
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(err, PolicyError::Compile(_)));
}
