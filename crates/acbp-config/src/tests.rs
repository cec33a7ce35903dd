//! Tests for engine configuration and model documents.

use std::path::Path;

use acbp_core::{Predicate, Rule};

use super::*;

#[test]
fn test_defaults() {
    let config = EngineConfig::default();
    assert_eq!(config.enumeration_limit_bits, 22);
    assert_eq!(config.category_scan_limit, 1_000_000);
    assert_eq!(config.bit_reduction, BitReduction::Proven);
    assert_eq!(config.enumeration_threads, EnumerationThreads::None);
    assert_eq!(config.audit_sample_size, 10);
    assert_eq!(EngineConfig::from_toml_str("").unwrap(), config);
}

#[test]
fn test_toml_parsing() {
    let toml = r#"
        enumeration_limit_bits = 5
        category_scan_limit = 500
        bit_reduction = "off"

        [enumeration_threads]
        count = 4
    "#;

    let config = EngineConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.enumeration_limit_bits, 5);
    assert_eq!(config.category_scan_limit, 500);
    assert_eq!(config.bit_reduction, BitReduction::Off);
    assert_eq!(config.enumeration_threads, EnumerationThreads::Count(4));
    assert!(config.enumeration_threads.is_parallel());
}

#[test]
fn test_yaml_parsing() {
    let yaml = r#"
        enumeration_limit_bits: 12
        enumeration_threads: auto
        audit_sample_size: 3
    "#;

    let config = EngineConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.enumeration_limit_bits, 12);
    assert_eq!(config.enumeration_threads, EnumerationThreads::Auto);
    assert_eq!(config.audit_sample_size, 3);
}

#[test]
fn test_invalid_values_rejected() {
    let err = EngineConfig::from_toml_str("enumeration_limit_bits = 65").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    let err = EngineConfig::from_yaml_str("enumeration_threads:\n  count: 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    let err = EngineConfig::from_toml_str("bit_reduction = \"maybe\"").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}

#[test]
fn test_builder() {
    let config = EngineConfig::new()
        .with_enumeration_limit_bits(5)
        .with_category_scan_limit(10)
        .with_bit_reduction(BitReduction::Off)
        .with_enumeration_threads(EnumerationThreads::Count(1))
        .with_audit_sample_size(2);

    assert_eq!(config.enumeration_limit_bits, 5);
    assert_eq!(config.category_scan_limit, 10);
    assert_eq!(config.bit_reduction, BitReduction::Off);
    assert!(!config.enumeration_threads.is_parallel());
    assert_eq!(config.audit_sample_size, 2);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = EngineConfig::load("/nonexistent/acbp.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_model_json_document() {
    let json = r#"{
        "name": "inpatient",
        "bits": [
            {"name": "admitted", "index": 0},
            {"name": "in_icu", "index": 2, "doc": "currently in intensive care"}
        ],
        "width": 4,
        "categories": [
            {"name": "ward", "values": ["Medical", "ICU"]},
            {"name": "site", "values": ["Main", "Annex"]}
        ],
        "rules": [
            {
                "id": "icu-ward",
                "type": "bit_forbid",
                "forbid_when": ["in_icu"],
                "predicate": {"ward": "Medical"}
            }
        ]
    }"#;

    let decl = ModelDeclaration::from_json_str(json).unwrap();
    assert_eq!(decl.width, Some(4));
    assert_eq!(decl.bits[1].index(), Some(2));
    assert_eq!(decl.bits[1].doc(), Some("currently in intensive care"));
    assert_eq!(decl.categories[1].name, "site");
    assert_eq!(decl.rules[0].id.as_deref(), Some("icu-ward"));
    assert_eq!(
        decl.rules[0].rule,
        Rule::bit_forbid(["in_icu"], Predicate::eq("ward", "Medical"))
    );
}

#[test]
fn test_model_toml_document_keeps_category_order() {
    let toml = r#"
        name = "clinic"
        flags = ["booked", "checked_in", "no_show"]

        [categories]
        visit_type = ["InPerson", "Telehealth"]
        department = ["Primary", "Cardiology"]

        [[constraints]]
        type = "mutex"
        a = "checked_in"
        b = "no_show"
    "#;

    let decl = ModelDeclaration::from_toml_str(toml).unwrap();
    assert_eq!(decl.bits.len(), 3);
    let names: Vec<&str> = decl.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["visit_type", "department"]);
    assert_eq!(decl.rules[0].rule, Rule::mutex("checked_in", "no_show"));
}

#[test]
fn test_model_format_from_extension() {
    assert_eq!(ModelFormat::from_path(Path::new("m.json")), Some(ModelFormat::Json));
    assert_eq!(ModelFormat::from_path(Path::new("m.YML")), Some(ModelFormat::Yaml));
    assert_eq!(ModelFormat::from_path(Path::new("m.toml")), Some(ModelFormat::Toml));
    assert_eq!(ModelFormat::from_path(Path::new("m.txt")), None);

    let err = ModelDeclaration::from_file("model.txt").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}
