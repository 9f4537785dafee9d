//! Integration test that generates case.schema.json
//!
//! Run with: cargo test -p casegen-core --test generate_schema

use casegen_core::case::generate_schema;

#[test]
fn write_schema_file() {
    let schema = generate_schema();

    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let schema_path = dir.path().join("case.schema.json");

    std::fs::write(&schema_path, &schema).expect("failed to write schema file");

    // Verify the file is valid JSON
    let content = std::fs::read_to_string(&schema_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed.get("title").and_then(|v| v.as_str()), Some("Case"));
    let properties = parsed.get("properties").and_then(|v| v.as_object()).unwrap();
    for field in ["body", "path_parameters", "headers", "cookies", "query"] {
        assert!(properties.contains_key(field), "missing {field}");
    }
}
