//! End-to-end tests for the schema-gen binary
//!
//! Each test builds a small schema directory, runs the CLI against it and
//! inspects the exit status, stdout and any written file.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

fn schema_gen(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_schema-gen"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run schema-gen")
}

fn write(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).expect("Failed to write schema");
}

fn write_bundle(dir: &Path) {
    write(
        dir,
        "glTF.schema.json",
        r##"{
  "title": "glTF",
  "type": "object",
  "allOf": [{"$ref": "glTFProperty.schema.json"}],
  "properties": {
    "asset": {"$ref": "asset.schema.json"},
    "scene": {"$ref": "#/definitions/id"}
  },
  "definitions": {"id": {"type": "integer", "minimum": 0}}
}"##,
    );
    write(
        dir,
        "glTFProperty.schema.json",
        r#"{"title": "glTF Property", "properties": {"extras": {}}}"#,
    );
    write(
        dir,
        "asset.schema.json",
        r#"{"title": "Asset", "properties": {"version": {"type": "string", "pattern": "^[0-9]+\\.[0-9]+$"}}}"#,
    );
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("stdout is not UTF-8")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_missing_root_fails() {
    let dir = tempdir().expect("Failed to create temp dir");
    let out = schema_gen(&[dir.path().to_str().unwrap(), "--offline"]);

    assert!(!out.status.success());
    assert!(stderr(&out).contains("Schema file not found"), "{}", stderr(&out));
    assert!(out.stdout.is_empty());
}

#[test]
fn test_missing_schema_dir_argument_fails() {
    let out = schema_gen(&[]);
    assert!(!out.status.success());
}

#[test]
fn test_json_output_to_stdout() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_bundle(dir.path());

    let out = schema_gen(&[dir.path().to_str().unwrap(), "--offline", "-f", "json"]);
    assert!(out.status.success(), "{}", stderr(&out));

    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(value["properties"]["asset"]["title"], "Asset");
    assert_eq!(value["properties"]["scene"]["type"], "integer");
    assert_eq!(value["allOf"][0]["title"], "glTF Property");
    assert!(!stdout(&out).contains("$ref"));
}

#[test]
fn test_c_output_to_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let schema_dir = dir.path().join("schema");
    std::fs::create_dir(&schema_dir).unwrap();
    write_bundle(&schema_dir);
    let header = dir.path().join("schema.h");

    let out = schema_gen(&[
        schema_dir.to_str().unwrap(),
        "--offline",
        "-o",
        header.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(out.stdout.is_empty());

    let text = std::fs::read_to_string(&header).unwrap();
    assert!(text.starts_with("// GENERATED FILE - DO NOT EDIT\n"));
    assert!(text.contains("const char *kglTFSchemaString = \""));
    // Backslash in the pattern is escaped twice: once by JSON, once by C.
    assert!(text.contains(r#"\"pattern\": \"^[0-9]+\\\\.[0-9]+$\""#));
}

#[test]
fn test_c_output_split_into_array() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_bundle(dir.path());

    let out = schema_gen(&[
        dir.path().to_str().unwrap(),
        "--offline",
        "--chunk-size",
        "64",
        "--symbol",
        "kSchema",
    ]);
    assert!(out.status.success(), "{}", stderr(&out));

    let text = stdout(&out);
    assert!(text.contains("const char *kSchemas[] = {\n"));
    assert!(text.trim_end().ends_with("};"));
    let literals = text.lines().filter(|l| l.starts_with('"')).count();
    assert!(literals > 1);
}

#[test]
fn test_invalid_chunk_size_rejected() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_bundle(dir.path());

    let out = schema_gen(&[dir.path().to_str().unwrap(), "--offline", "--chunk-size", "2"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("chunk_size"));
}

#[test]
fn test_recursive_schema_requires_allow_cycles() {
    let dir = tempdir().expect("Failed to create temp dir");
    write(
        dir.path(),
        "glTF.schema.json",
        r##"{"definitions": {"node": {"properties": {"children": {"items": {"$ref": "#/definitions/node"}}}}}}"##,
    );
    let output = dir.path().join("out.json");

    let out = schema_gen(&[
        dir.path().to_str().unwrap(),
        "--offline",
        "-f",
        "json",
        "-o",
        output.to_str().unwrap(),
    ]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("unresolved reference"), "{}", stderr(&out));
    assert!(!output.exists(), "no output on failure");

    let out = schema_gen(&[
        dir.path().to_str().unwrap(),
        "--offline",
        "--allow-cycles",
        "-f",
        "json",
        "-o",
        output.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(std::fs::read_to_string(&output).unwrap().contains("$ref"));
}

#[test]
fn test_sibling_recursion_keeps_absolute_reference() {
    let dir = tempdir().expect("Failed to create temp dir");
    write(
        dir.path(),
        "glTF.schema.json",
        r#"{"properties": {"tree": {"$ref": "node.schema.json#/definitions/node"}}}"#,
    );
    write(
        dir.path(),
        "node.schema.json",
        r##"{"definitions": {"node": {"properties": {"child": {"$ref": "#/definitions/node"}}}}}"##,
    );

    let out = schema_gen(&[
        dir.path().to_str().unwrap(),
        "--offline",
        "--allow-cycles",
        "-f",
        "json",
    ]);
    assert!(out.status.success(), "{}", stderr(&out));

    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    let left = value["properties"]["tree"]["properties"]["child"]["properties"]["child"]["$ref"]
        .as_str()
        .expect("leftover reference");
    assert!(left.starts_with("file://"), "{}", left);
    assert!(left.ends_with("node.schema.json#/definitions/node"), "{}", left);
}

#[test]
fn test_broken_reference_fails() {
    let dir = tempdir().expect("Failed to create temp dir");
    write(
        dir.path(),
        "glTF.schema.json",
        r#"{"properties": {"asset": {"$ref": "asset.schema.json"}}}"#,
    );

    let out = schema_gen(&[dir.path().to_str().unwrap(), "--offline"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("asset.schema.json"), "{}", stderr(&out));
}

#[test]
fn test_check_in_sync_and_stale() {
    let dir = tempdir().expect("Failed to create temp dir");
    let schema_dir = dir.path().join("schema");
    std::fs::create_dir(&schema_dir).unwrap();
    write_bundle(&schema_dir);
    let header = dir.path().join("schema.h");

    let out = schema_gen(&[
        schema_dir.to_str().unwrap(),
        "--offline",
        "-o",
        header.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{}", stderr(&out));

    let out = schema_gen(&[
        schema_dir.to_str().unwrap(),
        "--offline",
        "--check",
        header.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{}", stderr(&out));

    write(&schema_dir, "asset.schema.json", r#"{"title": "Asset v2"}"#);
    let out = schema_gen(&[
        schema_dir.to_str().unwrap(),
        "--offline",
        "--check",
        header.to_str().unwrap(),
    ]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("out of date"));
}

#[test]
fn test_config_file_sets_defaults() {
    let dir = tempdir().expect("Failed to create temp dir");
    let schema_dir = dir.path().join("schema");
    std::fs::create_dir(&schema_dir).unwrap();
    write(&schema_dir, "root.json", r#"{"title": "Root"}"#);
    let config = dir.path().join("schema-gen.toml");
    std::fs::write(
        &config,
        "[resolver]\nallow_remote = false\n\n[output]\nroot = \"root.json\"\nformat = \"c-array\"\nsymbol = \"kRoot\"\n",
    )
    .unwrap();

    let out = schema_gen(&[schema_dir.to_str().unwrap(), "-c", config.to_str().unwrap()]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("const char *kRoots[] = {"));

    // Flags win over the file
    let out = schema_gen(&[
        schema_dir.to_str().unwrap(),
        "-c",
        config.to_str().unwrap(),
        "-f",
        "json",
    ]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("\"title\": \"Root\""));
}
