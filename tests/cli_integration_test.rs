mod common;

use std::path::Path;
use std::process::{Command, Output};

use common::TestFixtures;
use tempfile::TempDir;

/// Run the binary from an empty directory so no stray config file is picked up
fn run_cli(args: &[&str]) -> Output {
    let workdir = TempDir::new().unwrap();
    Command::new(env!("CARGO_BIN_EXE_xsd-validate"))
        .args(args)
        .current_dir(workdir.path())
        .env_remove("RUST_LOG")
        .env_remove("XSD_VALIDATE_THREADS")
        .env_remove("XSD_VALIDATE_MODE")
        .env_remove("XSD_VALIDATE_FORMAT")
        .env_remove("XSD_VALIDATE_VERBOSE")
        .env_remove("XSD_VALIDATE_QUIET")
        .env_remove("XSD_VALIDATE_WARNINGS")
        .output()
        .expect("Failed to execute command")
}

fn path(p: &Path) -> &str {
    p.to_str().unwrap()
}

#[test]
fn test_cli_help_output() {
    let output = run_cli(&["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Validate XML documents against an XSD schema"));
    assert!(stdout.contains("--threads"));
    assert!(stdout.contains("--mode"));
    assert!(stdout.contains("--format"));
    assert!(stdout.contains("--config"));
    assert!(stdout.contains("--no-warnings"));
}

#[test]
fn test_cli_version_output() {
    let output = run_cli(&["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(&format!("xsd-validate {}", env!("CARGO_PKG_VERSION"))));
}

#[test]
fn test_cli_all_valid_exits_zero() {
    let fixtures = TestFixtures::new();

    for mode in ["sync", "async"] {
        let output = run_cli(&[
            "--mode",
            mode,
            path(&fixtures.id_schema()),
            path(&fixtures.id_valid_xml()),
        ]);

        assert_eq!(output.status.code(), Some(0), "mode {mode}");
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(stdout.contains("VALID"));
        assert!(stdout.contains("Valid: 1"));
    }
}

#[test]
fn test_cli_invalid_document_exits_one() {
    let fixtures = TestFixtures::new();

    for mode in ["sync", "async"] {
        let output = run_cli(&[
            "--mode",
            mode,
            "--verbose",
            path(&fixtures.id_schema()),
            path(&fixtures.id_valid_xml()),
            path(&fixtures.id_invalid_xml()),
        ]);

        assert_eq!(output.status.code(), Some(1), "mode {mode}");
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(stdout.contains("INVALID"));
        assert!(stdout.contains("id_invalid.xml:2:"));
        assert!(stdout.contains("error:"));
    }
}

#[test]
fn test_cli_malformed_document_exits_one() {
    let fixtures = TestFixtures::new();
    let output = run_cli(&[
        path(&fixtures.id_schema()),
        path(&fixtures.malformed_xml()),
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("MALFORMED"));
}

#[test]
fn test_cli_missing_document_is_reported_per_file() {
    let fixtures = TestFixtures::new();
    let output = run_cli(&[
        path(&fixtures.id_schema()),
        path(&fixtures.id_valid_xml()),
        "/nonexistent/file.xml",
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("ERROR"));
    assert!(stdout.contains("/nonexistent/file.xml"));
}

#[test]
fn test_cli_invalid_schema_exits_two() {
    let fixtures = TestFixtures::new();

    for mode in ["sync", "async"] {
        let output = run_cli(&[
            "--mode",
            mode,
            path(&fixtures.not_a_schema()),
            path(&fixtures.id_valid_xml()),
        ]);

        assert_eq!(output.status.code(), Some(2), "mode {mode}");
        let stderr = String::from_utf8(output.stderr).unwrap();
        assert!(stderr.contains("invalid schema"), "stderr: {stderr}");
    }
}

#[test]
fn test_cli_missing_schema_exits_two() {
    let output = run_cli(&["/nonexistent/schema.xsd", "doc.xml"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Schema file does not exist"));
}

#[test]
fn test_cli_conflicting_options() {
    let fixtures = TestFixtures::new();
    let output = run_cli(&[
        "--verbose",
        "--quiet",
        path(&fixtures.id_schema()),
        path(&fixtures.id_valid_xml()),
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("cannot be used with"));
}

#[test]
fn test_cli_json_output() {
    let fixtures = TestFixtures::new();
    let output = run_cli(&[
        "--format",
        "json",
        path(&fixtures.id_schema()),
        path(&fixtures.id_valid_xml()),
        path(&fixtures.id_invalid_xml()),
    ]);

    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["total_files"], 2);
    assert_eq!(value["valid_files"], 1);
    assert_eq!(value["invalid_files"], 1);
    assert_eq!(value["files"][1]["status"], "invalid");
    assert_eq!(value["files"][1]["error_count"], 1);
}

#[test]
fn test_cli_config_file() {
    let fixtures = TestFixtures::new();
    let output = run_cli(&[
        "--config",
        path(&fixtures.config("sync.toml")),
        path(&fixtures.id_schema()),
        path(&fixtures.id_valid_xml()),
    ]);

    assert_eq!(output.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["valid_files"], 1);
}

#[test]
fn test_cli_rejected_config_exits_two() {
    let fixtures = TestFixtures::new();
    let output = run_cli(&[
        "--config",
        path(&fixtures.config("bad_threads.toml")),
        path(&fixtures.id_schema()),
        path(&fixtures.id_valid_xml()),
    ]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Failed to load configuration"));
}

#[test]
fn test_cli_quiet_mode_prints_nothing_when_valid() {
    let fixtures = TestFixtures::new();
    let output = run_cli(&[
        "--quiet",
        path(&fixtures.order_schema()),
        path(&fixtures.order_valid_xml()),
    ]);

    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
}
