//! Binary tests: exit codes and output file naming.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

const UNIT_V1: &str = r#"
_format_version: "1.0"
table:
  name: Unit
  columns:
    - name: UnitID
      logical_type: integer
      nullable: false
      identity: true
    - name: Name
      logical_type: string
      max_length: 100
      nullable: false
  primary_key: [UnitID]
"#;

const UNIT_V2: &str = r#"
_format_version: "1.0"
table:
  name: Unit
  columns:
    - name: UnitID
      logical_type: integer
      nullable: false
      identity: true
    - name: Name
      logical_type: string
      max_length: 100
      nullable: false
    - name: Symbol
      logical_type: string
      max_length: 8
  primary_key: [UnitID]
"#;

fn tabula() -> Command {
    let mut cmd = Command::cargo_bin("tabula").unwrap();
    cmd.env_remove("TABULA_PLATFORM")
        .env_remove("TABULA_OUTPUT_DIR")
        .env_remove("TABULA_CONFIG")
        .arg("--no-color");
    cmd
}

/// `<root>/v<version>/tables/<file>` with the given contents
fn tables_dir(root: &Path, version: &str, files: &[(&str, &str)]) -> PathBuf {
    let dir = root.join(format!("v{}", version)).join("tables");
    fs::create_dir_all(&dir).unwrap();
    for (name, content) in files {
        fs::write(dir.join(name), content).unwrap();
    }
    dir
}

#[test]
fn test_validate_ok() {
    let root = tempfile::tempdir().unwrap();
    let dir = tables_dir(root.path(), "1", &[("Unit.yaml", UNIT_V1)]);

    tabula()
        .arg("--validate")
        .arg(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 tables, 0 views valid"));
}

#[test]
fn test_validate_errors_exit_1() {
    let root = tempfile::tempdir().unwrap();
    let broken = UNIT_V1.replace("primary_key: [UnitID]", "primary_key: [Missing]");
    let dir = tables_dir(root.path(), "1", &[("Unit.yaml", &broken)]);

    tabula()
        .arg("--validate")
        .arg(&dir)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing"));
}

#[test]
fn test_load_failure_exit_2() {
    let root = tempfile::tempdir().unwrap();
    let dir = tables_dir(root.path(), "1", &[("Other.yaml", UNIT_V1)]);

    tabula()
        .arg("--validate")
        .arg(&dir)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Other.yaml"));
}

#[test]
fn test_create_writes_named_script() {
    let root = tempfile::tempdir().unwrap();
    let out = root.path().join("out");
    let dir = tables_dir(root.path(), "1.0", &[("Unit.yaml", UNIT_V1)]);

    tabula()
        .arg("--create")
        .arg(&dir)
        .args(["--platform", "postgres", "--output-dir"])
        .arg(&out)
        .assert()
        .success();

    let script = fs::read_to_string(out.join("v1.0_create_postgres.sql")).unwrap();
    assert!(script.contains("\"UnitID\" SERIAL NOT NULL"));
}

#[test]
fn test_migrate_writes_pair() {
    let root = tempfile::tempdir().unwrap();
    let out = root.path().join("out");
    let old = tables_dir(root.path(), "1", &[("Unit.yaml", UNIT_V1)]);
    let new = tables_dir(root.path(), "2", &[("Unit.yaml", UNIT_V2)]);

    tabula()
        .arg("--from-dir")
        .arg(&old)
        .args(["--from-version", "1"])
        .arg("--to-dir")
        .arg(&new)
        .args(["--to-version", "2", "--platform", "mssql"])
        .env("TABULA_OUTPUT_DIR", &out)
        .assert()
        .success();

    let forward = fs::read_to_string(out.join("v1_to_v2_mssql.sql")).unwrap();
    let rollback = fs::read_to_string(out.join("v1_to_v2_mssql_rollback.sql")).unwrap();
    assert!(forward.contains("ALTER TABLE [dbo].[Unit] ADD [Symbol] NVARCHAR(8);"));
    assert!(rollback.contains("ALTER TABLE [dbo].[Unit] DROP COLUMN [Symbol];"));

    tabula()
        .arg("--check-pairs")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("all paired"));
}

#[test]
fn test_migrate_identical_writes_nothing() {
    let root = tempfile::tempdir().unwrap();
    let out = root.path().join("out");
    let old = tables_dir(root.path(), "1", &[("Unit.yaml", UNIT_V1)]);
    let new = tables_dir(root.path(), "2", &[("Unit.yaml", UNIT_V1)]);

    tabula()
        .arg("--from-dir")
        .arg(&old)
        .arg("--to-dir")
        .arg(&new)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("identical"));
    assert!(!out.exists());
}

#[test]
fn test_check_pairs_reports_missing_rollback() {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join("v1_to_v2_mssql.sql"), "-- x\n").unwrap();

    tabula()
        .arg("--check-pairs")
        .arg(root.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("missing rollback script"));
}

#[test]
fn test_unknown_platform_exit_2() {
    let root = tempfile::tempdir().unwrap();
    let dir = tables_dir(root.path(), "1", &[("Unit.yaml", UNIT_V1)]);

    tabula()
        .arg("--create")
        .arg(&dir)
        .args(["--platform", "oracle"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown platform"));
}

#[test]
fn test_docs_with_sibling_views() {
    let root = tempfile::tempdir().unwrap();
    let out = root.path().join("docs");
    let dir = tables_dir(root.path(), "3", &[("Unit.yaml", UNIT_V1)]);
    let views = root.path().join("v3").join("views");
    fs::create_dir_all(&views).unwrap();
    fs::write(
        views.join("vUnits.yaml"),
        "_format_version: \"1.0\"\nview:\n  name: vUnits\n  view_definition: SELECT UnitID FROM dbo.Unit\n",
    )
    .unwrap();

    tabula()
        .arg("--docs")
        .arg(&dir)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success();

    let doc = fs::read_to_string(out.join("SCHEMA.md")).unwrap();
    assert!(doc.starts_with("# Schema reference (v3)"));
    assert!(doc.contains("## vUnits (view)"));
}
