use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use view_export::host::{export_view, Base, CursorTracking};
use view_export::{ExportFormat, ExportRequest, TabularExporter};

const SNAPSHOT: &str = r#"{
    "name": "Team",
    "tables": [
        {
            "id": "tblPeople",
            "name": "People",
            "fields": [
                {"id": "fldName", "name": "Name"},
                {"id": "fldTags", "name": "Tags"}
            ],
            "views": [
                {"id": "viwGrid", "name": "Grid view"},
                {"id": "viwNone", "name": "Nobody", "record_ids": []}
            ],
            "records": [
                {"id": "rec1", "cells": {"fldName": "Alice", "fldTags": [{"name": "VIP"}, {"name": "New"}]}},
                {"id": "rec2", "cells": {"fldName": "Bob", "fldTags": null}}
            ]
        },
        {"id": "tblEmpty", "name": "Archive", "views": [{"id": "viwOld", "name": "Old"}]}
    ],
    "cursor": {"active_table_id": "tblPeople", "active_view_id": "viwGrid"}
}"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("base.json"), SNAPSHOT).unwrap();
        Self { dir }
    }

    fn snapshot(&self) -> PathBuf {
        self.dir.path().join("base.json")
    }

    fn out(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("view_export").unwrap();
        cmd.arg("--config").arg(self.dir.path().join("config.json"));
        cmd
    }
}

fn only_file(dir: &Path) -> PathBuf {
    let entries: Vec<PathBuf> = fs::read_dir(dir).unwrap().map(|e| e.unwrap().path()).collect();
    assert_eq!(entries.len(), 1, "expected one exported file in {}", dir.display());
    entries[0].clone()
}

#[test]
fn test_export_csv_with_custom_name() {
    let fx = Fixture::new();

    fx.cmd()
        .args(["export", "--format", "csv", "--filename", "people", "--output-dir"])
        .arg(fx.out())
        .arg(fx.snapshot())
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 records to"));

    let content = fs::read_to_string(fx.out().join("people.csv")).unwrap();
    assert_eq!(content, "\"Name\",\"Tags\"\n\"Alice\",\"VIP, New\"\n\"Bob\",\"\"");
}

#[test]
fn test_export_xlsx_default_name_from_cursor() {
    let fx = Fixture::new();

    fx.cmd()
        .args(["export", "--cursor", "--output-dir"])
        .arg(fx.out())
        .arg(fx.snapshot())
        .assert()
        .success();

    let path = only_file(&fx.out());
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("People_Grid view_"), "unexpected name {}", name);
    assert!(name.ends_with(".xlsx"));
    assert_eq!(&fs::read(&path).unwrap()[..2], b"PK");
}

#[test]
fn test_export_to_stdout() {
    let fx = Fixture::new();

    fx.cmd()
        .args(["export", "--table", "People", "--view", "viwGrid", "-f", "csv", "--stdout"])
        .arg(fx.snapshot())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("\"Name\",\"Tags\""));
}

#[test]
fn test_require_records_fails_on_empty_view() {
    let fx = Fixture::new();

    fx.cmd()
        .args(["export", "--table", "People", "--view", "Nobody", "--require-records", "--output-dir"])
        .arg(fx.out())
        .arg(fx.snapshot())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No records to export"));
}

#[test]
fn test_unknown_view_fails() {
    let fx = Fixture::new();

    fx.cmd()
        .args(["export", "--table", "People", "--view", "Missing", "--stdout"])
        .arg(fx.snapshot())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing selection"));
}

#[test]
fn test_tables_marks_active_view() {
    let fx = Fixture::new();

    fx.cmd()
        .arg("tables")
        .arg(fx.snapshot())
        .assert()
        .success()
        .stdout(predicate::str::contains("* People (tblPeople) - 2 fields, 2 records"))
        .stdout(predicate::str::contains("* Grid view (viwGrid) - 2 records"))
        .stdout(predicate::str::contains("Archive (tblEmpty)"));
}

#[test]
fn test_config_init_writes_defaults() {
    let fx = Fixture::new();

    fx.cmd()
        .args(["config", "--init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"default_format\": \"xlsx\""));

    assert!(fx.dir.path().join("config.json").exists());
}

#[test]
fn test_config_format_is_used() {
    let fx = Fixture::new();
    fs::write(
        fx.dir.path().join("config.json"),
        r#"{"default_format": "csv", "csv": {"delimiter": ";"}}"#,
    )
    .unwrap();

    fx.cmd()
        .args(["export", "--first", "--stdout"])
        .arg(fx.snapshot())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("\"Name\";\"Tags\""));
}

#[tokio::test]
async fn test_snapshot_loads_and_exports() {
    let fx = Fixture::new();
    let base = Base::load(&fx.snapshot()).await.unwrap();

    let result = export_view(
        &base,
        &CursorTracking::new(),
        &ExportRequest::new(ExportFormat::Csv).with_filename("team.CSV"),
        &TabularExporter::new(),
    )
    .unwrap();

    assert_eq!(result.suggested_filename, "team.CSV");
    assert_eq!(result.record_count, 2);
    assert_eq!(base.open_query_count(), 0);
}

#[tokio::test]
async fn test_missing_snapshot_is_io_error() {
    let fx = Fixture::new();
    let err = Base::load(&fx.dir.path().join("absent.json")).await.unwrap_err();
    assert!(matches!(err, view_export::ExportError::Io(_)));
}
