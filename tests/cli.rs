#![forbid(unsafe_code)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn cli(data: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("medplan-cli").unwrap();
    cmd.arg("--data").arg(data);
    cmd
}

#[test]
fn create_reject_and_check() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("schedule.json");

    cli(&data)
        .args(["add-physician", "--id", "p1", "--name", "Dr. Sarah Johnson", "--specialty", "Cardiology"])
        .assert()
        .success()
        .stdout(predicate::str::contains("p1"));

    cli(&data)
        .args(["create", "--physician", "p1", "--date", "2024-01-15", "--start", "08:00", "--end", "16:00", "--location", "A"])
        .assert()
        .success();

    cli(&data)
        .args(["create", "--physician", "Dr. Sarah Johnson", "--date", "2024-01-15", "--start", "15:00", "--end", "18:00", "--location", "B"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Dr. Sarah Johnson is already scheduled during this time"));

    cli(&data)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("OK: no conflicts"));

    let export = dir.path().join("shifts.csv");
    cli(&data).arg("export").arg("--out").arg(&export).assert().success();
    let csv = std::fs::read_to_string(&export).unwrap();
    assert_eq!(csv.lines().count(), 2);
    assert!(csv.starts_with("Date,Physician,Specialty,Start Time,End Time,Type,Location,Status"));
}

#[test]
fn malformed_time_fails_without_saving() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("schedule.json");

    cli(&data)
        .args(["add-physician", "--id", "p1", "--name", "Dr. A", "--specialty", "ER"])
        .assert()
        .success();

    cli(&data)
        .args(["create", "--physician", "p1", "--date", "2024-01-15", "--start", "25:00", "--end", "06:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid time format"));

    cli(&data)
        .arg("summary")
        .assert()
        .success()
        .stdout(predicate::str::contains("Scheduled shifts: 0"));
}

#[test]
fn oversized_overtime_window_is_refused() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("schedule.json");

    cli(&data)
        .args(["--max-hours", "60", "--window-days", "4294967295", "summary"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("window_days"));
}
