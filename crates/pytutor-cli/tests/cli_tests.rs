//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A `pytutor` command isolated from the real home directory and any
/// `pytutor.toml` in the working tree.
fn pytutor(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("pytutor").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env_remove("PYTUTOR_PROGRESS")
        .env_remove("PYTUTOR_PYTHON")
        .arg("--progress")
        .arg(dir.path().join("progress.json"));
    cmd
}

fn python_available() -> bool {
    std::process::Command::new("python3")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

#[test]
fn validate_builtin_catalog() {
    let dir = TempDir::new().unwrap();
    pytutor(&dir)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("15 challenges, 15 lessons"))
        .stdout(predicate::str::contains("All catalogs valid"));
}

#[test]
fn validate_nonexistent_file() {
    let dir = TempDir::new().unwrap();
    pytutor(&dir)
        .arg("validate")
        .arg("--catalog")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    pytutor(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created pytutor.toml"))
        .stdout(predicate::str::contains("Created catalog/example.toml"));

    assert!(dir.path().join("pytutor.toml").exists());
    assert!(dir.path().join("catalog/example.toml").exists());

    pytutor(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists, skipping"));
}

#[test]
fn init_then_validate_example() {
    let dir = TempDir::new().unwrap();
    pytutor(&dir).arg("init").assert().success();

    pytutor(&dir)
        .arg("validate")
        .arg("--catalog")
        .arg("catalog/example.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("Example Catalog (2 challenges, 1 lessons)"))
        .stdout(predicate::str::contains("All catalogs valid"));

    pytutor(&dir)
        .arg("validate")
        .arg("--catalog")
        .arg("catalog")
        .assert()
        .success()
        .stdout(predicate::str::contains("Example Catalog"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("bad.toml"),
        r#"[catalog]
id = "bad"
name = "Bad"
default_stage = "beginner"

[[challenges]]
id = "lopsided"
title = "Lopsided"
prompt = "Print something."
tiers = { full = 10, partial = 20, missing = 5, consolation = 5 }
"#,
    )
    .unwrap();

    pytutor(&dir)
        .arg("validate")
        .arg("--catalog")
        .arg("bad.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("[lopsided] WARNING"))
        .stdout(predicate::str::contains("warning(s) found"));
}

#[test]
fn list_shows_every_stage() {
    let dir = TempDir::new().unwrap();
    pytutor(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("beginner_challenge_1"))
        .stdout(predicate::str::contains("advanced_lesson_2"));
}

#[test]
fn list_filters_by_stage() {
    let dir = TempDir::new().unwrap();
    pytutor(&dir)
        .arg("list")
        .arg("--stage")
        .arg("intermediate")
        .assert()
        .success()
        .stdout(predicate::str::contains("intermediate_challenge_1"))
        .stdout(predicate::str::contains("beginner_challenge_1").not());

    pytutor(&dir)
        .arg("list")
        .arg("--stage")
        .arg("expert")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown stage"));
}

#[test]
fn stats_json_for_fresh_learner() {
    let dir = TempDir::new().unwrap();
    let output = pytutor(&dir)
        .arg("stats")
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["total_points"], 0);
    assert_eq!(json["level"], 1);
    assert_eq!(json["stages"].as_array().unwrap().len(), 3);
}

#[test]
fn stats_writes_markdown_file() {
    let dir = TempDir::new().unwrap();
    let report = dir.path().join("progress.md");
    pytutor(&dir)
        .arg("stats")
        .arg("--format")
        .arg("markdown")
        .arg("--output")
        .arg(&report)
        .assert()
        .success();
    assert!(std::fs::read_to_string(&report).unwrap().contains('#'));
}

#[test]
fn stats_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    pytutor(&dir)
        .arg("stats")
        .arg("--format")
        .arg("yaml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn grade_unknown_challenge() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("answer.py"), "print(1)").unwrap();
    pytutor(&dir)
        .arg("grade")
        .arg("--challenge")
        .arg("no_such_challenge")
        .arg("--file")
        .arg("answer.py")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown challenge: no_such_challenge"));
}

#[test]
fn play_saves_name_and_exits() {
    let dir = TempDir::new().unwrap();
    pytutor(&dir)
        .arg("play")
        .write_stdin("Ada\n\n0\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome back, Ada!"))
        .stdout(predicate::str::contains("Thank you for learning Python!"));

    let saved = std::fs::read_to_string(dir.path().join("progress.json")).unwrap();
    assert!(saved.contains("Ada"));
}

#[test]
fn play_is_the_default_command() {
    let dir = TempDir::new().unwrap();
    pytutor(&dir)
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Enter your name to begin"));
}

#[test]
fn grade_records_points() {
    if !python_available() {
        eprintln!("python3 not available, skipping");
        return;
    }
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("answer.py"), "print('Hello, Python!')\n").unwrap();

    pytutor(&dir)
        .arg("grade")
        .arg("--challenge")
        .arg("beginner_challenge_1")
        .arg("--file")
        .arg("answer.py")
        .assert()
        .success()
        .stdout(predicate::str::contains("Correct! You earned 20 points!"));

    let output = pytutor(&dir)
        .arg("stats")
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["total_points"], 20);
}

#[test]
fn grade_dry_run_records_nothing() {
    if !python_available() {
        eprintln!("python3 not available, skipping");
        return;
    }
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("answer.py"), "print('hello')\n").unwrap();

    let output = pytutor(&dir)
        .arg("grade")
        .arg("--challenge")
        .arg("beginner_challenge_1")
        .arg("--file")
        .arg("answer.py")
        .arg("--dry-run")
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["assessment"]["tier"], "partial");
    assert!(!dir.path().join("progress.json").exists());
}

#[cfg(unix)]
#[test]
#[allow(deprecated)]
fn ctrl_c_saves_and_exits_while_waiting_for_input() {
    use std::io::{Read, Write};
    use std::process::Stdio;
    use std::time::{Duration, Instant};

    let dir = TempDir::new().unwrap();
    let progress = dir.path().join("progress.json");
    let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("pytutor"))
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .env_remove("PYTUTOR_PROGRESS")
        .arg("--progress")
        .arg(&progress)
        .arg("play")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    // stdin stays open, so the session blocks at the main menu.
    let mut stdin = child.stdin.take().unwrap();
    stdin.write_all(b"Ada\n\n").unwrap();
    stdin.flush().unwrap();

    let mut stdout = child.stdout.take().unwrap();
    let reader = std::thread::spawn(move || {
        let mut seen = Vec::new();
        let mut buf = [0u8; 1024];
        while let Ok(n) = stdout.read(&mut buf) {
            if n == 0 {
                break;
            }
            seen.extend_from_slice(&buf[..n]);
        }
        String::from_utf8_lossy(&seen).into_owned()
    });

    let deadline = Instant::now() + Duration::from_secs(10);
    while !progress.exists() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(50));
    }
    // Let the menu prompt reach its read.
    std::thread::sleep(Duration::from_millis(500));

    let killed = std::process::Command::new("kill")
        .arg("-INT")
        .arg(child.id().to_string())
        .status()
        .unwrap();
    assert!(killed.success());

    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline + Duration::from_secs(5) {
            child.kill().unwrap();
            panic!("pytutor still running after SIGINT");
        }
        std::thread::sleep(Duration::from_millis(50));
    };
    drop(stdin);

    assert_eq!(status.code(), Some(130));
    let output = reader.join().unwrap();
    assert!(output.contains("Your progress has been saved"));
    assert!(std::fs::read_to_string(&progress).unwrap().contains("Ada"));
}
