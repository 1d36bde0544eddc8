use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

const SEQUENTIAL_CONFIG: &str = r#"
[lifecycle]
ordered_groups = ["datasource", "server"]
parallel = false

[[observers]]
name = "rest"
tags = ["server"]

[[observers]]
name = "db"
group = "datasource"

[[observers]]
name = "cache"
group = "datasource"

[[observers]]
name = "metrics"
events = ["start"]
"#;

#[test]
fn test_plan_prints_group_order() {
    let config = write_config(SEQUENTIAL_CONFIG);

    let mut cmd = Command::cargo_bin("keel").unwrap();
    cmd.arg("plan")
        .arg("--config")
        .arg(config.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "start:\n  datasource: db, cache\n  server: rest\n  <default>: metrics\n",
        ))
        .stdout(predicate::str::contains(
            "stop:\n  <default>: metrics\n  server: rest\n  datasource: cache, db\n",
        ));
}

#[test]
fn test_run_prints_notifications_in_order() {
    let config = write_config(SEQUENTIAL_CONFIG);

    let mut cmd = Command::cargo_bin("keel").unwrap();
    cmd.arg("run")
        .arg("--config")
        .arg(config.path())
        .assert()
        .success()
        .stdout(predicate::str::diff(
            "start db\nstart cache\nstart rest\nstart metrics\nstop rest\nstop cache\nstop db\n",
        ));
}

#[test]
fn test_run_fails_when_observer_fails() {
    let config = write_config(
        r#"
[lifecycle]
parallel = false

[[observers]]
name = "first"
group = "g"

[[observers]]
name = "broken"
group = "g"
fail_on = "start"

[[observers]]
name = "never"
group = "g"
"#,
    );

    let mut cmd = Command::cargo_bin("keel").unwrap();
    cmd.arg("run")
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("start first\nstart broken\n"))
        .stdout(predicate::str::contains("never").not())
        .stderr(predicate::str::contains("Start failed"));
}

#[test]
fn test_run_without_config_succeeds() {
    let mut cmd = Command::cargo_bin("keel").unwrap();
    cmd.arg("run")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_missing_config_file_fails() {
    let mut cmd = Command::cargo_bin("keel").unwrap();
    cmd.arg("plan")
        .arg("--config")
        .arg("/nonexistent/keel.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_invalid_config_fails() {
    let config = write_config(
        r#"
[lifecycle]
ordered_groups = ["server", "server"]
"#,
    );

    let mut cmd = Command::cargo_bin("keel").unwrap();
    cmd.arg("plan")
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("listed more than once"));
}
