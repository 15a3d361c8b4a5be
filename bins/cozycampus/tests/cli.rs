use assert_cmd::Command;
use predicates::prelude::*;

fn cozycampus(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("cozycampus").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("COZYCAMPUS_CONFIG")
        .env_remove("COZYCAMPUS_ENV")
        .env_remove("COZYCAMPUS_FALLBACK")
        .env_remove("COZYCAMPUS_TOKEN")
        .env_remove("COZYCAMPUS_FORUM_URL")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_resources() {
    let dir = tempfile::tempdir().unwrap();
    cozycampus(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("club-events"))
        .stdout(predicate::str::contains("participants"));
}

#[test]
fn test_config_show_json_uses_environment() {
    let dir = tempfile::tempdir().unwrap();
    cozycampus(&dir)
        .env("COZYCAMPUS_API_URL", "http://campus.test/api")
        .args(["config", "show", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"base_url\": \"http://campus.test/api\""))
        .stdout(predicate::str::contains("\"forum_url\": \"http://campus.test/api\""))
        .stdout(predicate::str::contains("token").not());
}

#[test]
fn test_config_file_is_read() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("cozycampus.toml"),
        "forum_url = \"http://forum.test\"\ntimeout = 5\n",
    )
    .unwrap();

    cozycampus(&dir)
        .env_remove("COZYCAMPUS_API_URL")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://forum.test"))
        .stdout(predicate::str::contains("5s"));
}

#[test]
fn test_production_rejects_fallback() {
    let dir = tempfile::tempdir().unwrap();
    cozycampus(&dir)
        .env("COZYCAMPUS_ENV", "production")
        .env("COZYCAMPUS_FALLBACK", "development")
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_short_comment_rejected_before_network() {
    let dir = tempfile::tempdir().unwrap();
    cozycampus(&dir)
        .env("COZYCAMPUS_API_URL", "http://127.0.0.1:9")
        .args(["comments", "post", "3", "ok", "--user", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 3 characters"));
}

#[test]
fn test_blank_transition_status_rejected() {
    let dir = tempfile::tempdir().unwrap();
    cozycampus(&dir)
        .args(["events", "transition", "3", "", "--creator", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown event status"));
}

#[test]
fn test_reports_help_lists_moderation_actions() {
    let dir = tempfile::tempdir().unwrap();
    cozycampus(&dir)
        .args(["reports", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pending"))
        .stdout(predicate::str::contains("resolve"));
}
