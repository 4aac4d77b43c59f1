//! End-to-end CLI tests for the buildfetch binary.

mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use support::socket_guard::start_mock_server_or_skip;
use support::{mount_file, mount_listing};
use tempfile::TempDir;

/// Command with an empty config directory so a user config cannot leak in.
fn buildfetch(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("buildfetch").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_binary_help_displays_usage() {
    let config_home = TempDir::new().unwrap();
    buildfetch(&config_home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--build-id"))
        .stdout(predicate::str::contains("--print-url"));
}

#[test]
fn test_binary_invalid_flag_returns_error() {
    let config_home = TempDir::new().unwrap();
    buildfetch(&config_home)
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_release_without_version_exits_with_error() {
    let config_home = TempDir::new().unwrap();
    buildfetch(&config_home)
        .args(["-p", "linux", "-t", "release"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("version"));
}

#[test]
fn test_unsupported_application_variant_exits_with_error() {
    let config_home = TempDir::new().unwrap();
    buildfetch(&config_home)
        .args(["-a", "b2g", "-p", "linux", "-t", "release", "-v", "1.0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not yet supported"));
}

#[test]
fn test_invalid_config_file_is_reported() {
    let config_home = TempDir::new().unwrap();
    let dir = config_home.path().join("buildfetch");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), "retry_attempts = 1000\n").unwrap();

    buildfetch(&config_home)
        .args(["-p", "linux", "-v", "21.0", "--print-url"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("retry_attempts"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_print_url_resolves_without_downloading() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_listing(
        &server,
        "/pub/firefox/releases/21.0/linux-i686/en-US/",
        &["firefox-21.0.tar.bz2"],
    )
    .await;
    let base_url = format!("{}/pub/", server.uri());
    let expected = format!(
        "{}/pub/firefox/releases/21.0/linux-i686/en-US/firefox-21.0.tar.bz2",
        server.uri()
    );

    let assert = tokio::task::spawn_blocking(move || {
        let config_home = TempDir::new().unwrap();
        buildfetch(&config_home)
            .args(["-p", "linux", "-v", "21.0", "--print-url", "-q"])
            .args(["--base-url", base_url.as_str()])
            .assert()
    })
    .await
    .unwrap();

    assert
        .success()
        .stdout(predicate::str::diff(format!("{expected}\n")));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_direct_url_download_prints_target() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_file(&server, "/files/build.txt", b"payload").await;
    let url = format!("{}/files/build.txt", server.uri());
    let destination = TempDir::new().unwrap();
    let destination_path = destination.path().to_path_buf();

    let assert = tokio::task::spawn_blocking(move || {
        let config_home = TempDir::new().unwrap();
        buildfetch(&config_home)
            .args(["-p", "linux", "-q", "--url", url.as_str()])
            .arg("-d")
            .arg(&destination_path)
            .assert()
    })
    .await
    .unwrap();

    let target = destination.path().join("build.txt");
    assert
        .success()
        .stdout(predicate::str::contains(target.display().to_string()));
    assert_eq!(std::fs::read(target).unwrap(), b"payload");
}
