use assert_cmd::Command;

#[test]
fn config_show_redacts_the_password() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("hrm.yaml");
    std::fs::write(
        &path,
        "target:\n  base_url: \"https://hrm.internal.example\"\n  password: \"s3cret-pass\"\n",
    )
    .expect("write config");

    let output = Command::cargo_bin("hrm-autopilot")
        .expect("binary built")
        .env_remove("HRM_PASSWORD")
        .env_remove("HRM_BASE_URL")
        .args(["--config", path.to_str().expect("utf8 path"), "config", "show"])
        .output()
        .expect("run config show");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("https://hrm.internal.example"));
    assert!(stdout.contains("********"));
    assert!(!stdout.contains("s3cret-pass"));
}

#[test]
fn invalid_config_exits_non_zero() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("hrm.yaml");
    std::fs::write(&path, "target:\n  base_url: \"not a url\"\n").expect("write config");

    let output = Command::cargo_bin("hrm-autopilot")
        .expect("binary built")
        .env_remove("HRM_BASE_URL")
        .args(["--config", path.to_str().expect("utf8 path"), "config", "show"])
        .output()
        .expect("run config show");

    assert!(!output.status.success());
}
