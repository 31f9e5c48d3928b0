use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("fixtures")
        .join(path)
}

fn gloo_migrate() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("gloo-migrate"));
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
fn convert_directory_writes_yaml_to_stdout() {
    gloo_migrate()
        .arg("convert")
        .arg("--input")
        .arg(fixture("scenario-a"))
        .assert()
        .success()
        .stdout(predicate::str::contains("kind: Gateway"))
        .stdout(predicate::str::contains("kind: HTTPRoute"))
        .stdout(predicate::str::contains("kind: Backend\n").not())
        .stderr(predicate::str::contains("migrate_summary read=3 produced="))
        .stderr(predicate::str::contains("unsupported=0"));
}

#[test]
fn convert_writes_output_file() {
    let dir = tempdir().expect("tempdir");
    let out = dir.path().join("migrated.yaml");

    gloo_migrate()
        .arg("convert")
        .arg("--input")
        .arg(fixture("scenario-a/gateway.yaml"))
        .arg(fixture("scenario-a/shop.yaml"))
        .arg("--output")
        .arg(&out)
        .arg("--gateway-class")
        .arg("kgateway")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let yaml = fs::read_to_string(&out).expect("output should be readable");
    assert!(yaml.starts_with("---\n"));
    assert!(yaml.contains("gatewayClassName: kgateway"));
    assert!(yaml.contains("statusCode: 302"));
}

#[test]
fn unknown_upstream_is_reported_not_fatal() {
    gloo_migrate()
        .arg("convert")
        .arg("--input")
        .arg(fixture("unknown-upstream"))
        .assert()
        .success()
        .stdout(predicate::str::contains("name: billing-v2"))
        .stderr(predicate::str::contains("VirtualService gloo-system/billing"))
        .stderr(predicate::str::contains("Upstream gloo-system/billing-v2 not found"))
        .stderr(predicate::str::contains("unknown_reference=1"));
}

#[test]
fn strict_fails_after_writing_output() {
    let dir = tempdir().expect("tempdir");
    let out = dir.path().join("migrated.yaml");

    gloo_migrate()
        .arg("convert")
        .arg("--input")
        .arg(fixture("unknown-upstream"))
        .arg("--output")
        .arg(&out)
        .arg("--strict")
        .assert()
        .failure()
        .stderr(predicate::str::contains("strict mode failed"));

    assert!(out.exists());
}

#[test]
fn json_report_is_structured() {
    let output = gloo_migrate()
        .arg("convert")
        .arg("--input")
        .arg(fixture("unknown-upstream"))
        .arg("--report")
        .arg("json")
        .output()
        .expect("command runs");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stderr).expect("report is JSON");
    assert_eq!(report["summary"]["read"], 1);
    assert_eq!(report["summary"]["unknown_reference"], 1);
    assert!(report["diagnostics"]
        .as_array()
        .expect("entries")
        .iter()
        .any(|d| d["category"] == "UnknownReference"));
}

#[test]
fn refuses_output_inside_input_directory() {
    let dir = tempdir().expect("tempdir");
    fs::copy(fixture("scenario-a/shop.yaml"), dir.path().join("shop.yaml")).expect("copy fixture");

    gloo_migrate()
        .arg("convert")
        .arg("--input")
        .arg(dir.path())
        .arg("--output")
        .arg(dir.path().join("out.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("inside input directory"));
}

#[test]
fn invalid_yaml_is_fatal() {
    let dir = tempdir().expect("tempdir");
    let bad = dir.path().join("bad.yaml");
    fs::write(&bad, "kind: VirtualService\nspec: [unterminated\n").expect("write");

    gloo_migrate()
        .arg("convert")
        .arg("--input")
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load source documents"));
}

#[test]
fn bad_config_file_is_fatal() {
    let dir = tempdir().expect("tempdir");
    let config = dir.path().join("migrate.toml");
    fs::write(&config, "gateway_class_name = 3\n").expect("write");

    gloo_migrate()
        .arg("convert")
        .arg("--input")
        .arg(fixture("scenario-a"))
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config file"));
}
