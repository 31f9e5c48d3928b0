use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

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
fn envoy_dump_is_decompiled_and_translated() {
    gloo_migrate()
        .arg("envoy")
        .arg("--input")
        .arg(fixture("scenario-b.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("kind: HTTPRoute"))
        .stdout(predicate::str::contains("kind: TrafficPolicy"))
        .stdout(predicate::str::contains("gatewayClassName: gloo-gateway"))
        .stderr(predicate::str::contains("rateLimit action maskedRemoteAddress is not supported"))
        .stderr(predicate::str::contains("migrate_summary read=2 "))
        .stderr(predicate::str::contains("unsupported=1"));
}

#[test]
fn envoy_strict_fails_on_unsupported() {
    gloo_migrate()
        .arg("envoy")
        .arg("--input")
        .arg(fixture("scenario-b.json"))
        .arg("--strict")
        .assert()
        .failure()
        .stdout(predicate::str::contains("kind: HTTPRoute"))
        .stderr(predicate::str::contains("strict mode failed: 1 unsupported"));
}

#[test]
fn malformed_dump_is_fatal() {
    gloo_migrate()
        .arg("envoy")
        .arg("--input")
        .arg(fixture("malformed-dump.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to decode configuration dump"));
}

#[test]
fn verbose_logs_go_to_stderr() {
    gloo_migrate()
        .arg("envoy")
        .arg("--input")
        .arg(fixture("scenario-b.json"))
        .arg("--verbose")
        .assert()
        .success()
        .stdout(predicate::str::contains("decoded configuration dump").not())
        .stderr(predicate::str::contains("decoded configuration dump"));
}
