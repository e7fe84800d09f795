use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const CI_SHA: &str = "622a34a1f99d5ce0dbb5ea1d0186d4c51ff75dde";

const TEMPLATE: &str = "<!DOCTYPE html>\n<html>\n  <head>\n    <meta name=\"build-id\" content=\"%REACT_APP_BUILD_ID%\" />\n    <title>Home</title>\n  </head>\n  <body></body>\n</html>\n";

/// Binary with a clean environment, rooted at `root`, never touching git
fn buildid(root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_buildid"));
    cmd.env_clear().arg("--root").arg(root).arg("--no-vcs");
    cmd
}

fn write_template(root: &Path) {
    fs::create_dir_all(root.join("build")).expect("create build dir");
    fs::write(root.join("build/index.html"), TEMPLATE).expect("write template");
}

#[test]
fn resolve_prints_ci_commit_as_json() {
    let temp = TempDir::new().expect("tempdir");
    buildid(temp.path())
        .env("GITHUB_SHA", CI_SHA)
        .args(["resolve", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("\"commitSha\": \"{CI_SHA}\"")))
        .stdout(predicate::str::contains("\"kind\": \"timestamp\""));
}

#[test]
fn resolve_honours_override() {
    let temp = TempDir::new().expect("tempdir");
    buildid(temp.path())
        .env("BUILD_ID_OVERRIDE", "20250101-120000")
        .arg("resolve")
        .assert()
        .success()
        .stdout(predicate::str::contains("Build ID:   20250101-120000 (override BUILD_ID_OVERRIDE)"))
        .stdout(predicate::str::contains("Commit SHA: unknown (fallback)"));
}

#[test]
fn staged_pipeline_verifies_clean() {
    let temp = TempDir::new().expect("tempdir");
    let root = temp.path();

    // Before the bundler: env file and module
    buildid(root)
        .env("GITHUB_SHA", CI_SHA)
        .arg("stamp")
        .assert()
        .success()
        .stdout(predicate::str::contains("Stamped env:"))
        .stdout(predicate::str::contains("Stamped module:"));

    let env_file = fs::read_to_string(root.join(".env.build")).expect("env file");
    assert!(env_file.contains(&format!("REACT_APP_COMMIT_SHA={CI_SHA}\n")));

    // After the bundler: HTML, reusing the identity already on disk
    write_template(root);
    buildid(root)
        .args(["stamp", "--kind", "html", "--html", "build/index.html", "--reuse"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stamped html:"));

    buildid(root)
        .args([
            "verify",
            "build",
            "--env-file",
            ".env.build",
            "--module",
            "src/buildInfo.generated.js",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 violation(s)"));

    buildid(root)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Commit: {CI_SHA}")));
}

#[test]
fn verify_reports_leftover_placeholder() {
    let temp = TempDir::new().expect("tempdir");
    write_template(temp.path());

    buildid(temp.path())
        .args(["verify", "build"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("error[leftover-placeholder] index.html:4"))
        .stdout(predicate::str::contains("%REACT_APP_BUILD_ID%"))
        .stdout(predicate::str::contains("error[commit-presence]"))
        .stderr(predicate::str::contains("verification failed"));
}

#[test]
fn verify_json_lists_every_violation() {
    let temp = TempDir::new().expect("tempdir");
    write_template(temp.path());

    let output = buildid(temp.path())
        .args(["verify", "build", "--format", "json"])
        .output()
        .expect("run buildid");
    assert!(!output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json report");
    let checks: Vec<&str> = report["violations"]
        .as_array()
        .expect("violations array")
        .iter()
        .filter_map(|v| v["check"].as_str())
        .collect();
    assert_eq!(
        checks,
        vec![
            "leftover-placeholder",
            "build-id-format",
            "commit-presence",
            "cross-artifact-consistency",
        ]
    );
}

#[test]
fn stamp_html_without_documents_fails() {
    let temp = TempDir::new().expect("tempdir");
    buildid(temp.path())
        .args(["stamp", "--kind", "html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no HTML documents to stamp"));
}

#[test]
fn reuse_without_env_file_fails() {
    let temp = TempDir::new().expect("tempdir");
    write_template(temp.path());
    buildid(temp.path())
        .args(["stamp", "--kind", "html", "--html", "build/index.html", "--reuse"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(".env.build"));
    // Nothing was written
    let html = fs::read_to_string(temp.path().join("build/index.html")).expect("template");
    assert_eq!(html, TEMPLATE);
}

#[test]
fn configured_paths_are_used() {
    let temp = TempDir::new().expect("tempdir");
    let root = temp.path();
    fs::write(
        root.join("buildid.toml"),
        "[artifacts]\nenv_file = \"out/build.env\"\nmodule = \"src/version.ts\"\n\n[keys]\nbuild_id = \"VITE_BUILD_ID\"\n",
    )
    .expect("write config");

    buildid(root)
        .env("BUILD_ID_OVERRIDE", "20261014-101010")
        .arg("stamp")
        .assert()
        .success();

    let env_file = fs::read_to_string(root.join("out/build.env")).expect("env file");
    assert!(env_file.starts_with("VITE_BUILD_ID=20261014-101010\n"));
    let module = fs::read_to_string(root.join("src/version.ts")).expect("module");
    assert!(module.contains("export const BUILD_ID = \"20261014-101010\";"));
}
