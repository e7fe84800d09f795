use chrono::{TimeZone, Utc};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use buildid::config::{EnvAliases, EnvKeys};
use buildid::env::EnvSnapshot;
use buildid::git::NoVcs;
use buildid::stamp::{self, module, ArtifactKind, StampRecord};
use buildid::verify::{self, Check, VerifyOptions};
use buildid::{resolve, UNKNOWN_COMMIT};

const CI_SHA: &str = "622a34a1f99d5ce0dbb5ea1d0186d4c51ff75dde";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="build-id" content="%REACT_APP_BUILD_ID%" />
    <meta name="commit-sha" content="%REACT_APP_COMMIT_SHA%" />
    <title>Home Services</title>
  </head>
  <body>
    <div id="root"></div>
  </body>
</html>
"#;

/// Stamp all three artifact kinds under `root` and return verify options
/// pointing at the env file and module
fn stamp_all(root: &Path, record: &StampRecord) -> VerifyOptions {
    let keys = EnvKeys::default();
    let build = root.join("build");
    fs::create_dir_all(&build).unwrap();
    fs::write(build.join("index.html"), TEMPLATE).unwrap();

    let env_path = root.join(".env.build");
    let module_path = root.join("src/buildInfo.generated.js");
    stamp::stamp(record, ArtifactKind::Env, &env_path, &keys).unwrap();
    stamp::stamp(record, ArtifactKind::Module, &module_path, &keys).unwrap();
    stamp::stamp(record, ArtifactKind::Html, &build.join("index.html"), &keys).unwrap();

    VerifyOptions {
        env_file: Some(env_path),
        module: Some(module_path),
        ..VerifyOptions::default()
    }
}

#[test]
fn ci_commit_flows_through_every_artifact() {
    let temp = tempdir().unwrap();
    let now = Utc.with_ymd_and_hms(2026, 10, 14, 9, 30, 5).unwrap();
    let env: EnvSnapshot = [("GITHUB_SHA", CI_SHA)].into_iter().collect();

    let resolution = resolve(&env, &NoVcs, &EnvAliases::default(), now);
    assert_eq!(resolution.identity.build_id(), "20261014-093005");
    assert_eq!(resolution.identity.commit_sha(), CI_SHA);

    let options = stamp_all(temp.path(), &StampRecord::from(&resolution));
    let report = verify::verify(&temp.path().join("build"), &options).unwrap();
    assert!(report.is_clean(), "unexpected violations: {:?}", report.violations);

    let from_module = module::read(&temp.path().join("src/buildInfo.generated.js")).unwrap();
    assert_eq!(from_module, resolution.identity);
}

#[test]
fn missing_commit_sources_resolve_to_unknown_and_still_pass() {
    let temp = tempdir().unwrap();
    let resolution = resolve(&EnvSnapshot::default(), &NoVcs, &EnvAliases::default(), Utc::now());
    assert_eq!(resolution.identity.commit_sha(), UNKNOWN_COMMIT);

    let options = stamp_all(temp.path(), &StampRecord::from(&resolution));
    let report = verify::verify(&temp.path().join("build"), &options).unwrap();
    assert_eq!(report.count(Check::CommitPresence), 0);
    assert!(report.is_clean(), "unexpected violations: {:?}", report.violations);
}

#[test]
fn html_stamped_from_a_different_identity_is_caught() {
    let temp = tempdir().unwrap();
    let first = StampRecord::from(buildid::BuildIdentity::new("20261014-093005", CI_SHA));
    let options = stamp_all(temp.path(), &first);

    // A later stage that re-resolved instead of reusing the env file
    let drifted = buildid::BuildIdentity::new("20261014-093107", CI_SHA);
    let index = temp.path().join("build/index.html");
    stamp::stamp(&StampRecord::from(drifted), ArtifactKind::Html, &index, &EnvKeys::default()).unwrap();

    let report = verify::verify(&temp.path().join("build"), &options).unwrap();
    // Once against the env file, once against the module
    assert_eq!(report.count(Check::CrossArtifactConsistency), 2);
    assert_eq!(report.violations.len(), 2);
}

#[test]
fn unstamped_template_is_rejected() {
    let temp = tempdir().unwrap();
    let build = temp.path().join("build");
    fs::create_dir_all(&build).unwrap();
    fs::write(build.join("index.html"), TEMPLATE).unwrap();

    let report = verify::verify(&build, &VerifyOptions::default()).unwrap();
    assert_eq!(report.count(Check::LeftoverPlaceholder), 2);
    assert_eq!(report.count(Check::BuildIdFormat), 1);
    assert_eq!(report.count(Check::CrossArtifactConsistency), 1);
}
