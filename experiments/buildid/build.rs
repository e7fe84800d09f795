use std::process::Command;

fn capture(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8(output.stdout).ok()?.trim().to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn main() {
    // The tool's own identity, shown by `buildid --version`
    let git_hash = capture("git", &["rev-parse", "--short", "HEAD"])
        .unwrap_or_else(|| "unknown".to_string());
    let build_date =
        capture("date", &["-u", "+%Y%m%d"]).unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=BUILDID_SELF_GIT_HASH={git_hash}");
    println!("cargo:rustc-env=BUILDID_SELF_BUILD_DATE={build_date}");

    println!("cargo:rerun-if-changed=../../.git/HEAD");
}
