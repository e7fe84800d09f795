use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::identity::BuildIdentity;

pub const BANNER: &str = "// Generated by buildid. Do not edit.";

const BUILD_ID_CONST: &str = "BUILD_ID";
const COMMIT_SHA_CONST: &str = "COMMIT_SHA";

/// Render the module exporting `BUILD_ID` and `COMMIT_SHA`.
/// String literals are JSON-encoded, which is valid JavaScript and TypeScript.
pub fn render(identity: &BuildIdentity) -> Result<String> {
    let build_id = serde_json::to_string(identity.build_id())?;
    let commit_sha = serde_json::to_string(identity.commit_sha())?;
    Ok(format!(
        "{BANNER}\n\
         export const {BUILD_ID_CONST} = {build_id};\n\
         export const {COMMIT_SHA_CONST} = {commit_sha};\n"
    ))
}

fn export_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?m)^\s*export\s+const\s+([A-Z_]+)\s*=\s*("(?:[^"\\]|\\.)*")\s*;?\s*$"#)
            .expect("export pattern is a valid regex")
    })
}

/// Read both constants back out of module source
pub fn parse(source: &str) -> Result<BuildIdentity> {
    let mut build_id = None;
    let mut commit_sha = None;
    for caps in export_pattern().captures_iter(source) {
        let value: String = serde_json::from_str(&caps[2])
            .with_context(|| format!("invalid string literal for {}", &caps[1]))?;
        match &caps[1] {
            BUILD_ID_CONST => build_id = Some(value),
            COMMIT_SHA_CONST => commit_sha = Some(value),
            _ => {}
        }
    }

    let build_id = build_id.with_context(|| format!("module does not export {BUILD_ID_CONST}"))?;
    let commit_sha =
        commit_sha.with_context(|| format!("module does not export {COMMIT_SHA_CONST}"))?;
    Ok(BuildIdentity::new(build_id, commit_sha))
}

pub fn read(path: &Path) -> Result<BuildIdentity> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read generated module: {}", path.display()))?;
    parse(&source).with_context(|| format!("failed to parse generated module: {}", path.display()))
}
