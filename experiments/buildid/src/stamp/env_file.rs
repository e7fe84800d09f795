use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::StampRecord;
use crate::config::EnvKeys;
use crate::identity::BuildIdentity;

/// Render `KEY=VALUE` lines, each newline-terminated.
///
/// Order is fixed: build id, commit, then the derived build time and the
/// branch when they exist.
#[must_use]
pub fn render(record: &StampRecord, keys: &EnvKeys) -> String {
    let mut lines = vec![
        (keys.build_id.as_str(), record.identity.build_id().to_string()),
        (keys.commit_sha.as_str(), record.identity.commit_sha().to_string()),
    ];
    if let Some(time) = record.identity.build_time_iso() {
        lines.push((keys.build_time.as_str(), time));
    }
    if let Some(branch) = &record.branch {
        lines.push((keys.branch.as_str(), branch.clone()));
    }

    lines
        .into_iter()
        .map(|(key, value)| format!("{key}={}\n", quote(&value)))
        .collect()
}

fn quote(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '#' | '"' | '\'' | '\\' | '$' | '`'));
    if !needs_quotes {
        return value.to_string();
    }
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$")
        .replace('`', "\\`")
        .replace('\n', "\\n");
    format!("\"{escaped}\"")
}

/// Parse env-file content into a map. Later duplicates win.
#[must_use]
pub fn parse(content: &str) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        vars.insert(key.trim().to_string(), unquote(value.trim()));
    }
    vars
}

fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        let inner = &value[1..value.len() - 1];
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some('n') => out.push('\n'),
                    Some(other) => out.push(other),
                    None => out.push('\\'),
                }
            } else {
                out.push(c);
            }
        }
        out
    } else if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        value[1..value.len() - 1].to_string()
    } else {
        value.to_string()
    }
}

/// Read back the record a previous stage wrote to `path`
pub fn read_record(path: &Path, keys: &EnvKeys) -> Result<StampRecord> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read env file: {}", path.display()))?;
    let vars = parse(&content);

    let build_id = vars
        .get(&keys.build_id)
        .filter(|v| !v.is_empty())
        .with_context(|| format!("{} missing from {}", keys.build_id, path.display()))?;
    let commit_sha = vars
        .get(&keys.commit_sha)
        .filter(|v| !v.is_empty())
        .with_context(|| format!("{} missing from {}", keys.commit_sha, path.display()))?;

    Ok(StampRecord {
        identity: BuildIdentity::new(build_id.clone(), commit_sha.clone()),
        branch: vars.get(&keys.branch).filter(|v| !v.is_empty()).cloned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(branch: Option<&str>) -> StampRecord {
        StampRecord {
            identity: BuildIdentity::new("20261014-093005", "622a34a1f99d5ce0dbb5ea1d0186d4c51ff75dde"),
            branch: branch.map(ToString::to_string),
        }
    }

    #[test]
    fn test_render_fixed_keys() {
        let out = render(&record(Some("main")), &EnvKeys::default());
        assert_eq!(
            out,
            "REACT_APP_BUILD_ID=20261014-093005\n\
             REACT_APP_COMMIT_SHA=622a34a1f99d5ce0dbb5ea1d0186d4c51ff75dde\n\
             REACT_APP_BUILD_TIME=2026-10-14T09:30:05Z\n\
             REACT_APP_BUILD_BRANCH=main\n"
        );
    }

    #[test]
    fn test_render_omits_underivable_fields() {
        let record = StampRecord::from(BuildIdentity::new("release-42", "unknown"));
        let out = render(&record, &EnvKeys::default());
        assert_eq!(out, "REACT_APP_BUILD_ID=release-42\nREACT_APP_COMMIT_SHA=unknown\n");
    }

    #[test]
    fn test_parse_skips_comments_and_unquotes() {
        let vars = parse("# comment\n\nexport A=1\nB=\"two words\"\nC='x y'\nD = spaced \n");
        assert_eq!(vars["A"], "1");
        assert_eq!(vars["B"], "two words");
        assert_eq!(vars["C"], "x y");
        assert_eq!(vars["D"], "spaced");
    }

    #[test]
    fn test_quoted_values_read_back() {
        let record = StampRecord {
            identity: BuildIdentity::new("build #7", "abc"),
            branch: Some("fix \"quotes\" $HOME".to_string()),
        };
        let keys = EnvKeys::default();
        let vars = parse(&render(&record, &keys));
        assert_eq!(vars[&keys.build_id], "build #7");
        assert_eq!(vars[&keys.branch], "fix \"quotes\" $HOME");
    }

    #[test]
    fn test_backticks_are_escaped() {
        let record = StampRecord {
            identity: BuildIdentity::new("20261014-093005", "abc"),
            branch: Some("feat`echo INJECTED`".to_string()),
        };
        let keys = EnvKeys::default();
        let out = render(&record, &keys);
        assert!(out.contains("REACT_APP_BUILD_BRANCH=\"feat\\`echo INJECTED\\`\"\n"));
        assert_eq!(parse(&out)[&keys.branch], "feat`echo INJECTED`");
    }

    #[test]
    fn test_sourced_by_shell_verbatim() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(".env.build");
        let branch = "feat`echo INJECTED` $(echo X) \"q\" \\ $HOME";
        let record = StampRecord {
            identity: BuildIdentity::new("20261014-093005", "abc"),
            branch: Some(branch.to_string()),
        };
        fs::write(&path, render(&record, &EnvKeys::default())).unwrap();

        let Ok(output) = std::process::Command::new("sh")
            .arg("-c")
            .arg(". \"$1\"; printf %s \"$REACT_APP_BUILD_BRANCH\"")
            .arg("sh")
            .arg(&path)
            .output()
        else {
            return;
        };
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout), branch);
    }

    #[test]
    fn test_read_record_from_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(".env.build");
        let keys = EnvKeys::default();
        fs::write(&path, render(&record(Some("main")), &keys)).unwrap();

        let read = read_record(&path, &keys).unwrap();
        assert_eq!(read, record(Some("main")));
    }

    #[test]
    fn test_read_record_missing_key() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(".env.build");
        fs::write(&path, "REACT_APP_BUILD_ID=20261014-093005\n").unwrap();
        let err = read_record(&path, &EnvKeys::default()).unwrap_err();
        assert!(format!("{err}").contains("REACT_APP_COMMIT_SHA"));
    }
}
