//! Post-build checks over a finished output directory.
//!
//! Every check runs and every violation is collected, so one report lists
//! everything a rerun has to fix. Nothing here writes to disk.

use anyhow::{bail, Context, Result};
use glob::{glob_with, MatchOptions, Pattern};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::EnvKeys;
use crate::identity::{self, BuildIdentity};
use crate::placeholder;
use crate::stamp::{env_file, html, module};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Check {
    EntryDocument,
    LeftoverPlaceholder,
    BuildIdFormat,
    CommitPresence,
    CrossArtifactConsistency,
}

impl Check {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EntryDocument => "entry-document",
            Self::LeftoverPlaceholder => "leftover-placeholder",
            Self::BuildIdFormat => "build-id-format",
            Self::CommitPresence => "commit-presence",
            Self::CrossArtifactConsistency => "cross-artifact-consistency",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub check: Check,
    /// Relative to the output directory when the file lies inside it
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub detail: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.check, self.path.display())?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
        }
        write!(f, ": {}", self.detail)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub documents_scanned: usize,
    pub entries_checked: usize,
    pub violations: Vec<Violation>,
}

impl Report {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    #[must_use]
    pub fn count(&self, check: Check) -> usize {
        self.violations.iter().filter(|v| v.check == check).count()
    }
}

#[derive(Debug, Clone)]
pub struct VerifyOptions {
    /// Entry documents relative to the output directory
    pub entries: Vec<String>,
    /// Env cascade file whose values must match the HTML stamp
    pub env_file: Option<PathBuf>,
    /// Generated module whose values must match the HTML stamp
    pub module: Option<PathBuf>,
    pub keys: EnvKeys,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            entries: vec!["index.html".to_string()],
            env_file: None,
            module: None,
            keys: EnvKeys::default(),
        }
    }
}

struct Collector<'a> {
    out_dir: &'a Path,
    report: Report,
}

impl Collector<'_> {
    fn push(&mut self, check: Check, path: &Path, line: Option<usize>, detail: impl Into<String>) {
        let path = path.strip_prefix(self.out_dir).unwrap_or(path).to_path_buf();
        self.report.violations.push(Violation {
            check,
            path,
            line,
            detail: detail.into(),
        });
    }
}

/// Verify the build output in `out_dir`.
///
/// Fails only when the directory itself cannot be scanned; check failures
/// are returned in the [`Report`].
pub fn verify(out_dir: &Path, options: &VerifyOptions) -> Result<Report> {
    if !out_dir.is_dir() {
        bail!("output directory not found: {}", out_dir.display());
    }

    let mut collector = Collector {
        out_dir,
        report: Report::default(),
    };

    for path in html_documents(out_dir)? {
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                collector.push(Check::LeftoverPlaceholder, &path, None, format!("could not scan: {e}"));
                continue;
            }
        };
        let content = String::from_utf8_lossy(&bytes);
        collector.report.documents_scanned += 1;
        for token in placeholder::find_tokens(&content) {
            collector.push(
                Check::LeftoverPlaceholder,
                &path,
                Some(token.line),
                format!("unresolved placeholder {}", token.text),
            );
        }
    }

    let references = read_references(options, &mut collector);

    for entry in &options.entries {
        let path = out_dir.join(entry);
        if !path.is_file() {
            collector.push(Check::EntryDocument, &path, None, "entry document not found");
            continue;
        }
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                collector.push(Check::EntryDocument, &path, None, format!("could not read entry document: {e}"));
                continue;
            }
        };
        let content = String::from_utf8_lossy(&bytes);
        collector.report.entries_checked += 1;
        check_entry(&path, &html::extract(&content), &references, &mut collector);
    }

    debug!(
        documents = collector.report.documents_scanned,
        entries = collector.report.entries_checked,
        violations = collector.report.violations.len(),
        "verification finished"
    );
    Ok(collector.report)
}

/// `*.html` and `*.htm` files, extension matched case-insensitively
fn html_documents(out_dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/**/*.htm*", Pattern::escape(&out_dir.to_string_lossy()));
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    let mut files = Vec::new();
    for entry in glob_with(&pattern, options)? {
        let path = entry.with_context(|| format!("failed to scan {}", out_dir.display()))?;
        let is_html = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"));
        if is_html && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Identities stamped by earlier pipeline stages, labelled by artifact
fn read_references(
    options: &VerifyOptions,
    collector: &mut Collector<'_>,
) -> Vec<(PathBuf, BuildIdentity)> {
    let mut references = Vec::new();
    if let Some(path) = &options.env_file {
        match env_file::read_record(path, &options.keys) {
            Ok(record) => references.push((path.clone(), record.identity)),
            Err(e) => collector.push(Check::CrossArtifactConsistency, path, None, format!("{e:#}")),
        }
    }
    if let Some(path) = &options.module {
        match module::read(path) {
            Ok(identity) => references.push((path.clone(), identity)),
            Err(e) => collector.push(Check::CrossArtifactConsistency, path, None, format!("{e:#}")),
        }
    }
    references
}

fn check_entry(
    path: &Path,
    stamp: &html::HtmlStamp,
    references: &[(PathBuf, BuildIdentity)],
    collector: &mut Collector<'_>,
) {
    match stamp.build_id_meta.as_deref() {
        None => collector.push(Check::BuildIdFormat, path, None, "no build-id meta tag"),
        Some(id) if !identity::is_compact_build_id(id) => collector.push(
            Check::BuildIdFormat,
            path,
            None,
            format!("build id {id:?} does not match YYYYMMDD-HHMMSS"),
        ),
        Some(_) => {}
    }

    match stamp.commit_sha_meta.as_deref() {
        None => collector.push(Check::CommitPresence, path, None, "no commit-sha meta tag"),
        Some(sha) if sha.trim().is_empty() => {
            collector.push(Check::CommitPresence, path, None, "commit-sha meta tag is empty");
        }
        Some(_) => {}
    }

    match &stamp.script {
        None => collector.push(
            Check::CrossArtifactConsistency,
            path,
            None,
            format!("no <script id=\"{}\"> object", html::SCRIPT_ID),
        ),
        Some(Err(e)) => collector.push(
            Check::CrossArtifactConsistency,
            path,
            None,
            format!("unreadable build-info script: {e}"),
        ),
        Some(Ok(script)) => {
            let inline = (script.build_id.as_deref(), script.commit_sha.as_deref());
            compare(collector, path, stamp, inline, "inline script");
        }
    }

    for (source, recorded) in references {
        let stamped = (Some(recorded.build_id()), Some(recorded.commit_sha()));
        compare(collector, path, stamp, stamped, &source.display().to_string());
    }
}

/// Report where `other` disagrees with the meta tags.
/// A missing meta value is already reported by its own check.
fn compare(
    collector: &mut Collector<'_>,
    path: &Path,
    stamp: &html::HtmlStamp,
    (build_id, commit_sha): (Option<&str>, Option<&str>),
    other_label: &str,
) {
    let fields = [
        ("build id", stamp.build_id_meta.as_deref(), build_id),
        ("commit sha", stamp.commit_sha_meta.as_deref(), commit_sha),
    ];
    for (field, meta, other) in fields {
        let Some(meta) = meta else {
            continue;
        };
        match other {
            Some(other) if other == meta => {}
            Some(other) => collector.push(
                Check::CrossArtifactConsistency,
                path,
                None,
                format!("{field} meta {meta:?} != {other:?} in {other_label}"),
            ),
            None => collector.push(
                Check::CrossArtifactConsistency,
                path,
                None,
                format!("{field} missing from {other_label}"),
            ),
        }
    }
}
