//! Serializes one build identity into the artifacts a front-end build reads.
//!
//! Every renderer is a pure function of its input, and [`stamp`] always
//! replaces the destination in full, so re-stamping with the same record
//! leaves files byte-identical.

pub mod env_file;
pub mod html;
pub mod module;

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::EnvKeys;
use crate::identity::BuildIdentity;
use crate::resolve::Resolution;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// KEY=VALUE env cascade file
    Env,
    /// Generated source module exporting the two constants
    Module,
    /// Meta tags and inline script in an existing HTML document
    Html,
}

impl ArtifactKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Env => "env",
            Self::Module => "module",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What gets stamped: the identity plus the branch, when one is known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampRecord {
    pub identity: BuildIdentity,
    pub branch: Option<String>,
}

impl From<&Resolution> for StampRecord {
    fn from(resolution: &Resolution) -> Self {
        Self {
            identity: resolution.identity.clone(),
            branch: resolution.branch.clone(),
        }
    }
}

impl From<BuildIdentity> for StampRecord {
    fn from(identity: BuildIdentity) -> Self {
        Self { identity, branch: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampOutcome {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    /// False when the file already held exactly these bytes
    pub changed: bool,
}

/// Render `record` as `kind` and write it to `dest`.
///
/// Env files and modules get their parent directories created; an HTML
/// destination must already exist since it is modified in place.
pub fn stamp(
    record: &StampRecord,
    kind: ArtifactKind,
    dest: &Path,
    keys: &EnvKeys,
) -> Result<StampOutcome> {
    let (previous, contents) = match kind {
        ArtifactKind::Env => (fs::read_to_string(dest).ok(), env_file::render(record, keys)),
        ArtifactKind::Module => (fs::read_to_string(dest).ok(), module::render(&record.identity)?),
        ArtifactKind::Html => {
            let document = fs::read_to_string(dest)
                .with_context(|| format!("failed to read HTML document: {}", dest.display()))?;
            let contents = html::inject(&document, &record.identity)
                .with_context(|| format!("failed to stamp HTML document: {}", dest.display()))?;
            (Some(document), contents)
        }
    };

    if kind != ArtifactKind::Html {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }
    }

    fs::write(dest, &contents)
        .with_context(|| format!("failed to write {kind} artifact: {}", dest.display()))?;

    let changed = previous.as_deref() != Some(contents.as_str());
    info!(
        kind = kind.as_str(),
        path = %dest.display(),
        build_id = record.identity.build_id(),
        commit_sha = record.identity.commit_sha(),
        changed,
        "stamped artifact"
    );

    Ok(StampOutcome {
        kind,
        path: dest.to_path_buf(),
        changed,
    })
}
