use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::config::EnvAliases;
use crate::env::EnvSnapshot;
use crate::git::RevisionSource;
use crate::identity::{self, BuildIdentity, UNKNOWN_COMMIT};
use crate::placeholder;

/// Where the build id came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BuildIdSource {
    Override { var: String },
    Timestamp,
}

/// Where the commit sha came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CommitSource {
    Env { var: String },
    Vcs,
    Fallback,
}

impl fmt::Display for BuildIdSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Override { var } => write!(f, "override {var}"),
            Self::Timestamp => f.write_str("timestamp"),
        }
    }
}

impl fmt::Display for CommitSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Env { var } => write!(f, "env {var}"),
            Self::Vcs => f.write_str("git"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

/// The resolver's answer for one build invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    #[serde(flatten)]
    pub identity: BuildIdentity,
    pub built_at: DateTime<Utc>,
    pub branch: Option<String>,
    pub build_id_source: BuildIdSource,
    pub commit_source: CommitSource,
}

/// Resolve the build identity. Never fails: every tier that cannot answer
/// falls through to the next, ending in a timestamp and [`UNKNOWN_COMMIT`].
pub fn resolve(
    env: &EnvSnapshot,
    vcs: &dyn RevisionSource,
    aliases: &EnvAliases,
    now: DateTime<Utc>,
) -> Resolution {
    let (build_id, build_id_source) = match env.first_usable(&aliases.build_id_override) {
        Some((var, value)) => (value.to_string(), BuildIdSource::Override { var: var.to_string() }),
        None => (identity::timestamp_build_id(now), BuildIdSource::Timestamp),
    };

    let (commit_sha, commit_source) = resolve_commit(env, vcs, aliases);
    let branch = resolve_branch(env, vcs, aliases);

    Resolution {
        identity: BuildIdentity::new(build_id, commit_sha),
        built_at: now,
        branch,
        build_id_source,
        commit_source,
    }
}

fn resolve_commit(
    env: &EnvSnapshot,
    vcs: &dyn RevisionSource,
    aliases: &EnvAliases,
) -> (String, CommitSource) {
    if let Some((var, value)) = env.first_usable(&aliases.commit_sha) {
        return (value.to_string(), CommitSource::Env { var: var.to_string() });
    }

    match vcs.current_revision_hash() {
        Ok(hash) if usable(&hash) => (hash.trim().to_string(), CommitSource::Vcs),
        Ok(hash) => {
            debug!(value = %hash, "ignoring unusable revision hash");
            (UNKNOWN_COMMIT.to_string(), CommitSource::Fallback)
        }
        Err(e) => {
            debug!(error = %e, "revision query unavailable");
            (UNKNOWN_COMMIT.to_string(), CommitSource::Fallback)
        }
    }
}

fn resolve_branch(env: &EnvSnapshot, vcs: &dyn RevisionSource, aliases: &EnvAliases) -> Option<String> {
    if let Some((_, value)) = env.first_usable(&aliases.branch) {
        return Some(value.to_string());
    }

    match vcs.current_branch() {
        // Detached checkouts report `HEAD`
        Ok(branch) if usable(&branch) && branch.trim() != "HEAD" => Some(branch.trim().to_string()),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "branch query unavailable");
            None
        }
    }
}

fn usable(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !placeholder::is_placeholder(value)
}
