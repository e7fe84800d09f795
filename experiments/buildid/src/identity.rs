use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Commit value used when no source could name the revision
pub const UNKNOWN_COMMIT: &str = "unknown";

/// Canonical build id layout: `YYYYMMDD-HHMMSS`, UTC
pub const COMPACT_FORMAT: &str = "%Y%m%d-%H%M%S";

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// The `(build id, commit sha)` pair stamped into every artifact of one build
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildIdentity {
    build_id: String,
    commit_sha: String,
}

impl BuildIdentity {
    /// A blank commit becomes [`UNKNOWN_COMMIT`]; the commit is never empty.
    pub fn new(build_id: impl Into<String>, commit_sha: impl Into<String>) -> Self {
        let commit_sha = commit_sha.into();
        let commit_sha = if commit_sha.trim().is_empty() {
            UNKNOWN_COMMIT.to_string()
        } else {
            commit_sha
        };
        Self {
            build_id: build_id.into(),
            commit_sha,
        }
    }

    #[must_use]
    pub fn build_id(&self) -> &str {
        &self.build_id
    }

    #[must_use]
    pub fn commit_sha(&self) -> &str {
        &self.commit_sha
    }

    #[must_use]
    pub fn is_commit_known(&self) -> bool {
        self.commit_sha != UNKNOWN_COMMIT
    }

    /// ISO-8601 rendering of the build id, when the id is a compact timestamp
    #[must_use]
    pub fn build_time_iso(&self) -> Option<String> {
        NaiveDateTime::parse_from_str(&self.build_id, COMPACT_FORMAT)
            .ok()
            .map(|t| t.and_utc().format(ISO_FORMAT).to_string())
    }
}

impl fmt::Display for BuildIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.build_id, self.commit_sha)
    }
}

/// Build id for a build started at `now`
#[must_use]
pub fn timestamp_build_id(now: DateTime<Utc>) -> String {
    now.format(COMPACT_FORMAT).to_string()
}

/// Whether `value` has the fixed-width `YYYYMMDD-HHMMSS` shape
#[must_use]
pub fn is_compact_build_id(value: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\d{8}-\d{6}$").expect("build id pattern is a valid regex"))
        .is_match(value)
}
