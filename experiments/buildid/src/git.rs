use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;

/// Why a revision query produced no answer.
/// Callers treat every variant as "source unavailable".
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("git {command} failed: {stderr}")]
    Failed { command: String, stderr: String },

    #[error("git {command} returned no output")]
    Empty { command: String },

    #[error("version control queries are disabled")]
    Disabled,
}

/// Version control state the resolver may consult
pub trait RevisionSource {
    /// Full hash of the checked-out revision
    fn current_revision_hash(&self) -> Result<String, QueryError>;

    /// Name of the checked-out branch (`HEAD` when detached)
    fn current_branch(&self) -> Result<String, QueryError>;
}

/// Queries a working tree through the `git` binary
#[derive(Debug, Clone)]
pub struct GitCli {
    dir: PathBuf,
}

impl GitCli {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn rev_parse(&self, args: &[&str]) -> Result<String, QueryError> {
        let command = format!("rev-parse {}", args.join(" "));
        let output = Command::new("git")
            .arg("rev-parse")
            .args(args)
            .current_dir(&self.dir)
            .output()?;

        if !output.status.success() {
            return Err(QueryError::Failed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        first_line(&String::from_utf8_lossy(&output.stdout)).ok_or(QueryError::Empty { command })
    }
}

impl RevisionSource for GitCli {
    fn current_revision_hash(&self) -> Result<String, QueryError> {
        self.rev_parse(&["HEAD"])
    }

    fn current_branch(&self) -> Result<String, QueryError> {
        self.rev_parse(&["--abbrev-ref", "HEAD"])
    }
}

/// Stand-in used when the caller opts out of version control queries
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVcs;

impl RevisionSource for NoVcs {
    fn current_revision_hash(&self) -> Result<String, QueryError> {
        Err(QueryError::Disabled)
    }

    fn current_branch(&self) -> Result<String, QueryError> {
        Err(QueryError::Disabled)
    }
}

fn first_line(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(ToString::to_string)
}
