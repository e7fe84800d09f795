pub mod resolve;
pub mod show;
pub mod stamp;
pub mod verify;

use anyhow::Result;
use chrono::Utc;
use clap::ValueEnum;
use std::path::{Path, PathBuf};
use tracing::info;

use buildid::config::{self, Config};
use buildid::env::EnvSnapshot;
use buildid::git::{GitCli, NoVcs, RevisionSource};
use buildid::Resolution;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// State shared by every subcommand
pub struct Context {
    pub root: PathBuf,
    pub config: Config,
    no_vcs: bool,
}

impl Context {
    pub fn load(root: PathBuf, no_vcs: bool) -> Result<Self> {
        let config = config::load(&root)?;
        Ok(Self { root, config, no_vcs })
    }

    pub fn path(&self, path: &Path) -> PathBuf {
        config::resolve_path(&self.root, path)
    }

    fn vcs(&self) -> Box<dyn RevisionSource> {
        if self.no_vcs {
            Box::new(NoVcs)
        } else {
            Box::new(GitCli::new(&self.root))
        }
    }

    /// Resolve against the live environment and log the result
    pub fn resolve(&self) -> Resolution {
        let env = EnvSnapshot::capture();
        let vcs = self.vcs();
        let resolution = buildid::resolve(&env, vcs.as_ref(), &self.config.env, Utc::now());
        info!(
            build_id = resolution.identity.build_id(),
            commit_sha = resolution.identity.commit_sha(),
            build_id_source = %resolution.build_id_source,
            commit_source = %resolution.commit_source,
            branch = resolution.branch.as_deref().unwrap_or("-"),
            "resolved build identity"
        );
        resolution
    }
}
