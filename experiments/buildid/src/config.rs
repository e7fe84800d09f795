use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "buildid.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub env: EnvAliases,
    pub keys: EnvKeys,
    pub artifacts: ArtifactPaths,
    pub verify: VerifySettings,
}

/// Environment variables consulted by the resolver, in precedence order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvAliases {
    pub build_id_override: Vec<String>,
    pub commit_sha: Vec<String>,
    pub branch: Vec<String>,
}

impl Default for EnvAliases {
    fn default() -> Self {
        Self {
            build_id_override: names(&["BUILD_ID_OVERRIDE", "BUILD_ID"]),
            commit_sha: names(&[
                "COMMIT_SHA",
                "GIT_COMMIT_SHA",
                "GIT_COMMIT",
                "GITHUB_SHA",
                "VERCEL_GIT_COMMIT_SHA",
                "CF_PAGES_COMMIT_SHA",
                "RENDER_GIT_COMMIT",
                "CI_COMMIT_SHA",
                "SOURCE_VERSION",
            ]),
            branch: names(&[
                "BRANCH",
                "GIT_BRANCH",
                "GITHUB_REF_NAME",
                "VERCEL_GIT_COMMIT_REF",
                "CF_PAGES_BRANCH",
                "RENDER_GIT_BRANCH",
                "CI_COMMIT_REF_NAME",
            ]),
        }
    }
}

/// Keys written to the env cascade file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvKeys {
    pub build_id: String,
    pub commit_sha: String,
    pub build_time: String,
    pub branch: String,
}

impl Default for EnvKeys {
    fn default() -> Self {
        Self {
            build_id: "REACT_APP_BUILD_ID".to_string(),
            commit_sha: "REACT_APP_COMMIT_SHA".to_string(),
            build_time: "REACT_APP_BUILD_TIME".to_string(),
            branch: "REACT_APP_BUILD_BRANCH".to_string(),
        }
    }
}

/// Artifact destinations, relative to the project root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    pub env_file: PathBuf,
    pub module: PathBuf,
    pub html: Vec<PathBuf>,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            env_file: PathBuf::from(".env.build"),
            module: PathBuf::from("src/buildInfo.generated.js"),
            html: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifySettings {
    /// Entry documents, relative to the output directory
    pub entries: Vec<String>,
}

impl Default for VerifySettings {
    fn default() -> Self {
        Self {
            entries: vec!["index.html".to_string()],
        }
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

/// Load `buildid.toml` from `root`, or defaults when it does not exist
pub fn load(root: &Path) -> Result<Config> {
    let config_path = root.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("failed to read config: {}", config_path.display()))?;
    parse(&content).with_context(|| format!("failed to parse config: {}", config_path.display()))
}

pub fn parse(content: &str) -> Result<Config> {
    Ok(toml::from_str(content)?)
}

/// Resolve a configured path against the project root
#[must_use]
pub fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
