use anyhow::Result;
use tracing::warn;

use buildid::env::EnvSnapshot;
use buildid::stamp::{env_file, module};
use buildid::BuildIdentity;

use super::Context;

pub fn run(ctx: &Context) -> Result<()> {
    let identity = locate(ctx)?;
    println!("Build:  {}", identity.build_id());
    println!("Commit: {}", identity.commit_sha());
    Ok(())
}

/// Generated module first, then the env file, then the process environment
fn locate(ctx: &Context) -> Result<BuildIdentity> {
    let keys = &ctx.config.keys;

    let module_path = ctx.path(&ctx.config.artifacts.module);
    if module_path.exists() {
        match module::read(&module_path) {
            Ok(identity) => return Ok(identity),
            Err(e) => warn!("ignoring unreadable generated module: {e:#}"),
        }
    }

    let env_path = ctx.path(&ctx.config.artifacts.env_file);
    if env_path.exists() {
        match env_file::read_record(&env_path, keys) {
            Ok(record) => return Ok(record.identity),
            Err(e) => warn!("ignoring unreadable env file: {e:#}"),
        }
    }

    let env = EnvSnapshot::capture();
    match (env.usable(&keys.build_id), env.usable(&keys.commit_sha)) {
        (Some(build_id), Some(commit_sha)) => Ok(BuildIdentity::new(build_id, commit_sha)),
        _ => anyhow::bail!("no stamped build identity found\nRun 'buildid stamp' first"),
    }
}
