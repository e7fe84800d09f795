use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing::info;

use buildid::stamp::{self, env_file, ArtifactKind, StampRecord};

use super::Context;

pub fn run(ctx: &Context, kinds: &[ArtifactKind], extra_html: &[PathBuf], reuse: bool) -> Result<()> {
    let cfg = &ctx.config;
    let env_path = ctx.path(&cfg.artifacts.env_file);
    let module_path = ctx.path(&cfg.artifacts.module);

    let mut html_docs: Vec<PathBuf> = Vec::new();
    for doc in cfg.artifacts.html.iter().chain(extra_html) {
        let doc = ctx.path(doc);
        if !html_docs.contains(&doc) {
            html_docs.push(doc);
        }
    }

    let kinds = selected_kinds(kinds, !html_docs.is_empty());
    if kinds.contains(&ArtifactKind::Html) && html_docs.is_empty() {
        anyhow::bail!("no HTML documents to stamp\nPass --html or set artifacts.html in buildid.toml");
    }

    let record = if reuse {
        let record = env_file::read_record(&env_path, &cfg.keys)
            .context("cannot reuse the identity from an earlier stamp")?;
        info!(
            build_id = record.identity.build_id(),
            commit_sha = record.identity.commit_sha(),
            path = %env_path.display(),
            "reusing stamped build identity"
        );
        record
    } else {
        StampRecord::from(&ctx.resolve())
    };

    let mut targets: Vec<(ArtifactKind, PathBuf)> = Vec::new();
    for kind in kinds {
        match kind {
            ArtifactKind::Env => targets.push((kind, env_path.clone())),
            ArtifactKind::Module => targets.push((kind, module_path.clone())),
            ArtifactKind::Html => targets.extend(html_docs.iter().map(|doc| (kind, doc.clone()))),
        }
    }

    for (kind, path) in targets {
        let outcome = stamp::stamp(&record, kind, &path, &cfg.keys)?;
        let note = if outcome.changed { "" } else { " (unchanged)" };
        println!("Stamped {kind}: {}{note}", outcome.path.display());
    }

    println!("  Build ID: {}", record.identity.build_id());
    println!("  Commit:   {}", record.identity.commit_sha());

    Ok(())
}

/// Requested kinds without duplicates, or the default set when none are given
fn selected_kinds(requested: &[ArtifactKind], has_html: bool) -> Vec<ArtifactKind> {
    if requested.is_empty() {
        let mut kinds = vec![ArtifactKind::Env, ArtifactKind::Module];
        if has_html {
            kinds.push(ArtifactKind::Html);
        }
        return kinds;
    }

    let mut kinds = Vec::new();
    for kind in requested {
        if !kinds.contains(kind) {
            kinds.push(*kind);
        }
    }
    kinds
}
