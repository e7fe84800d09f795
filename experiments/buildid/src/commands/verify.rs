use anyhow::Result;
use std::path::Path;
use tracing::info;

use buildid::verify::{self, VerifyOptions};

use super::{Context, OutputFormat};

pub fn run(
    ctx: &Context,
    out_dir: &Path,
    entries: Vec<String>,
    env_file: Option<&Path>,
    module: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let options = VerifyOptions {
        entries: if entries.is_empty() {
            ctx.config.verify.entries.clone()
        } else {
            entries
        },
        env_file: env_file.map(|p| ctx.path(p)),
        module: module.map(|p| ctx.path(p)),
        keys: ctx.config.keys.clone(),
    };

    let out_dir = ctx.path(out_dir);
    let report = verify::verify(&out_dir, &options)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            for violation in &report.violations {
                println!("error{violation}");
            }
            println!(
                "Checked {} document(s), {} entry document(s): {} violation(s)",
                report.documents_scanned,
                report.entries_checked,
                report.violations.len()
            );
        }
    }

    if !report.is_clean() {
        anyhow::bail!(
            "verification failed for {} with {} violation(s)",
            out_dir.display(),
            report.violations.len()
        );
    }

    info!(path = %out_dir.display(), "verification passed");
    Ok(())
}
