use anyhow::Result;

use super::{Context, OutputFormat};

pub fn run(ctx: &Context, format: OutputFormat) -> Result<()> {
    let resolution = ctx.resolve();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resolution)?),
        OutputFormat::Text => {
            println!(
                "Build ID:   {} ({})",
                resolution.identity.build_id(),
                resolution.build_id_source
            );
            println!(
                "Commit SHA: {} ({})",
                resolution.identity.commit_sha(),
                resolution.commit_source
            );
            if let Some(branch) = &resolution.branch {
                println!("Branch:     {branch}");
            }
            println!("Built at:   {}", resolution.built_at.to_rfc3339());
        }
    }

    Ok(())
}
