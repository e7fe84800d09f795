use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use buildid::stamp::ArtifactKind;

mod commands;

use commands::OutputFormat;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("BUILDID_SELF_GIT_HASH"),
    " ",
    env!("BUILDID_SELF_BUILD_DATE"),
    ")"
);

#[derive(Parser)]
#[command(name = "buildid")]
#[command(about = "Resolve, stamp and verify the build identity of a web build")]
#[command(version, long_version = LONG_VERSION)]
struct Cli {
    /// Project root holding buildid.toml; relative paths resolve against it
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Never query git; the commit comes from the environment or is "unknown"
    #[arg(long, global = true)]
    no_vcs: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and print the build identity without writing anything
    Resolve {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Write the build identity into artifacts
    Stamp {
        /// Artifact kind to write; repeatable. Defaults to env and module,
        /// plus html when documents are configured
        #[arg(long = "kind", value_enum)]
        kinds: Vec<ArtifactKind>,

        /// HTML document to stamp, in addition to configured ones
        #[arg(long)]
        html: Vec<PathBuf>,

        /// Take the identity from the env file written by an earlier stamp
        #[arg(long)]
        reuse: bool,
    },
    /// Check a finished build output directory
    Verify {
        /// Build output directory
        out_dir: PathBuf,

        /// Entry document relative to the output directory; repeatable
        #[arg(long = "entry")]
        entries: Vec<String>,

        /// Env file that must agree with the HTML stamp
        #[arg(long)]
        env_file: Option<PathBuf>,

        /// Generated module that must agree with the HTML stamp
        #[arg(long)]
        module: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the stamped identity the way the version page reads it
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    buildid::logging::init(cli.verbose);

    let ctx = commands::Context::load(cli.root, cli.no_vcs)?;

    match cli.command {
        Commands::Resolve { format } => commands::resolve::run(&ctx, format),
        Commands::Stamp { kinds, html, reuse } => commands::stamp::run(&ctx, &kinds, &html, reuse),
        Commands::Verify {
            out_dir,
            entries,
            env_file,
            module,
            format,
        } => commands::verify::run(
            &ctx,
            &out_dir,
            entries,
            env_file.as_deref(),
            module.as_deref(),
            format,
        ),
        Commands::Show => commands::show::run(&ctx),
    }
}
