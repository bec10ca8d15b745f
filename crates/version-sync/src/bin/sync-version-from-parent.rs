use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use version_sync::{sync_from_parent, ParentLayout};

/// Generate formplayer src/version.ts from the Formulus app's generated src/version.ts.
/// Does not modify package.json or lockfiles.
#[derive(Parser, Debug)]
#[command(author, version, long_about = None)]
struct Cli {
    /// Formplayer project root
    #[arg(long, default_value = ".")]
    project_root: PathBuf,
    /// Override the Formulus version module to read
    #[arg(long)]
    source: Option<PathBuf>,
    /// Override the module to generate
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("sync-version-from-parent failed: {err}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut layout = ParentLayout::under(&cli.project_root);
    if let Some(source) = cli.source {
        layout.source = source;
    }
    if let Some(output) = cli.output {
        layout.output = output;
    }
    let version = sync_from_parent(&layout)?;
    info!("Generated formplayer src/version.ts with APP_VERSION={version}");
    Ok(())
}
