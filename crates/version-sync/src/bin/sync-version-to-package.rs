use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use version_sync::{sync_from_native, NativeLayout};

/// Generate src/version.ts from the Android versionName (source of truth),
/// warning if the iOS MARKETING_VERSION differs.
/// Does not touch package.json or lockfiles.
#[derive(Parser, Debug)]
#[command(author, version, long_about = None)]
struct Cli {
    /// Formulus app root (contains android/, ios/ and src/)
    #[arg(long, default_value = ".")]
    project_root: PathBuf,
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
            error!("sync-version-to-package failed: {err}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let layout = NativeLayout::under(&cli.project_root);
    let report = sync_from_native(&layout)?;
    info!("Generated src/version.ts with APP_VERSION={}", report.version);
    Ok(())
}
