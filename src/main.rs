use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use noteweave::{pipeline, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    let dest = cli.dest.clone().unwrap_or_else(|| cli.source.clone());
    match pipeline::run(&cli.source, &dest) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
