//! CLI entry point for the audio-fetch service.

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

mod app;
mod cli;

use app::config::{ServerConfig, load_config};
use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let (config_path, file_config) = load_config(args.config.as_deref())?;
    if let Some(path) = &config_path {
        info!(path = %path.display(), "Loaded config file");
    }

    let config = ServerConfig::resolve(&args, &file_config);
    debug!(?config, "Resolved server config");

    app::runtime::serve(config).await
}
