//! CLI argument definitions using clap derive macros.
//!
//! Every tuning flag is optional so that unset flags fall through to the
//! config file and then to built-in defaults.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Extract audio from video links and serve it as resumable MP3 downloads.
///
/// Runs an HTTP service exposing `POST /api/video-info` and
/// `POST /api/download`, driving a yt-dlp compatible extractor.
#[derive(Parser, Debug)]
#[command(name = "audio-fetch")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Address to listen on (default 0.0.0.0:3000)
    #[arg(short = 'b', long)]
    pub bind: Option<SocketAddr>,

    /// Port to listen on; overrides the port of --bind
    #[arg(short = 'p', long, env = "PORT")]
    pub port: Option<u16>,

    /// Directory where audio artifacts are written
    #[arg(short = 'd', long)]
    pub downloads_dir: Option<PathBuf>,

    /// Directory for short-lived cookie files
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,

    /// Extraction tool binary (default: yt-dlp on PATH)
    #[arg(short = 'x', long, env = "AUDIO_FETCH_EXTRACTOR")]
    pub extractor: Option<PathBuf>,

    /// Personas tried per request before giving up (1-10)
    #[arg(short = 'a', long, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_attempts: Option<u32>,

    /// Time limit for one extractor run in seconds (1-3600)
    #[arg(short = 't', long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub attempt_timeout: Option<u64>,

    /// Delay before a streamed artifact is deleted, in milliseconds (0-60000)
    #[arg(long, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub cleanup_grace_ms: Option<u64>,

    /// Maximum lifetime of a streamed artifact in seconds (1-86400)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=86400))]
    pub artifact_max_lifetime: Option<u64>,

    /// Config file path (default: $XDG_CONFIG_HOME/audio-fetch/config.toml)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,
}
