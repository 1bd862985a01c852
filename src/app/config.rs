//! Server configuration: config file parsing and layering with CLI flags.
//!
//! Priority: CLI flag > config file > built-in default.

use std::env;
use std::fs;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use audio_fetch_core::{
    DEFAULT_ARTIFACT_MAX_LIFETIME, DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_CLEANUP_GRACE,
    DEFAULT_EXTRACTOR_PROGRAM, DEFAULT_MAX_ATTEMPTS,
};

use crate::cli::Args;

/// Port used when neither flag, env nor config file sets one.
pub(crate) const DEFAULT_PORT: u16 = 3000;

const APP_DIR: &str = "audio-fetch";

/// Values read from the config file. Unset keys stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FileConfig {
    pub(crate) bind: Option<SocketAddr>,
    pub(crate) downloads_dir: Option<PathBuf>,
    pub(crate) scratch_dir: Option<PathBuf>,
    pub(crate) extractor: Option<PathBuf>,
    pub(crate) max_attempts: Option<u32>,
    pub(crate) attempt_timeout_secs: Option<u64>,
    pub(crate) cleanup_grace_ms: Option<u64>,
    pub(crate) artifact_max_lifetime_secs: Option<u64>,
}

impl FileConfig {
    /// Validates config values against the same ranges as the CLI.
    pub(crate) fn validate(&self) -> Result<()> {
        validate_range("max_attempts", self.max_attempts.map(u64::from), 1, 10)?;
        validate_range("attempt_timeout_secs", self.attempt_timeout_secs, 1, 3600)?;
        validate_range("cleanup_grace_ms", self.cleanup_grace_ms, 0, 60_000)?;
        validate_range(
            "artifact_max_lifetime_secs",
            self.artifact_max_lifetime_secs,
            1,
            86_400,
        )?;
        Ok(())
    }
}

fn validate_range(field: &str, value: Option<u64>, min: u64, max: u64) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(min..=max).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: {min}..={max}");
    }
    Ok(())
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ServerConfig {
    pub(crate) bind: SocketAddr,
    pub(crate) downloads_dir: PathBuf,
    pub(crate) scratch_dir: PathBuf,
    pub(crate) extractor: PathBuf,
    pub(crate) max_attempts: u32,
    pub(crate) attempt_timeout: Duration,
    pub(crate) cleanup_grace: Duration,
    pub(crate) artifact_max_lifetime: Duration,
}

impl ServerConfig {
    /// Layers CLI flags over the config file over defaults.
    pub(crate) fn resolve(args: &Args, file: &FileConfig) -> Self {
        let mut bind = args
            .bind
            .or(file.bind)
            .unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)));
        if let Some(port) = args.port {
            bind.set_port(port);
        }

        let downloads_dir = args
            .downloads_dir
            .clone()
            .or_else(|| file.downloads_dir.clone())
            .unwrap_or_else(|| PathBuf::from("downloads"));
        let scratch_dir = args
            .scratch_dir
            .clone()
            .or_else(|| file.scratch_dir.clone())
            .unwrap_or_else(|| env::temp_dir().join(APP_DIR));
        let extractor = args
            .extractor
            .clone()
            .or_else(|| file.extractor.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXTRACTOR_PROGRAM));

        let max_attempts = args
            .max_attempts
            .or(file.max_attempts)
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);
        let attempt_timeout = args
            .attempt_timeout
            .or(file.attempt_timeout_secs)
            .map_or(DEFAULT_ATTEMPT_TIMEOUT, Duration::from_secs);
        let cleanup_grace = args
            .cleanup_grace_ms
            .or(file.cleanup_grace_ms)
            .map_or(DEFAULT_CLEANUP_GRACE, Duration::from_millis);
        let artifact_max_lifetime = args
            .artifact_max_lifetime
            .or(file.artifact_max_lifetime_secs)
            .map_or(DEFAULT_ARTIFACT_MAX_LIFETIME, Duration::from_secs);

        Self {
            bind,
            downloads_dir,
            scratch_dir,
            extractor,
            max_attempts,
            attempt_timeout,
            cleanup_grace,
            artifact_max_lifetime,
        }
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/audio-fetch/config.toml`
/// 2. `$HOME/.config/audio-fetch/config.toml`
#[must_use]
pub(crate) fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join(APP_DIR).join("config.toml"));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file.
///
/// An explicit path must exist; the default path is optional.
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<(Option<PathBuf>, FileConfig)> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok((Some(path.to_path_buf()), config));
    }

    let Some(path) = resolve_default_config_path() else {
        return Ok((None, FileConfig::default()));
    };
    if !path.is_file() {
        return Ok((None, FileConfig::default()));
    }
    let config = load_file_config(&path)?;
    Ok((Some(path), config))
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        let line_no = line_index + 1;

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let context = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "bind" => {
                let parsed = parse_string_literal(value).with_context(context)?;
                let addr = parsed
                    .parse::<SocketAddr>()
                    .with_context(context)?;
                cfg.bind = Some(addr);
            }
            "downloads_dir" => {
                let parsed = parse_string_literal(value).with_context(context)?;
                cfg.downloads_dir = Some(PathBuf::from(parsed));
            }
            "scratch_dir" => {
                let parsed = parse_string_literal(value).with_context(context)?;
                cfg.scratch_dir = Some(PathBuf::from(parsed));
            }
            "extractor" => {
                let parsed = parse_string_literal(value).with_context(context)?;
                cfg.extractor = Some(PathBuf::from(parsed));
            }
            "max_attempts" => {
                let parsed = parse_integer_u64(value).with_context(context)?;
                let n = u32::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("max_attempts out of range for u32"))?;
                cfg.max_attempts = Some(n);
            }
            "attempt_timeout_secs" => {
                cfg.attempt_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "cleanup_grace_ms" => {
                cfg.cleanup_grace_ms = Some(parse_integer_u64(value).with_context(context)?);
            }
            "artifact_max_lifetime_secs" => {
                cfg.artifact_max_lifetime_secs =
                    Some(parse_integer_u64(value).with_context(context)?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["audio-fetch"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_config_all_fields() {
        let cfg = parse_config_str(
            r#"
# audio-fetch settings
bind = "127.0.0.1:4000"
downloads_dir = "/srv/audio"   # artifacts
scratch_dir = "/tmp/af"
extractor = "/usr/local/bin/yt-dlp"
max_attempts = 6
attempt_timeout_secs = 45
cleanup_grace_ms = 250
artifact_max_lifetime_secs = 120
"#,
        )
        .unwrap();
        assert_eq!(cfg.bind, Some("127.0.0.1:4000".parse().unwrap()));
        assert_eq!(cfg.downloads_dir, Some(PathBuf::from("/srv/audio")));
        assert_eq!(cfg.scratch_dir, Some(PathBuf::from("/tmp/af")));
        assert_eq!(cfg.extractor, Some(PathBuf::from("/usr/local/bin/yt-dlp")));
        assert_eq!(cfg.max_attempts, Some(6));
        assert_eq!(cfg.attempt_timeout_secs, Some(45));
        assert_eq!(cfg.cleanup_grace_ms, Some(250));
        assert_eq!(cfg.artifact_max_lifetime_secs, Some(120));
    }

    #[test]
    fn test_parse_config_hash_inside_string_is_kept() {
        let cfg = parse_config_str(r#"downloads_dir = "/srv/#audio""#).unwrap();
        assert_eq!(cfg.downloads_dir, Some(PathBuf::from("/srv/#audio")));
    }

    #[test]
    fn test_parse_config_rejects_out_of_range_values() {
        for (raw, key) in [
            ("max_attempts = 0", "max_attempts"),
            ("max_attempts = 11", "max_attempts"),
            ("attempt_timeout_secs = 0", "attempt_timeout_secs"),
            ("cleanup_grace_ms = 60001", "cleanup_grace_ms"),
            ("artifact_max_lifetime_secs = 86401", "artifact_max_lifetime_secs"),
        ] {
            let err = parse_config_str(raw).unwrap_err();
            assert!(err.to_string().contains(key), "{raw}: {err}");
        }
    }

    #[test]
    fn test_parse_config_rejects_bad_syntax_and_types() {
        assert!(parse_config_str("max_attempts").is_err());
        let err = parse_config_str("max_attempts = 4 trailing").unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
        let err = parse_config_str("downloads_dir = /no/quotes").unwrap_err();
        assert!(err.to_string().contains("downloads_dir"));
        let err = parse_config_str(r#"bind = "localhost""#).unwrap_err();
        assert!(err.to_string().contains("bind"));
        let err = parse_config_str("cleanup_grace_ms = -5").unwrap_err();
        assert!(err.to_string().contains("cleanup_grace_ms"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_keys() {
        let err = parse_config_str("concurrency = 4").unwrap_err();
        assert!(err.to_string().contains("Unknown configuration key"));
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn test_resolve_defaults() {
        let cfg = ServerConfig::resolve(&args(&[]), &FileConfig::default());
        assert_eq!(cfg.downloads_dir, PathBuf::from("downloads"));
        assert_eq!(cfg.extractor, PathBuf::from(DEFAULT_EXTRACTOR_PROGRAM));
        assert_eq!(cfg.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(cfg.attempt_timeout, DEFAULT_ATTEMPT_TIMEOUT);
        assert_eq!(cfg.cleanup_grace, DEFAULT_CLEANUP_GRACE);
        assert_eq!(cfg.artifact_max_lifetime, DEFAULT_ARTIFACT_MAX_LIFETIME);
        assert!(cfg.bind.ip().is_unspecified());
    }

    #[test]
    fn test_resolve_cli_wins_over_file() {
        let file = FileConfig {
            bind: Some("127.0.0.1:4000".parse().unwrap()),
            downloads_dir: Some(PathBuf::from("/from/file")),
            max_attempts: Some(2),
            cleanup_grace_ms: Some(10),
            ..FileConfig::default()
        };
        let cfg = ServerConfig::resolve(
            &args(&["--downloads-dir", "/from/cli", "--max-attempts", "7", "--port", "5000"]),
            &file,
        );
        assert_eq!(cfg.downloads_dir, PathBuf::from("/from/cli"));
        assert_eq!(cfg.max_attempts, 7);
        assert_eq!(cfg.bind, "127.0.0.1:5000".parse().unwrap());
        assert_eq!(cfg.cleanup_grace, Duration::from_millis(10));
    }

    #[test]
    fn test_load_config_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "max_attempts = 3\n").unwrap();

        let (loaded_from, cfg) = load_config(Some(&path)).unwrap();
        assert_eq!(loaded_from, Some(path));
        assert_eq!(cfg.max_attempts, Some(3));
    }

    #[test]
    fn test_load_config_explicit_missing_path_errors() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_config(Some(&temp_dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
