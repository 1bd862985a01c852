//! Integration tests for the yt-dlp client against a shell-script stand-in.
//!
//! The stand-in records its arguments, answers metadata requests with JSON
//! and writes a fake MP3 where the output template points.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use audio_fetch_core::extract::{ExtractionClient, ExtractionError, YtDlpClient};
use audio_fetch_core::persona::PersonaGenerator;
use audio_fetch_core::{LocalFileStore, validate_video_url};
use tempfile::TempDir;

const FAKE_TOOL: &str = r#"#!/bin/sh
LOG="__LOG__"
printf '%s\n' "$@" >> "$LOG"
echo '----' >> "$LOG"
mode=""
out=""
cookies=""
prev=""
for arg in "$@"; do
  case "$prev" in
    --output) out="$arg" ;;
    --cookies) cookies="$arg" ;;
  esac
  case "$arg" in
    --dump-single-json) mode=meta ;;
    --extract-audio) mode=audio ;;
  esac
  prev="$arg"
done
if [ -n "$cookies" ]; then
  head -n 1 "$cookies" >> "$LOG"
fi
case "$mode" in
  meta)
    printf '{"title":"Fake Song \\u2728","duration":42.4,"thumbnail":"https://img/t.jpg","uploader":"Fake Artist"}'
    ;;
  audio)
    target=$(printf '%s' "$out" | sed 's/%(ext)s$/mp3/')
    printf 'ID3fakeaudio' > "$target"
    ;;
  *)
    exit 2
    ;;
esac
"#;

const FAILING_TOOL: &str = r#"#!/bin/sh
echo "ERROR: [youtube] abc: Sign in to confirm you're not a bot" >&2
exit 1
"#;

const SLOW_TOOL: &str = r#"#!/bin/sh
sleep 30
"#;

const GARBAGE_TOOL: &str = r#"#!/bin/sh
echo "this is not json"
"#;

struct Fixture {
    temp_dir: TempDir,
    tool: PathBuf,
    log: PathBuf,
}

impl Fixture {
    fn new(script: &str) -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let log = temp_dir.path().join("calls.log");
        let tool = temp_dir.path().join("fake-yt-dlp");
        fs::write(&tool, script.replace("__LOG__", &log.to_string_lossy())).expect("write tool");
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).expect("chmod tool");
        fs::create_dir_all(temp_dir.path().join("scratch")).expect("scratch dir");
        fs::create_dir_all(temp_dir.path().join("dl")).expect("downloads dir");
        Self {
            temp_dir,
            tool,
            log,
        }
    }

    fn client(&self, timeout: Duration) -> YtDlpClient {
        YtDlpClient::new(
            &self.tool,
            timeout,
            self.scratch_dir(),
            Arc::new(LocalFileStore::new()),
        )
    }

    fn scratch_dir(&self) -> PathBuf {
        self.temp_dir.path().join("scratch")
    }

    fn downloads_dir(&self) -> PathBuf {
        self.temp_dir.path().join("dl")
    }

    fn logged_args(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn is_empty_dir(dir: &Path) -> bool {
    fs::read_dir(dir).expect("read dir").next().is_none()
}

#[tokio::test]
async fn test_fetch_metadata_parses_tool_json() {
    let fixture = Fixture::new(FAKE_TOOL);
    let client = fixture.client(Duration::from_secs(10));
    let url = validate_video_url("youtu.be/abc123").expect("valid url");
    let persona = PersonaGenerator::new().next(0);

    let meta = client
        .fetch_metadata(&url, &persona)
        .await
        .expect("metadata");
    assert_eq!(meta.cleaned_title(), "Fake Song");
    assert_eq!(meta.duration_seconds(), Some(42));
    assert_eq!(meta.author(), "Fake Artist");

    let args = fixture.logged_args();
    assert!(args.contains(&"--dump-single-json".to_string()));
    assert!(args.contains(&"--no-playlist".to_string()));
    assert!(args.contains(&"--user-agent".to_string()));
    assert!(args.contains(&"Accept-Language:en-US,en;q=0.9".to_string()));
    assert!(args.contains(&"https://youtu.be/abc123".to_string()));
}

#[tokio::test]
async fn test_convert_writes_destination() {
    let fixture = Fixture::new(FAKE_TOOL);
    let client = fixture.client(Duration::from_secs(10));
    let url = validate_video_url("https://youtu.be/abc123").expect("valid url");
    let persona = PersonaGenerator::new().next(1);
    let destination = fixture.downloads_dir().join("Fake Song-0123abcd.mp3");

    client
        .convert_to_audio(&url, &persona, &destination)
        .await
        .expect("conversion");

    assert_eq!(fs::read(&destination).expect("artifact"), b"ID3fakeaudio");
    let args = fixture.logged_args();
    assert!(args.contains(&"--extract-audio".to_string()));
    assert!(args.contains(&"--cookies-from-browser".to_string()));
    assert!(args.contains(&"chrome".to_string()));
}

#[tokio::test]
async fn test_synthetic_cookie_file_exists_during_call_and_is_removed() {
    let fixture = Fixture::new(FAKE_TOOL);
    let client = fixture.client(Duration::from_secs(10));
    let url = validate_video_url("https://youtu.be/abc123").expect("valid url");
    let persona = PersonaGenerator::new().next(3);

    client
        .fetch_metadata(&url, &persona)
        .await
        .expect("metadata");

    let args = fixture.logged_args();
    assert!(args.contains(&"--cookies".to_string()));
    assert!(
        args.contains(&"# Netscape HTTP Cookie File".to_string()),
        "tool could not read cookie file: {args:?}"
    );
    assert!(is_empty_dir(&fixture.scratch_dir()), "cookie file left behind");
}

#[tokio::test]
async fn test_tool_failure_carries_stderr() {
    let fixture = Fixture::new(FAILING_TOOL);
    let client = fixture.client(Duration::from_secs(10));
    let url = validate_video_url("https://youtu.be/abc123").expect("valid url");

    let err = client
        .fetch_metadata(&url, &PersonaGenerator::new().next(3))
        .await
        .expect_err("tool fails");
    match err {
        ExtractionError::ToolFailed { stderr, .. } => assert!(stderr.contains("not a bot")),
        other => panic!("expected ToolFailed, got {other:?}"),
    }
    assert!(is_empty_dir(&fixture.scratch_dir()));
}

#[tokio::test]
async fn test_invalid_json_is_reported() {
    let fixture = Fixture::new(GARBAGE_TOOL);
    let client = fixture.client(Duration::from_secs(10));
    let url = validate_video_url("https://youtu.be/abc123").expect("valid url");

    let err = client
        .fetch_metadata(&url, &PersonaGenerator::new().next(0))
        .await
        .expect_err("garbage output");
    assert!(matches!(err, ExtractionError::InvalidOutput { .. }));
}

#[tokio::test]
async fn test_slow_tool_times_out() {
    let fixture = Fixture::new(SLOW_TOOL);
    let client = fixture.client(Duration::from_millis(300));
    let url = validate_video_url("https://youtu.be/abc123").expect("valid url");

    let started = Instant::now();
    let err = client
        .fetch_metadata(&url, &PersonaGenerator::new().next(0))
        .await
        .expect_err("timeout");
    assert!(matches!(err, ExtractionError::Timeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_missing_tool_is_spawn_error() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let client = YtDlpClient::new(
        temp_dir.path().join("does-not-exist"),
        Duration::from_secs(5),
        temp_dir.path(),
        Arc::new(LocalFileStore::new()),
    );
    let url = validate_video_url("https://youtu.be/abc123").expect("valid url");

    let err = client
        .fetch_metadata(&url, &PersonaGenerator::new().next(0))
        .await
        .expect_err("spawn failure");
    assert!(matches!(err, ExtractionError::Spawn { .. }));
}
