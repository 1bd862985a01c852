//! [`ExtractionClient`] backed by a yt-dlp compatible command-line tool.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::{ExtractionClient, ExtractionError, VideoMetadata};
use crate::parser::ValidatedUrl;
use crate::persona::{IdentitySource, Persona, render_netscape_cookies};
use crate::store::FileStore;

/// Program looked up on `PATH` when no extractor is configured.
pub const DEFAULT_EXTRACTOR_PROGRAM: &str = "yt-dlp";

/// Default wall-clock budget for a single tool invocation.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(120);

const METADATA_ARGS: [&str; 5] = [
    "--dump-single-json",
    "--no-check-certificates",
    "--no-warnings",
    "--prefer-free-formats",
    "--no-playlist",
];

const AUDIO_ARGS: [&str; 8] = [
    "--extract-audio",
    "--audio-format",
    "mp3",
    "--audio-quality",
    "0",
    "--format",
    "bestaudio/best",
    "--no-playlist",
];

/// Drives the external extraction binary, one process per call.
pub struct YtDlpClient {
    program: PathBuf,
    attempt_timeout: Duration,
    scratch_dir: PathBuf,
    store: Arc<dyn FileStore>,
}

impl std::fmt::Debug for YtDlpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YtDlpClient")
            .field("program", &self.program)
            .field("attempt_timeout", &self.attempt_timeout)
            .field("scratch_dir", &self.scratch_dir)
            .finish_non_exhaustive()
    }
}

impl YtDlpClient {
    /// Creates a client.
    ///
    /// Synthetic cookie files are written to `scratch_dir` through `store`.
    #[must_use]
    pub fn new(
        program: impl Into<PathBuf>,
        attempt_timeout: Duration,
        scratch_dir: impl Into<PathBuf>,
        store: Arc<dyn FileStore>,
    ) -> Self {
        Self {
            program: program.into(),
            attempt_timeout,
            scratch_dir: scratch_dir.into(),
            store,
        }
    }

    /// Runs the tool with persona arguments, `operation_args` and the URL.
    ///
    /// Returns stdout on success.
    async fn run(
        &self,
        url: &ValidatedUrl,
        persona: &Persona,
        operation_args: Vec<OsString>,
    ) -> Result<Vec<u8>, ExtractionError> {
        let cookie_file = self.write_cookie_file(persona).await?;

        let mut args = persona_args(persona, cookie_file.as_ref().map(ScratchFile::path));
        args.extend(operation_args);
        args.push(OsString::from(url.as_str()));

        let result = self.invoke(&args).await;

        if let Some(file) = cookie_file {
            file.discard().await;
        }
        result
    }

    async fn write_cookie_file(
        &self,
        persona: &Persona,
    ) -> Result<Option<ScratchFile>, ExtractionError> {
        let IdentitySource::SyntheticCookieFile(cookies) = persona.identity_source() else {
            return Ok(None);
        };

        let path = self
            .scratch_dir
            .join(format!("cookies-{}.txt", Uuid::new_v4().simple()));
        let contents = render_netscape_cookies(cookies);
        self.store
            .write(&path, contents.as_bytes())
            .await
            .map_err(|e| ExtractionError::cookie_file(&path, e))?;

        debug!(path = %path.display(), count = cookies.len(), "wrote synthetic cookie file");
        Ok(Some(ScratchFile::new(path, Arc::clone(&self.store))))
    }

    async fn invoke(&self, args: &[OsString]) -> Result<Vec<u8>, ExtractionError> {
        let child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExtractionError::spawn(&self.program, e))?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(self.attempt_timeout, child.wait_with_output())
            .await
            .map_err(|_| ExtractionError::timeout(self.attempt_timeout))?
            .map_err(|e| ExtractionError::spawn(&self.program, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::tool_failed(
                output.status.to_string(),
                &stderr,
            ));
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl ExtractionClient for YtDlpClient {
    #[instrument(skip(self, persona), fields(url = %url, persona = persona.index()))]
    async fn fetch_metadata(
        &self,
        url: &ValidatedUrl,
        persona: &Persona,
    ) -> Result<VideoMetadata, ExtractionError> {
        let args = METADATA_ARGS.iter().map(OsString::from).collect();
        let stdout = self.run(url, persona, args).await?;
        VideoMetadata::from_tool_json(&stdout)
    }

    #[instrument(
        skip(self, persona, destination),
        fields(url = %url, persona = persona.index(), destination = %destination.display())
    )]
    async fn convert_to_audio(
        &self,
        url: &ValidatedUrl,
        persona: &Persona,
        destination: &Path,
    ) -> Result<(), ExtractionError> {
        let mut args: Vec<OsString> = AUDIO_ARGS.iter().map(OsString::from).collect();
        args.push(OsString::from("--output"));
        args.push(output_template(destination));
        self.run(url, persona, args).await?;
        Ok(())
    }
}

/// Builds the tool arguments carrying a persona's identity.
fn persona_args(persona: &Persona, cookie_file: Option<&Path>) -> Vec<OsString> {
    let mut args = Vec::with_capacity(persona.header_set().len() * 2 + 4);
    for (name, value) in persona.header_set() {
        args.push(OsString::from("--add-header"));
        args.push(OsString::from(format!("{name}:{value}")));
    }
    args.push(OsString::from("--user-agent"));
    args.push(OsString::from(persona.user_agent()));

    match persona.identity_source() {
        IdentitySource::None => {}
        IdentitySource::NamedBrowser(browser) => {
            args.push(OsString::from("--cookies-from-browser"));
            args.push(OsString::from(*browser));
        }
        IdentitySource::SyntheticCookieFile(_) => {
            if let Some(path) = cookie_file {
                args.push(OsString::from("--cookies"));
                args.push(path.as_os_str().to_owned());
            }
        }
    }
    args
}

/// Output template producing `destination` once the tool re-encodes to mp3.
///
/// `%` in the path is doubled so the tool does not read it as a field.
fn output_template(destination: &Path) -> OsString {
    let stem_path = destination.with_extension("");
    let escaped = stem_path.to_string_lossy().replace('%', "%%");
    OsString::from(format!("{escaped}.%(ext)s"))
}

/// Short-lived scratch file removed after use, or on drop if never discarded.
struct ScratchFile {
    path: PathBuf,
    store: Arc<dyn FileStore>,
    armed: bool,
}

impl ScratchFile {
    fn new(path: PathBuf, store: Arc<dyn FileStore>) -> Self {
        Self {
            path,
            store,
            armed: true,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn discard(mut self) {
        self.armed = false;
        if let Err(e) = self.store.remove(&self.path).await {
            warn!(path = %self.path.display(), error = %e, "failed to remove scratch file");
        }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // Reached when the request future is cancelled mid-invocation.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let path = std::mem::take(&mut self.path);
        let store = Arc::clone(&self.store);
        handle.spawn(async move {
            let _ = store.remove(&path).await;
        });
    }
}
