//! Word-document conversion through an external tool.
//!
//! The converter is a collaborator behind the [`DocumentConverter`] trait so
//! ingest can be tested without the real tool installed. [`PandocConverter`]
//! is the production implementation: it stages the bytes in a temp file and
//! runs the converter as a subprocess under a timeout.

use std::future::Future;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, instrument, warn};

use mirreview_shared::{ConverterOptions, Result, ReviewError, TrackChanges};

/// Turns word-processor bytes into markdown.
///
/// Implementations must report a missing tool as
/// [`ReviewError::ConverterUnavailable`] and a rejected input as
/// [`ReviewError::ConversionFailed`].
pub trait DocumentConverter: Send + Sync {
    fn convert(
        &self,
        bytes: &[u8],
        mode: TrackChanges,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Runs `pandoc --track-changes=<mode> <file> -t markdown`.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    command: String,
    timeout: Duration,
}

impl PandocConverter {
    pub fn new(opts: &ConverterOptions) -> Self {
        Self {
            command: opts.command.clone(),
            timeout: opts.timeout,
        }
    }

    /// Name of the executable this converter invokes.
    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Default for PandocConverter {
    fn default() -> Self {
        Self::new(&ConverterOptions::default())
    }
}

impl DocumentConverter for PandocConverter {
    #[instrument(skip_all, fields(command = %self.command, bytes = bytes.len(), mode = mode.as_str()))]
    async fn convert(&self, bytes: &[u8], mode: TrackChanges) -> Result<String> {
        // Held until the subprocess exits; the file is removed on drop.
        let staged = tempfile::Builder::new()
            .prefix("mirreview-")
            .suffix(".docx")
            .tempfile()
            .map_err(|e| ReviewError::io(std::env::temp_dir(), e))?;
        tokio::fs::write(staged.path(), bytes)
            .await
            .map_err(|e| ReviewError::io(staged.path(), e))?;

        let mut cmd = Command::new(&self.command);
        cmd.arg(format!("--track-changes={}", mode.as_str()))
            .arg(staged.path())
            .arg("-t")
            .arg("markdown")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(path = %staged.path().display(), "spawning converter");

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "converter timed out");
                return Err(ReviewError::conversion(format!(
                    "{} timed out after {}s",
                    self.command,
                    self.timeout.as_secs()
                )));
            }
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                return Err(ReviewError::ConverterUnavailable {
                    tool: self.command.clone(),
                });
            }
            Ok(Err(e)) => {
                return Err(ReviewError::conversion(format!(
                    "failed to start {}: {e}",
                    self.command
                )));
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let diagnostic = if stderr.is_empty() {
                format!("{} exited with {}", self.command, output.status)
            } else {
                stderr
            };
            return Err(ReviewError::conversion(diagnostic));
        }

        String::from_utf8(output.stdout).map_err(|e| {
            ReviewError::conversion(format!("{} produced non-UTF-8 output: {e}", self.command))
        })
    }
}
