//! Concatenation tool backends.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::error::AssembleError;

/// Capability trait for joining ordered segment files into one output file.
///
/// The reassembler only depends on this seam, so the external binary can be
/// swapped for a native muxer (or a test double) without touching its
/// contract. A fired `cancel` token must stop the backend promptly.
#[async_trait]
pub trait Concatenator: Send + Sync {
    /// Concatenate `files`, in the given order, into `output`.
    async fn concat(
        &self,
        files: &[PathBuf],
        output: &Path,
        cancel: &CancellationToken,
    ) -> std::result::Result<(), AssembleError>;
}

/// ffmpeg concat-demuxer backend performing a lossless stream copy.
///
/// The child process is bounded by `tool_timeout` and by the pipeline's
/// cancellation token; it is killed when either fires.
#[derive(Debug)]
pub struct FfmpegConcatenator {
    tool_timeout: Duration,
}

impl FfmpegConcatenator {
    pub fn new(tool_timeout: Duration) -> Self {
        Self { tool_timeout }
    }
}

impl Default for FfmpegConcatenator {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

#[async_trait]
impl Concatenator for FfmpegConcatenator {
    async fn concat(
        &self,
        files: &[PathBuf],
        output: &Path,
        cancel: &CancellationToken,
    ) -> std::result::Result<(), AssembleError> {
        let concat_list = output.with_extension("ffc");
        let mut list_content = String::new();
        for file in files {
            list_content.push_str(&format!("file '{}'\n", file.display()));
        }
        fs::write(&concat_list, &list_content).await?;

        let result = self.run_ffmpeg(&concat_list, output, cancel).await;

        // The list file goes away on every exit path.
        let _ = fs::remove_file(&concat_list).await;

        result
    }
}

impl FfmpegConcatenator {
    async fn run_ffmpeg(
        &self,
        concat_list: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> std::result::Result<(), AssembleError> {
        let concat_list_str = concat_list.to_str().ok_or_else(|| {
            AssembleError::ToolFailure {
                status: "not run".into(),
                stderr: "invalid path encoding for concat list".into(),
            }
        })?;
        let output_str = output.to_str().ok_or_else(|| AssembleError::ToolFailure {
            status: "not run".into(),
            stderr: "invalid path encoding for output".into(),
        })?;

        let mut command = Command::new("ffmpeg");
        command
            .args([
                "-y",
                "-f",
                "concat",
                "-safe",
                "0",
                "-i",
                concat_list_str,
                "-c",
                "copy",
                output_str,
            ])
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let result = run_tool(&mut command, self.tool_timeout, cancel).await?;

        if !result.status.success() {
            return Err(AssembleError::ToolFailure {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
            });
        }

        Ok(())
    }
}

/// Run an external tool bounded by a timeout and the pipeline's cancellation
/// token. `kill_on_drop` ensures the child is killed when either fires.
async fn run_tool(
    command: &mut Command,
    timeout: Duration,
    cancel: &CancellationToken,
) -> std::result::Result<std::process::Output, AssembleError> {
    let child = command.kill_on_drop(true).spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AssembleError::ToolNotFound
        } else {
            AssembleError::Io(e)
        }
    })?;

    tokio::select! {
        _ = cancel.cancelled() => Err(AssembleError::ToolFailure {
            status: "killed".into(),
            stderr: "cancelled".into(),
        }),
        result = tokio::time::timeout(timeout, child.wait_with_output()) => match result {
            Err(_) => Err(AssembleError::ToolFailure {
                status: "killed".into(),
                stderr: format!("timed out after {}s", timeout.as_secs()),
            }),
            Ok(output) => output.map_err(AssembleError::Io),
        },
    }
}
