//! Process execution utilities with timeout support
//!
//! Provides helpers for running external processes (yt-dlp, ffmpeg, ffprobe)
//! with configurable timeouts so a hung process cannot hold a handler forever.

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

use crate::download::DownloadError;

/// Run an async Command with a timeout.
///
/// The child is killed when the timeout elapses. A spawn failure is reported as
/// `UpstreamUnavailable`, exceeding the timeout as `Timeout`.
pub async fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<Output, DownloadError> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(DownloadError::UpstreamUnavailable(format!(
            "failed to run {:?}: {}",
            cmd.as_std().get_program(),
            e
        ))),
        Err(_) => Err(DownloadError::Timeout(timeout)),
    }
}
