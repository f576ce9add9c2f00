//! Size-driven transcoding
//!
//! When a download exceeds the delivery ceiling it is re-encoded at a bitrate
//! computed from the ceiling and the duration. A second, more aggressive pass
//! runs if the first result is still too big; there is never a third.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::core::process::run_with_timeout;
use crate::download::DownloadError;

/// Share of the ceiling the first pass aims for, leaving room for container overhead
pub const CEILING_SAFETY_FACTOR: f64 = 0.9;

/// Bitrate multiplier applied before the second pass
pub const SECOND_PASS_FACTOR: f64 = 0.7;

/// Lowest total bitrate the first pass will use (bits per second)
pub const FIRST_PASS_MIN_BPS: u64 = 200_000;

/// Lowest total bitrate the second pass will use (bits per second)
pub const SECOND_PASS_MIN_BPS: u64 = 100_000;

/// Audio bitrate reserved inside the total target (bits per second)
pub const AUDIO_BPS: u64 = 64_000;

/// Smallest video bitrate ever handed to the encoder (bits per second)
const MIN_VIDEO_BPS: u64 = 50_000;

/// One external compression step.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Re-encodes `input` into `output` aiming at `total_bitrate_bps` (audio included).
    async fn transcode(&self, input: &Path, output: &Path, total_bitrate_bps: u64) -> Result<(), DownloadError>;
}

/// ffmpeg-backed transcoder (H.264 + AAC in mp4).
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg_bin: String,
    timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, input: &Path, output: &Path, total_bitrate_bps: u64) -> Result<(), DownloadError> {
        let video_bps = total_bitrate_bps.saturating_sub(AUDIO_BPS).max(MIN_VIDEO_BPS);
        let video_rate = format!("{}", video_bps);
        let buffer = format!("{}", video_bps * 2);

        let mut cmd = Command::new(&self.ffmpeg_bin);
        cmd.args(["-hide_banner", "-loglevel", "error", "-y", "-i"])
            .arg(input)
            .args([
                "-c:v",
                "libx264",
                "-preset",
                "veryfast",
                "-b:v",
                &video_rate,
                "-maxrate",
                &video_rate,
                "-bufsize",
                &buffer,
                "-c:a",
                "aac",
                "-b:a",
                "64k",
                "-movflags",
                "+faststart",
            ])
            .arg(output);

        let result = run_with_timeout(&mut cmd, self.timeout).await?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            log::error!("FFmpeg compression error: {}", stderr.trim());
            return Err(DownloadError::CompressionFailed(format!("ffmpeg exited with {}", result.status)));
        }
        Ok(())
    }
}

/// First-pass target: `(ceiling * 0.9 * 8) / duration`, floored at [`FIRST_PASS_MIN_BPS`].
pub fn first_pass_bitrate(ceiling_bytes: u64, duration_secs: u32) -> u64 {
    let bps = (ceiling_bytes as f64 * CEILING_SAFETY_FACTOR * 8.0) / f64::from(duration_secs.max(1));
    (bps as u64).max(FIRST_PASS_MIN_BPS)
}

/// Second-pass target: 70% of the first, floored at [`SECOND_PASS_MIN_BPS`].
pub fn second_pass_bitrate(first_pass_bps: u64) -> u64 {
    ((first_pass_bps as f64 * SECOND_PASS_FACTOR) as u64).max(SECOND_PASS_MIN_BPS)
}

/// Result of a successful shrink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShrinkOutcome {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Number of transcode passes that ran (1 or 2)
    pub passes: u8,
}

/// Shrinks `input` below `ceiling_bytes` in at most two passes.
///
/// Outputs are written next to `input`. Whatever happens, only the returned
/// file survives: the original and any rejected pass output are removed before
/// returning, and on failure nothing is left at all.
pub async fn shrink_to_ceiling(
    transcoder: &dyn Transcoder,
    input: &Path,
    duration_secs: u32,
    ceiling_bytes: u64,
) -> Result<ShrinkOutcome, DownloadError> {
    let first_output = pass_output_path(input, 1);
    let second_output = pass_output_path(input, 2);

    let result = run_passes(transcoder, input, &first_output, &second_output, duration_secs, ceiling_bytes).await;

    remove_quietly(input).await;
    match &result {
        Ok(outcome) if outcome.passes == 1 => remove_quietly(&second_output).await,
        Ok(_) => remove_quietly(&first_output).await,
        Err(_) => {
            remove_quietly(&first_output).await;
            remove_quietly(&second_output).await;
        }
    }
    result
}

async fn run_passes(
    transcoder: &dyn Transcoder,
    input: &Path,
    first_output: &Path,
    second_output: &Path,
    duration_secs: u32,
    ceiling_bytes: u64,
) -> Result<ShrinkOutcome, DownloadError> {
    if duration_secs == 0 {
        return Err(DownloadError::CompressionFailed(
            "duration unknown, cannot compute target bitrate".to_string(),
        ));
    }

    let first_bps = first_pass_bitrate(ceiling_bytes, duration_secs);
    log::info!(
        "Transcode pass 1: {} -> target {} kbps ({}s, ceiling {} bytes)",
        input.display(),
        first_bps / 1000,
        duration_secs,
        ceiling_bytes
    );
    transcoder.transcode(input, first_output, first_bps).await?;
    let first_size = tokio::fs::metadata(first_output).await?.len();
    if first_size <= ceiling_bytes {
        return Ok(ShrinkOutcome {
            path: first_output.to_path_buf(),
            size_bytes: first_size,
            passes: 1,
        });
    }

    let second_bps = second_pass_bitrate(first_bps);
    log::warn!(
        "Pass 1 output still {} bytes (> {}), pass 2 at {} kbps",
        first_size,
        ceiling_bytes,
        second_bps / 1000
    );
    remove_quietly(first_output).await;
    transcoder.transcode(input, second_output, second_bps).await?;
    let second_size = tokio::fs::metadata(second_output).await?.len();
    if second_size <= ceiling_bytes {
        return Ok(ShrinkOutcome {
            path: second_output.to_path_buf(),
            size_bytes: second_size,
            passes: 2,
        });
    }

    Err(DownloadError::CompressionFailed(format!(
        "still {} bytes after two passes (ceiling {})",
        second_size, ceiling_bytes
    )))
}

fn pass_output_path(input: &Path, pass: u8) -> PathBuf {
    let stem = input.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    input.with_file_name(format!("{}.pass{}.mp4", stem, pass))
}

/// Removes a file, ignoring "not found" and logging anything else.
pub async fn remove_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => log::debug!("Removed transient file {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to remove transient file {}: {}", path.display(), e),
    }
}
