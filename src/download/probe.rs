//! ffprobe helpers for files already on disk.
//!
//! yt-dlp usually reports duration and dimensions, but not always (merged
//! renditions, some live recordings). These fill the gaps so the transcoder
//! gets a duration and Telegram gets a correct aspect ratio.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;

use crate::core::process::run_with_timeout;

/// Duration and first-video-stream dimensions of a media file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbedMedia {
    pub duration_secs: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

/// Probes duration, width and height of a video file.
///
/// Returns `None` when ffprobe cannot be run or its output is unusable; callers
/// treat that as "unknown".
pub async fn probe_video_metadata(ffprobe_bin: &str, timeout: Duration, path: &Path) -> Option<ProbedMedia> {
    let mut cmd = Command::new(ffprobe_bin);
    cmd.args([
        "-v",
        "error",
        "-select_streams",
        "v:0",
        "-show_entries",
        "format=duration:stream=width,height",
        "-of",
        "json",
    ])
    .arg(path);

    let output = match run_with_timeout(&mut cmd, timeout).await {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            log::warn!(
                "ffprobe failed for {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return None;
        }
        Err(e) => {
            log::warn!("ffprobe could not run for {}: {}", path.display(), e);
            return None;
        }
    };

    parse_ffprobe_json(&output.stdout)
}

fn parse_ffprobe_json(stdout: &[u8]) -> Option<ProbedMedia> {
    let parsed: FfprobeOutput = serde_json::from_slice(stdout).ok()?;
    let duration_secs = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .map(|d| d.round() as u32);
    let stream = parsed.streams.into_iter().next();

    Some(ProbedMedia {
        duration_secs,
        width: stream.as_ref().and_then(|s| s.width),
        height: stream.and_then(|s| s.height),
    })
}
