//! yt-dlp invocation and output parsing
//!
//! Two calls are made per user flow: a metadata probe (`-J`) when a link is
//! posted, and a download (`--dump-json --no-simulate`) when a quality is picked.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;

use crate::core::process::run_with_timeout;
use crate::download::DownloadError;

/// Top-level JSON object printed by `yt-dlp -J` / `--dump-json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YtDlpVideoInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    /// Dimensions of the selected rendition (download output only)
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub formats: Vec<YtDlpFormat>,
}

/// One entry of the `formats` array.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YtDlpFormat {
    #[serde(default)]
    pub format_id: String,
    #[serde(default)]
    pub ext: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub filesize: Option<f64>,
    #[serde(default)]
    pub filesize_approx: Option<f64>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
}

impl YtDlpFormat {
    pub fn has_video(&self) -> bool {
        codec_present(self.vcodec.as_deref())
    }

    pub fn has_audio(&self) -> bool {
        codec_present(self.acodec.as_deref())
    }

    /// Exact size when known, otherwise yt-dlp's estimate
    pub fn size_bytes(&self) -> Option<u64> {
        self.filesize
            .filter(|s| *s > 0.0)
            .or(self.filesize_approx.filter(|s| *s > 0.0))
            .map(|s| s as u64)
    }
}

fn codec_present(codec: Option<&str>) -> bool {
    matches!(codec, Some(c) if !c.is_empty() && c != "none")
}

impl YtDlpVideoInfo {
    pub fn duration_secs(&self) -> u32 {
        self.duration.map(|d| d.round().max(0.0) as u32).unwrap_or(0)
    }
}

/// Categories of yt-dlp failures, derived from stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YtDlpErrorKind {
    /// Private, removed, region-locked or nonexistent video
    VideoUnavailable,
    /// The format selector matched nothing
    FormatUnavailable,
    /// YouTube refused the request (403, sign-in wall)
    BotDetection,
    /// Timeouts, DNS, connection resets
    Network,
    Unknown,
}

/// Analyzes yt-dlp stderr and determines the error category
pub fn classify_stderr(stderr: &str) -> YtDlpErrorKind {
    let stderr_lower = stderr.to_lowercase();

    if stderr_lower.contains("requested format is not available") {
        return YtDlpErrorKind::FormatUnavailable;
    }

    if stderr_lower.contains("private video")
        || stderr_lower.contains("video unavailable")
        || stderr_lower.contains("this video is not available")
        || stderr_lower.contains("video has been removed")
        || stderr_lower.contains("this video does not exist")
        || stderr_lower.contains("incomplete youtube id")
        || stderr_lower.contains("http error 404")
    {
        return YtDlpErrorKind::VideoUnavailable;
    }

    if stderr_lower.contains("sign in to confirm")
        || stderr_lower.contains("http error 403")
        || stderr_lower.contains("http error 429")
    {
        return YtDlpErrorKind::BotDetection;
    }

    if stderr_lower.contains("timed out")
        || stderr_lower.contains("connection")
        || stderr_lower.contains("network")
        || stderr_lower.contains("temporary failure in name resolution")
        || stderr_lower.contains("failed to connect")
    {
        return YtDlpErrorKind::Network;
    }

    YtDlpErrorKind::Unknown
}

/// Canonical watch URL for a video id
pub fn video_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Builds the yt-dlp format selector for a requested height.
///
/// The exact height wins over any lower one: a muxed mp4 at that height,
/// then that height's video merged with the best audio. Lower heights are
/// a fallback for renditions that disappeared since listing.
/// `None` selects the smallest rendition that carries audio.
pub fn format_selector(height: Option<u32>) -> String {
    match height {
        Some(h) => format!(
            "b[height={h}][ext=mp4]\
             /bv*[height={h}]+ba\
             /bv*[height<={h}]+ba\
             /b[height<={h}][ext=mp4]"
        ),
        None => "worst[ext=mp4][acodec!=none][vcodec!=none]/worst[acodec!=none][vcodec!=none]".to_string(),
    }
}

/// Runs the metadata probe (`yt-dlp -J`) for one video.
///
/// A non-zero exit is `NotFound` unless stderr points at the network, in
/// which case it is `UpstreamUnavailable`.
pub async fn probe(ytdlp_bin: &str, timeout: Duration, video_id: &str) -> Result<YtDlpVideoInfo, DownloadError> {
    let url = video_url(video_id);
    log::debug!("yt-dlp probe: {} -J --no-playlist {}", ytdlp_bin, url);

    let mut cmd = Command::new(ytdlp_bin);
    cmd.args(["-J", "--no-playlist", "--no-warnings"]).arg(&url);
    let output = run_with_timeout(&mut cmd, timeout).await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::error!("yt-dlp probe failed for {}: {}", video_id, stderr.trim());
        return Err(match classify_stderr(&stderr) {
            YtDlpErrorKind::Network => DownloadError::UpstreamUnavailable(stderr.trim().to_string()),
            _ => DownloadError::NotFound(stderr.trim().to_string()),
        });
    }

    parse_info(&output.stdout)
}

/// Downloads one rendition into `output_template` and returns the printed metadata.
pub async fn download(
    ytdlp_bin: &str,
    timeout: Duration,
    video_id: &str,
    selector: &str,
    output_template: &Path,
) -> Result<YtDlpVideoInfo, DownloadError> {
    let url = video_url(video_id);
    log::info!("yt-dlp download: {} -f '{}' {}", ytdlp_bin, selector, url);

    let mut cmd = Command::new(ytdlp_bin);
    cmd.args([
        "--no-playlist",
        "--no-warnings",
        "--no-progress",
        "--dump-json",
        "--no-simulate",
        "--merge-output-format",
        "mp4",
        "-f",
        selector,
        "-o",
    ])
    .arg(output_template)
    .arg(&url);
    let output = run_with_timeout(&mut cmd, timeout).await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::error!("yt-dlp download failed for {}: {}", video_id, stderr.trim());
        return Err(match classify_stderr(&stderr) {
            YtDlpErrorKind::FormatUnavailable => DownloadError::QualityUnavailable(selector.to_string()),
            YtDlpErrorKind::VideoUnavailable => DownloadError::NotFound(stderr.trim().to_string()),
            _ => DownloadError::UpstreamUnavailable(stderr.trim().to_string()),
        });
    }

    // The file is what matters; metadata is best-effort.
    Ok(parse_info(&output.stdout).unwrap_or_else(|e| {
        log::warn!("Could not parse yt-dlp metadata for {}: {}", video_id, e);
        YtDlpVideoInfo::default()
    }))
}

/// Parses the last JSON line of yt-dlp stdout.
pub fn parse_info(stdout: &[u8]) -> Result<YtDlpVideoInfo, DownloadError> {
    let text = String::from_utf8_lossy(stdout);
    let line = text
        .lines()
        .rev()
        .find(|l| l.trim_start().starts_with('{'))
        .ok_or_else(|| DownloadError::UpstreamUnavailable("yt-dlp printed no metadata".to_string()))?;
    serde_json::from_str(line)
        .map_err(|e| DownloadError::UpstreamUnavailable(format!("failed to parse yt-dlp output: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_stderr() {
        assert_eq!(
            classify_stderr("ERROR: [youtube] abc: Video unavailable"),
            YtDlpErrorKind::VideoUnavailable
        );
        assert_eq!(
            classify_stderr("ERROR: [youtube] abc: Requested format is not available."),
            YtDlpErrorKind::FormatUnavailable
        );
        assert_eq!(
            classify_stderr("ERROR: Sign in to confirm you're not a bot"),
            YtDlpErrorKind::BotDetection
        );
        assert_eq!(
            classify_stderr("ERROR: Unable to download webpage: <urlopen error [Errno -3] Temporary failure in name resolution>"),
            YtDlpErrorKind::Network
        );
        assert_eq!(classify_stderr("something else"), YtDlpErrorKind::Unknown);
    }

    #[test]
    fn test_format_selector() {
        let selector = format_selector(Some(720));
        assert!(selector.starts_with("b[height=720][ext=mp4]/bv*[height=720]+ba/"));
        assert!(selector.ends_with("/bv*[height<=720]+ba/b[height<=720][ext=mp4]"));
        assert!(!selector.contains(' '));

        assert!(format_selector(None).starts_with("worst[ext=mp4]"));
    }

    #[test]
    fn test_parse_info_takes_last_json_line() {
        let stdout = b"[info] something\n{\"id\":\"dQw4w9WgXcQ\",\"title\":\"Song\",\"duration\":212.4,\"width\":640,\"height\":360}\n";
        let info = parse_info(stdout).unwrap();
        assert_eq!(info.id, "dQw4w9WgXcQ");
        assert_eq!(info.title, "Song");
        assert_eq!(info.duration_secs(), 212);
        assert_eq!(info.height, Some(360));
        assert!(info.formats.is_empty());
    }

    #[test]
    fn test_parse_info_rejects_garbage() {
        assert!(matches!(
            parse_info(b"no json here"),
            Err(DownloadError::UpstreamUnavailable(_))
        ));
    }

    #[test]
    fn test_format_codec_and_size_helpers() {
        let json = r#"{"format_id":"18","ext":"mp4","height":360,"vcodec":"avc1.42001E","acodec":"none","filesize":null,"filesize_approx":1048576.0}"#;
        let format: YtDlpFormat = serde_json::from_str(json).unwrap();
        assert!(format.has_video());
        assert!(!format.has_audio());
        assert_eq!(format.size_bytes(), Some(1_048_576));
    }
}
