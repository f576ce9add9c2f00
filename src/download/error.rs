use std::time::Duration;

use thiserror::Error;

/// Structured error type for listing and fetching media.
///
/// Each variant maps to one user-facing message; the inner strings are for
/// logs only and never reach the chat.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// yt-dlp/ffmpeg could not be run, or failed at the network/process level
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    /// The metadata probe ran but the video cannot be resolved
    #[error("video not found: {0}")]
    NotFound(String),
    /// Every candidate rendition was filtered out
    #[error("no suitable format found")]
    NoSuitableFormat,
    /// The requested quality is not (or no longer) offered
    #[error("quality '{0}' is not available")]
    QualityUnavailable(String),
    /// Both transcode passes left the file over the ceiling, or the transcoder failed
    #[error("compression failed: {0}")]
    CompressionFailed(String),
    /// An external process exceeded its wall-clock bound
    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    /// Local filesystem failure around the transient files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// Returns subcategory for logs
    pub fn subcategory(&self) -> &'static str {
        match self {
            DownloadError::UpstreamUnavailable(_) => "upstream_unavailable",
            DownloadError::NotFound(_) => "not_found",
            DownloadError::NoSuitableFormat => "no_suitable_format",
            DownloadError::QualityUnavailable(_) => "quality_unavailable",
            DownloadError::CompressionFailed(_) => "compression_failed",
            DownloadError::Timeout(_) => "timeout",
            DownloadError::Io(_) => "io",
        }
    }

    /// Localization key of the message shown to the user for this error
    pub fn user_message_key(&self) -> &'static str {
        match self {
            DownloadError::UpstreamUnavailable(_) | DownloadError::Io(_) => "error-upstream",
            DownloadError::NotFound(_) => "error-not-found",
            DownloadError::NoSuitableFormat => "error-no-formats",
            DownloadError::QualityUnavailable(_) => "error-quality-unavailable",
            DownloadError::CompressionFailed(_) => "error-compression-failed",
            DownloadError::Timeout(_) => "error-timeout",
        }
    }
}
