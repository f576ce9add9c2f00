//! Video source abstraction.
//!
//! Handlers talk to a `VideoSource` rather than to yt-dlp directly, so the
//! two-phase flow can be exercised without external tools.
//!
//! Built-in backend:
//! - `YtDlpSource`: yt-dlp for listing and downloading, ffmpeg for shrinking

pub mod ytdlp;

use async_trait::async_trait;

use crate::download::fetcher::FetchResult;
use crate::download::formats::QualityOption;
use crate::download::DownloadError;

pub use ytdlp::YtDlpSource;

/// Lists and fetches renditions of a video identified by its external id.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Quality options ascending by resolution, each within the listing ceiling.
    async fn list_formats(&self, video_id: &str) -> Result<Vec<QualityOption>, DownloadError>;

    /// Fetches one rendition into transient storage.
    ///
    /// `quality` is a label previously returned by `list_formats`, or "" for
    /// the smallest rendition with audio.
    async fn fetch(&self, video_id: &str, quality: &str) -> Result<FetchResult, DownloadError>;
}
