//! Media fetcher: download one rendition, shrink it if needed, hand it over.
//!
//! Each fetch works inside its own temporary directory. The directory travels
//! with the [`FetchResult`], so the download and any transcode leftovers are
//! removed as soon as the result is dropped, whichever path the caller takes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use crate::core::config::{DeliveryLimits, Timeouts, ToolPaths};
use crate::download::probe::probe_video_metadata;
use crate::download::transcode::{shrink_to_ceiling, Transcoder};
use crate::download::ytdlp::{self, format_selector};
use crate::download::DownloadError;

/// Descriptive data attached to a fetched file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaMetadata {
    pub title: String,
    pub description: Option<String>,
    /// 0 when unknown
    pub duration_secs: u32,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// A file ready for delivery.
///
/// Owns the temporary directory holding the file; dropping the result (or
/// calling [`FetchResult::cleanup`]) deletes everything in it.
#[derive(Debug)]
pub struct FetchResult {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub metadata: MediaMetadata,
    pub transcoded: bool,
    workspace: TempDir,
}

impl FetchResult {
    pub fn new(workspace: TempDir, path: PathBuf, size_bytes: u64, metadata: MediaMetadata, transcoded: bool) -> Self {
        Self {
            path,
            size_bytes,
            metadata,
            transcoded,
            workspace,
        }
    }

    /// Directory the file lives in.
    pub fn workspace_path(&self) -> &Path {
        self.workspace.path()
    }

    /// Deletes the file and its directory, logging instead of failing.
    pub fn cleanup(self) {
        let dir = self.workspace.path().to_path_buf();
        match self.workspace.close() {
            Ok(()) => log::debug!("Removed transient directory {}", dir.display()),
            Err(e) => log::warn!("Failed to remove transient directory {}: {}", dir.display(), e),
        }
    }
}

/// Maps a quality label to the height bound used by the format selector.
///
/// An empty label means "smallest rendition with audio" (`None`).
pub fn resolve_quality(label: &str) -> Result<Option<u32>, DownloadError> {
    let label = label.trim();
    if label.is_empty() {
        return Ok(None);
    }
    label
        .strip_suffix('p')
        .and_then(|h| h.parse::<u32>().ok())
        .filter(|h| *h > 0)
        .map(Some)
        .ok_or_else(|| DownloadError::QualityUnavailable(label.to_string()))
}

/// Downloads renditions with yt-dlp and optionally shrinks them.
#[derive(Clone)]
pub struct MediaFetcher {
    tools: ToolPaths,
    limits: DeliveryLimits,
    timeouts: Timeouts,
    temp_dir: PathBuf,
    transcoder: Option<Arc<dyn Transcoder>>,
}

impl MediaFetcher {
    pub fn new(
        tools: ToolPaths,
        limits: DeliveryLimits,
        timeouts: Timeouts,
        temp_dir: PathBuf,
        transcoder: Option<Arc<dyn Transcoder>>,
    ) -> Self {
        Self {
            tools,
            limits,
            timeouts,
            temp_dir,
            transcoder,
        }
    }

    /// Fetches `video_id` at `quality` ("720p", or "" for the smallest with audio).
    ///
    /// Files over the soft ceiling are transcoded when a transcoder is
    /// configured; otherwise they are returned as-is and the caller decides.
    pub async fn fetch(&self, video_id: &str, quality: &str) -> Result<FetchResult, DownloadError> {
        let height = resolve_quality(quality)?;

        tokio::fs::create_dir_all(&self.temp_dir).await?;
        let workspace = tempfile::Builder::new().prefix("tubedrop-").tempdir_in(&self.temp_dir)?;
        let template = workspace.path().join(format!("{}.%(ext)s", video_id));

        let info = ytdlp::download(
            &self.tools.ytdlp,
            self.timeouts.fetch,
            video_id,
            &format_selector(height),
            &template,
        )
        .await?;

        let path = find_downloaded_file(workspace.path(), video_id)
            .await?
            .ok_or_else(|| DownloadError::UpstreamUnavailable("yt-dlp reported success but wrote no file".to_string()))?;
        let size_bytes = tokio::fs::metadata(&path).await?.len();
        log::info!("Downloaded {} ({} bytes) to {}", video_id, size_bytes, path.display());

        let mut metadata = MediaMetadata {
            title: info.title.clone(),
            description: info.description.clone().filter(|d| !d.trim().is_empty()),
            duration_secs: info.duration_secs(),
            width: info.width,
            height: info.height,
        };
        if metadata.duration_secs == 0 || metadata.width.is_none() || metadata.height.is_none() {
            if let Some(probed) = probe_video_metadata(&self.tools.ffprobe, self.timeouts.probe, &path).await {
                if metadata.duration_secs == 0 {
                    metadata.duration_secs = probed.duration_secs.unwrap_or(0);
                }
                metadata.width = metadata.width.or(probed.width);
                metadata.height = metadata.height.or(probed.height);
            }
        }

        let ceiling = self.limits.soft_ceiling_bytes;
        if size_bytes <= ceiling {
            return Ok(FetchResult::new(workspace, path, size_bytes, metadata, false));
        }

        let Some(transcoder) = self.transcoder.as_deref() else {
            log::warn!(
                "{} is {} bytes, over the {} byte ceiling, and transcoding is disabled",
                video_id,
                size_bytes,
                ceiling
            );
            return Ok(FetchResult::new(workspace, path, size_bytes, metadata, false));
        };

        let outcome = shrink_to_ceiling(transcoder, &path, metadata.duration_secs, ceiling).await?;
        log::info!(
            "Transcoded {} from {} to {} bytes in {} pass(es)",
            video_id,
            size_bytes,
            outcome.size_bytes,
            outcome.passes
        );
        Ok(FetchResult::new(workspace, outcome.path, outcome.size_bytes, metadata, true))
    }
}

/// Finds the file yt-dlp wrote for `video_id`, skipping partial downloads.
async fn find_downloaded_file(dir: &Path, video_id: &str) -> Result<Option<PathBuf>, DownloadError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut fallback = None;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.starts_with(video_id) || name.ends_with(".part") || name.ends_with(".ytdl") {
            continue;
        }
        if path.extension().is_some_and(|ext| ext == "mp4") {
            return Ok(Some(path));
        }
        fallback.get_or_insert(path);
    }

    Ok(fallback)
}
