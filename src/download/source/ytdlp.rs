//! Production backend powered by yt-dlp and ffmpeg

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::config::Config;
use crate::download::fetcher::{FetchResult, MediaFetcher};
use crate::download::formats::{FormatLister, QualityOption};
use crate::download::source::VideoSource;
use crate::download::transcode::{FfmpegTranscoder, Transcoder};
use crate::download::DownloadError;

/// Format lister and media fetcher behind one `VideoSource`.
#[derive(Clone)]
pub struct YtDlpSource {
    lister: FormatLister,
    fetcher: MediaFetcher,
}

impl YtDlpSource {
    pub fn new(lister: FormatLister, fetcher: MediaFetcher) -> Self {
        Self { lister, fetcher }
    }

    /// Wires the lister, fetcher and (when enabled) the ffmpeg transcoder from configuration.
    pub fn from_config(config: &Config) -> Self {
        let lister = FormatLister::new(
            config.tools.ytdlp.clone(),
            config.timeouts.probe,
            config.limits.listing_ceiling(),
        );

        let transcoder: Option<Arc<dyn Transcoder>> = if config.limits.transcode_enabled {
            Some(Arc::new(FfmpegTranscoder::new(config.tools.ffmpeg.clone(), config.timeouts.fetch)))
        } else {
            None
        };

        let fetcher = MediaFetcher::new(
            config.tools.clone(),
            config.limits,
            config.timeouts,
            config.temp_dir.clone(),
            transcoder,
        );

        Self::new(lister, fetcher)
    }
}

#[async_trait]
impl VideoSource for YtDlpSource {
    async fn list_formats(&self, video_id: &str) -> Result<Vec<QualityOption>, DownloadError> {
        self.lister.list(video_id).await
    }

    async fn fetch(&self, video_id: &str, quality: &str) -> Result<FetchResult, DownloadError> {
        self.fetcher.fetch(video_id, quality).await
    }
}
