//! Format lister: turns a yt-dlp probe into the quality options offered to the user

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::core::utils::format_approx_size;
use crate::download::ytdlp::{self, YtDlpFormat};
use crate::download::DownloadError;

/// One downloadable rendition offered as a button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityOption {
    /// e.g. "720p"
    pub label: String,
    /// Vertical resolution, the ordering key
    pub rank: u32,
    /// Exact or approximate size, when yt-dlp knows it
    pub size_bytes: Option<u64>,
    /// Button text, e.g. "720p (~12MB)"
    pub description: String,
    pub has_audio: bool,
}

impl QualityOption {
    fn from_format(height: u32, format: &YtDlpFormat, size_bytes: Option<u64>) -> Self {
        let label = format!("{}p", height);
        let description = match size_bytes {
            Some(size) => format!("{} ({})", label, format_approx_size(size)),
            None => label.clone(),
        };
        Self {
            label,
            rank: height,
            size_bytes,
            description,
            has_audio: format.has_audio(),
        }
    }
}

/// Lists the quality options of a video with a single yt-dlp probe.
#[derive(Debug, Clone)]
pub struct FormatLister {
    ytdlp_bin: String,
    timeout: Duration,
    ceiling_bytes: u64,
}

impl FormatLister {
    pub fn new(ytdlp_bin: impl Into<String>, timeout: Duration, ceiling_bytes: u64) -> Self {
        Self {
            ytdlp_bin: ytdlp_bin.into(),
            timeout,
            ceiling_bytes,
        }
    }

    /// Probes `video_id` and returns its options ascending by resolution.
    pub async fn list(&self, video_id: &str) -> Result<Vec<QualityOption>, DownloadError> {
        let info = ytdlp::probe(&self.ytdlp_bin, self.timeout, video_id).await?;
        let options = select_quality_options(&info.formats, self.ceiling_bytes)?;
        log::info!(
            "Found {} quality options for {} (from {} formats)",
            options.len(),
            video_id,
            info.formats.len()
        );
        Ok(options)
    }
}

/// Container/codec pairings the bot can deliver.
///
/// Muxed renditions must already be mp4; video-only renditions (mp4 or webm)
/// are merged with the best audio track by yt-dlp at download time.
fn is_usable(format: &YtDlpFormat) -> bool {
    if !format.has_video() {
        return false;
    }
    match format.ext.as_str() {
        "mp4" => true,
        "webm" => !format.has_audio(),
        _ => false,
    }
}

/// Size of the audio track yt-dlp merges into video-only renditions (`+ba`).
fn best_audio_size(formats: &[YtDlpFormat]) -> Option<u64> {
    formats
        .iter()
        .filter(|f| f.has_audio() && !f.has_video())
        .filter_map(YtDlpFormat::size_bytes)
        .max()
}

/// Bytes the user will receive for `format`, merged audio included.
fn delivered_size(format: &YtDlpFormat, audio_bytes: Option<u64>) -> Option<u64> {
    let video_bytes = format.size_bytes()?;
    if format.has_audio() {
        Some(video_bytes)
    } else {
        Some(video_bytes + audio_bytes.unwrap_or(0))
    }
}

/// Orders two candidates of the same resolution; `Less` means preferred.
///
/// Audio+video beats video-only; then the smaller known size wins, and an
/// unknown size loses to any known one.
fn preference(a: &YtDlpFormat, b: &YtDlpFormat) -> Ordering {
    b.has_audio()
        .cmp(&a.has_audio())
        .then_with(|| match (a.size_bytes(), b.size_bytes()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

/// Filters and deduplicates raw formats into quality options.
///
/// At most one option per resolution, ascending by resolution, none larger
/// than `ceiling_bytes` once merged audio is counted (formats of unknown size
/// are kept).
pub fn select_quality_options(formats: &[YtDlpFormat], ceiling_bytes: u64) -> Result<Vec<QualityOption>, DownloadError> {
    let audio_bytes = best_audio_size(formats);
    let mut best_by_height: BTreeMap<u32, &YtDlpFormat> = BTreeMap::new();

    for format in formats {
        let Some(height) = format.height.filter(|h| *h > 0) else {
            continue;
        };
        if !is_usable(format) {
            continue;
        }
        if delivered_size(format, audio_bytes).is_some_and(|size| size > ceiling_bytes) {
            continue;
        }

        best_by_height
            .entry(height)
            .and_modify(|current| {
                if preference(format, *current) == Ordering::Less {
                    *current = format;
                }
            })
            .or_insert(format);
    }

    if best_by_height.is_empty() {
        return Err(DownloadError::NoSuitableFormat);
    }

    Ok(best_by_height
        .into_iter()
        .map(|(height, format)| QualityOption::from_format(height, format, delivered_size(format, audio_bytes)))
        .collect())
}
