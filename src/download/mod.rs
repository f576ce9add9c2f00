//! Listing, downloading and shrinking media

pub mod error;
pub mod fetcher;
pub mod formats;
pub mod probe;
pub mod source;
pub mod transcode;
pub mod ytdlp;

// Re-exports for convenience
pub use error::DownloadError;
pub use fetcher::{FetchResult, MediaFetcher, MediaMetadata};
pub use formats::{FormatLister, QualityOption};
pub use source::{VideoSource, YtDlpSource};
pub use transcode::{FfmpegTranscoder, Transcoder};
