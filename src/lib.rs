//! Tubedrop - Telegram bot that delivers YouTube videos in a chosen quality
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging and process helpers
//! - `storage`: SQLite usage analytics
//! - `download`: format listing, fetching and transcoding via yt-dlp/ffmpeg
//! - `telegram`: event intake, dispatch, handlers and outbound transport
//! - `i18n`: Fluent localisation
//! - `cli`: command line interface

pub mod cli;
pub mod core;
pub mod download;
pub mod i18n;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult, Config};
pub use download::{DownloadError, VideoSource, YtDlpSource};
pub use storage::{create_pool, get_connection, DbConnection, DbPool, UsageStore};
pub use telegram::{Dispatcher, InboundEvent, Transport};
