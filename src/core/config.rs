use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::core::error::{AppError, AppResult};

/// Bytes in one mebibyte, the unit all size limits are configured in.
pub const MB: u64 = 1024 * 1024;

/// Telegram caption length limit (characters)
pub const CAPTION_MAX_CHARS: usize = 1024;

/// Description excerpt length used in captions (characters)
pub const CAPTION_DESCRIPTION_CHARS: usize = 200;

/// Tag prefixing every quality-selection callback payload
pub const CALLBACK_TAG: &str = "yt";

/// Retry configuration for the receive loop
pub mod retry {
    use super::Duration;

    /// Delay between long-poll attempts after a failed `getUpdates` (in seconds)
    pub const POLL_RETRY_DELAY_SECS: u64 = 5;

    /// Long-poll retry delay duration
    pub fn poll_delay() -> Duration {
        Duration::from_secs(POLL_RETRY_DELAY_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Server-side long-poll timeout passed to `getUpdates` (in seconds)
    pub const LONG_POLL_TIMEOUT_SECS: u32 = 60;

    /// Request timeout for HTTP requests (in seconds)
    /// Large enough for multi-hundred-megabyte uploads through a local Bot API server
    pub const REQUEST_TIMEOUT_SECS: u64 = 900;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Size ceilings applied to listing, fetching and delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryLimits {
    /// Per-transport upload ceiling. Files above it are transcoded when possible.
    pub soft_ceiling_bytes: u64,
    /// Absolute ceiling, nothing above it is ever delivered.
    pub hard_ceiling_bytes: u64,
    /// Whether the optional transcoding step is available.
    pub transcode_enabled: bool,
}

impl DeliveryLimits {
    /// Ceiling applied by the format lister.
    ///
    /// With transcoding available an oversized rendition can still be shrunk
    /// below the soft ceiling, so only the hard ceiling filters the listing.
    pub fn listing_ceiling(&self) -> u64 {
        if self.transcode_enabled {
            self.hard_ceiling_bytes
        } else {
            self.soft_ceiling_bytes
        }
    }
}

impl Default for DeliveryLimits {
    fn default() -> Self {
        Self {
            soft_ceiling_bytes: 50 * MB,
            hard_ceiling_bytes: 2000 * MB,
            transcode_enabled: true,
        }
    }
}

/// Paths of the external command-line tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub ytdlp: String,
    pub ffmpeg: String,
    pub ffprobe: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ytdlp: "yt-dlp".to_string(),
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

/// Wall-clock bounds for external work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Metadata probe (`yt-dlp -J`)
    pub probe: Duration,
    /// Download and each transcode pass
    pub fetch: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            probe: Duration::from_secs(120),
            fetch: Duration::from_secs(30 * 60),
        }
    }
}

/// Application configuration.
///
/// Built once at startup and handed to each component, nothing reads the
/// process environment after that.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bot token; absent when running CLI subcommands that never talk to Telegram
    pub bot_token: Option<SecretString>,
    /// Chat that receives the startup notification
    pub admin_chat_id: Option<i64>,
    pub database_path: String,
    pub log_file_path: String,
    pub app_version: String,
    /// Shown in the startup notification
    pub host_name: String,
    /// Custom Bot API server (e.g. a local `telegram-bot-api` instance)
    pub bot_api_url: Option<String>,
    pub temp_dir: PathBuf,
    pub send_as_document: bool,
    pub tools: ToolPaths,
    pub limits: DeliveryLimits,
    pub timeouts: Timeouts,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let first = |keys: &[&str]| keys.iter().find_map(|k| get(k));

        let bot_token = first(&["TELEGRAM_BOT_TOKEN", "BOT_TOKEN", "TELOXIDE_TOKEN"]).map(SecretString::from);

        let admin_chat_id = get("ADMIN_CHAT_ID")
            .map(|v| parse_value::<i64>("ADMIN_CHAT_ID", &v))
            .transpose()?;

        let temp_dir = match get("TEMP_FILES_DIR") {
            Some(dir) => PathBuf::from(shellexpand::tilde(&dir).to_string()),
            None => std::env::temp_dir(),
        };

        let defaults = DeliveryLimits::default();
        let limits = DeliveryLimits {
            soft_ceiling_bytes: get("MAX_UPLOAD_MB")
                .map(|v| parse_value::<u64>("MAX_UPLOAD_MB", &v).map(|mb| mb * MB))
                .transpose()?
                .unwrap_or(defaults.soft_ceiling_bytes),
            hard_ceiling_bytes: get("MAX_FILE_MB")
                .map(|v| parse_value::<u64>("MAX_FILE_MB", &v).map(|mb| mb * MB))
                .transpose()?
                .unwrap_or(defaults.hard_ceiling_bytes),
            transcode_enabled: get("TRANSCODE_ENABLED")
                .map(|v| parse_bool("TRANSCODE_ENABLED", &v))
                .transpose()?
                .unwrap_or(defaults.transcode_enabled),
        };
        validate_limits(&limits)?;

        let default_timeouts = Timeouts::default();
        let timeouts = Timeouts {
            probe: get("PROBE_TIMEOUT_SECS")
                .map(|v| parse_value::<u64>("PROBE_TIMEOUT_SECS", &v).map(Duration::from_secs))
                .transpose()?
                .unwrap_or(default_timeouts.probe),
            fetch: get("FETCH_TIMEOUT_SECS")
                .map(|v| parse_value::<u64>("FETCH_TIMEOUT_SECS", &v).map(Duration::from_secs))
                .transpose()?
                .unwrap_or(default_timeouts.fetch),
        };

        let default_tools = ToolPaths::default();
        let tools = ToolPaths {
            ytdlp: get("YTDL_BIN").unwrap_or(default_tools.ytdlp),
            ffmpeg: get("FFMPEG_BIN").unwrap_or(default_tools.ffmpeg),
            ffprobe: get("FFPROBE_BIN").unwrap_or(default_tools.ffprobe),
        };

        Ok(Self {
            bot_token,
            admin_chat_id,
            database_path: first(&["DB_PATH", "DATABASE_PATH"]).unwrap_or_else(|| "/data/bot.db".to_string()),
            log_file_path: get("LOG_FILE_PATH").unwrap_or_else(|| "app.log".to_string()),
            app_version: get("APP_VERSION").unwrap_or_else(|| "unknown".to_string()),
            host_name: get("HOSTNAME").or_else(read_host_name).unwrap_or_else(|| "unknown".to_string()),
            bot_api_url: get("BOT_API_URL"),
            temp_dir,
            send_as_document: get("SEND_AS_DOCUMENT")
                .map(|v| parse_bool("SEND_AS_DOCUMENT", &v))
                .transpose()?
                .unwrap_or(true),
            tools,
            limits,
            timeouts,
        })
    }

    /// Returns the bot token or a configuration error naming the expected variable.
    pub fn require_bot_token(&self) -> AppResult<&SecretString> {
        self.bot_token
            .as_ref()
            .ok_or_else(|| AppError::Config("TELEGRAM_BOT_TOKEN environment variable is not set".to_string()))
    }
}

fn read_host_name() -> Option<String> {
    std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> AppResult<T> {
    value
        .parse::<T>()
        .map_err(|_| AppError::Config(format!("{} has invalid value '{}'", key, value)))
}

fn parse_bool(key: &str, value: &str) -> AppResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::Config(format!("{} must be a boolean, got '{}'", key, value))),
    }
}

fn validate_limits(limits: &DeliveryLimits) -> AppResult<()> {
    if limits.soft_ceiling_bytes == 0 || limits.hard_ceiling_bytes == 0 {
        return Err(AppError::Config("size ceilings must be positive".to_string()));
    }
    if limits.soft_ceiling_bytes > limits.hard_ceiling_bytes {
        return Err(AppError::Config(format!(
            "MAX_UPLOAD_MB ({}) exceeds MAX_FILE_MB ({})",
            limits.soft_ceiling_bytes / MB,
            limits.hard_ceiling_bytes / MB
        )));
    }
    Ok(())
}
