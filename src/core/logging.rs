//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - External tool availability check logged at startup

use anyhow::Result;
use simplelog::*;
use std::fs::File;
use tokio::process::Command;

use crate::core::config::ToolPaths;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to create the file or a logger is already installed
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Installs a panic hook that routes panics from handler tasks into the log.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));
}

/// Returns the first line of `<bin> <version_flag>` output, or `None` if the tool is missing.
pub async fn tool_version(bin: &str, version_flag: &str) -> Option<String> {
    let output = Command::new(bin).arg(version_flag).output().await.ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|line| line.trim().to_string())
}

/// Logs which external tools are available at application startup
///
/// yt-dlp is mandatory for every download; ffmpeg is only needed for
/// merging video-only renditions and for transcoding oversized files.
pub async fn log_tools_configuration(tools: &ToolPaths, transcode_enabled: bool) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("🔧 External Tools Check");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    match tool_version(&tools.ytdlp, "--version").await {
        Some(version) => log::info!("✅ yt-dlp ({}): {}", tools.ytdlp, version),
        None => log::error!("❌ yt-dlp ({}) NOT FOUND - downloads will FAIL!", tools.ytdlp),
    }

    match tool_version(&tools.ffmpeg, "-version").await {
        Some(version) => log::info!("✅ ffmpeg ({}): {}", tools.ffmpeg, version),
        None if transcode_enabled => {
            log::warn!("⚠️  ffmpeg ({}) not found - oversized videos cannot be compressed", tools.ffmpeg)
        }
        None => log::warn!("⚠️  ffmpeg ({}) not found", tools.ffmpeg),
    }

    if !transcode_enabled {
        log::info!("   Transcoding disabled (TRANSCODE_ENABLED=false)");
    }
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_tool_has_no_version() {
        assert!(tool_version("tubedrop-definitely-missing-binary", "--version")
            .await
            .is_none());
    }
}
