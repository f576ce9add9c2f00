use rusqlite::{params, Result};

use crate::storage::db::{now_timestamp, DbConnection};

/// A successful delivery, written after the file reached the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDownload {
    /// Internal user id
    pub user_id: i64,
    pub video_id: String,
    pub video_url: String,
    pub video_title: String,
    /// Quality label as selected, e.g. "720p"
    pub quality: String,
    pub compressed: bool,
    pub file_size_bytes: u64,
}

/// Download count of one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopularVideo {
    pub video_id: String,
    /// Title recorded with the most recent download
    pub video_title: Option<String>,
    pub download_count: i64,
}

pub fn record_download(conn: &DbConnection, download: &NewDownload) -> Result<()> {
    conn.execute(
        "INSERT INTO video_downloads
            (user_id, video_id, video_url, video_title, quality, compressed, file_size_bytes, executed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            download.user_id,
            download.video_id,
            download.video_url,
            download.video_title,
            download.quality,
            download.compressed,
            download.file_size_bytes as i64,
            now_timestamp(),
        ],
    )?;
    Ok(())
}

/// Downloads delivered to one user.
pub fn count_for_user(conn: &DbConnection, user_id: i64) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM video_downloads WHERE user_id = ?1", [user_id], |row| {
        row.get(0)
    })
}

/// Downloads delivered to all users.
pub fn count_total(conn: &DbConnection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM video_downloads", [], |row| row.get(0))
}

/// Most downloaded videos, most frequent first; ties ordered by video id.
pub fn top_videos(conn: &DbConnection, limit: usize) -> Result<Vec<PopularVideo>> {
    let mut stmt = conn.prepare(
        "SELECT v.video_id,
                (SELECT latest.video_title FROM video_downloads latest
                 WHERE latest.video_id = v.video_id
                 ORDER BY latest.executed_at DESC, latest.id DESC LIMIT 1),
                COUNT(*) AS cnt
         FROM video_downloads v
         GROUP BY v.video_id
         ORDER BY cnt DESC, v.video_id ASC
         LIMIT ?1",
    )?;
    let rows = stmt.query_map([limit as i64], |row| {
        Ok(PopularVideo {
            video_id: row.get(0)?,
            video_title: row.get(1)?,
            download_count: row.get(2)?,
        })
    })?;
    rows.collect()
}
