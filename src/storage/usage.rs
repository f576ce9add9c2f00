//! Usage analytics facade used by the handlers.
//!
//! Every method is a single statement (or an upsert followed by its read-back)
//! on a pooled connection, so concurrent handlers need no coordination.

use std::sync::Arc;

use crate::core::error::AppResult;
use crate::storage::commands::{self, CommandCount};
use crate::storage::db::{get_connection, DbPool};
use crate::storage::downloads::{self, NewDownload, PopularVideo};
use crate::storage::users::{self, User, UserProfile};

/// Aggregates shown by `/stats` and the `stats` CLI command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageSummary {
    pub user_commands: Option<i64>,
    pub user_downloads: Option<i64>,
    pub total_users: i64,
    pub total_commands: i64,
    pub total_downloads: i64,
    pub top_commands: Vec<CommandCount>,
    pub top_videos: Vec<PopularVideo>,
}

#[derive(Clone)]
pub struct UsageStore {
    pool: Arc<DbPool>,
}

impl UsageStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    pub fn upsert_user(&self, profile: &UserProfile) -> AppResult<User> {
        let conn = get_connection(&self.pool)?;
        Ok(users::upsert_user(&conn, profile)?)
    }

    pub fn find_user(&self, telegram_user_id: i64) -> AppResult<Option<User>> {
        let conn = get_connection(&self.pool)?;
        Ok(users::get_by_telegram_id(&conn, telegram_user_id)?)
    }

    pub fn count_users(&self) -> AppResult<i64> {
        let conn = get_connection(&self.pool)?;
        Ok(users::count_users(&conn)?)
    }

    pub fn record_command(&self, user_id: i64, command: &str) -> AppResult<()> {
        let conn = get_connection(&self.pool)?;
        Ok(commands::record_command(&conn, user_id, command)?)
    }

    pub fn command_count_for_user(&self, user_id: i64) -> AppResult<i64> {
        let conn = get_connection(&self.pool)?;
        Ok(commands::count_for_user(&conn, user_id)?)
    }

    pub fn total_commands(&self) -> AppResult<i64> {
        let conn = get_connection(&self.pool)?;
        Ok(commands::count_total(&conn)?)
    }

    pub fn top_commands(&self, limit: usize) -> AppResult<Vec<CommandCount>> {
        let conn = get_connection(&self.pool)?;
        Ok(commands::top_commands(&conn, limit)?)
    }

    pub fn record_download(&self, download: &NewDownload) -> AppResult<()> {
        let conn = get_connection(&self.pool)?;
        Ok(downloads::record_download(&conn, download)?)
    }

    pub fn download_count_for_user(&self, user_id: i64) -> AppResult<i64> {
        let conn = get_connection(&self.pool)?;
        Ok(downloads::count_for_user(&conn, user_id)?)
    }

    pub fn total_downloads(&self) -> AppResult<i64> {
        let conn = get_connection(&self.pool)?;
        Ok(downloads::count_total(&conn)?)
    }

    pub fn top_videos(&self, limit: usize) -> AppResult<Vec<PopularVideo>> {
        let conn = get_connection(&self.pool)?;
        Ok(downloads::top_videos(&conn, limit)?)
    }

    /// Upserts the user and appends one command row, logging instead of failing.
    ///
    /// Returns the stored user when the upsert succeeded.
    pub fn track_command(&self, profile: &UserProfile, command: &str) -> Option<User> {
        let user = match self.upsert_user(profile) {
            Ok(user) => user,
            Err(e) => {
                log::error!("[DB] Failed to upsert user {}: {}", profile.telegram_user_id, e);
                return None;
            }
        };
        if let Err(e) = self.record_command(user.id, command) {
            log::error!("[DB] Failed to record command '{}' for user {}: {}", command, user.id, e);
        }
        Some(user)
    }

    /// Global aggregates, plus the per-user counts when `user_id` is given.
    pub fn summary(&self, user_id: Option<i64>, top_n: usize) -> AppResult<UsageSummary> {
        let (user_commands, user_downloads) = match user_id {
            Some(id) => (
                Some(self.command_count_for_user(id)?),
                Some(self.download_count_for_user(id)?),
            ),
            None => (None, None),
        };

        Ok(UsageSummary {
            user_commands,
            user_downloads,
            total_users: self.count_users()?,
            total_commands: self.total_commands()?,
            total_downloads: self.total_downloads()?,
            top_commands: self.top_commands(top_n)?,
            top_videos: self.top_videos(top_n)?,
        })
    }
}
