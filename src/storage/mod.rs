//! SQLite persistence for usage analytics

pub mod commands;
pub mod db;
pub mod downloads;
pub mod migrations;
pub mod usage;
pub mod users;

// Re-exports for convenience
pub use db::{create_pool, get_connection, DbConnection, DbPool};
pub use usage::{UsageStore, UsageSummary};
pub use users::{User, UserProfile};
