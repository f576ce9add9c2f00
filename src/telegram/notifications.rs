use chrono::{DateTime, Utc};
use teloxide::types::ChatId;

use crate::core::config::Config;
use crate::core::utils::escape_html;
use crate::telegram::transport::Transport;

/// HTML body of the startup notice.
pub fn startup_message(version: &str, host: &str, started_at: DateTime<Utc>) -> String {
    format!(
        "🚀 <b>Bot started</b>\n\n\
        Time: <code>{}</code>\n\
        Version: <code>{}</code>\n\
        Host: <code>{}</code>",
        started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        escape_html(version),
        escape_html(host)
    )
}

/// Tells the administrator the bot is up. Failures are only logged.
pub async fn notify_admin_startup(transport: &dyn Transport, admin_chat_id: Option<i64>, config: &Config) {
    let Some(chat_id) = admin_chat_id else {
        log::info!("ADMIN_CHAT_ID not set, skipping startup notification");
        return;
    };

    let message = startup_message(&config.app_version, &config.host_name, Utc::now());
    match transport.send_html(ChatId(chat_id), &message).await {
        Ok(_) => log::info!("Startup notification sent to admin chat {}", chat_id),
        Err(e) => log::error!("Failed to send startup notification: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_startup_message_escapes_fields() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let text = startup_message("1.2<beta>", "host&co", at);
        assert_eq!(
            text,
            "🚀 <b>Bot started</b>\n\nTime: <code>2024-05-01 12:30:00 UTC</code>\n\
            Version: <code>1.2&lt;beta&gt;</code>\nHost: <code>host&amp;co</code>"
        );
    }
}
