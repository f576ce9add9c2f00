use async_trait::async_trait;
use fluent_templates::fluent_bundle::FluentArgs;
use unic_langid::LanguageIdentifier;

use crate::core::error::AppResult;
use crate::i18n;
use crate::storage::UsageSummary;
use crate::telegram::event::InboundEvent;
use crate::telegram::handlers::{HandlerDeps, UpdateHandler};

const TOP_N: usize = 5;

/// Renders the usage report shown by `/stats`.
pub fn format_summary(lang: &LanguageIdentifier, summary: &UsageSummary) -> String {
    let mut text = i18n::t(lang, "stats-title");
    text.push_str("\n\n");

    if let (Some(commands), Some(downloads)) = (summary.user_commands, summary.user_downloads) {
        let mut args = FluentArgs::new();
        args.set("commands", commands);
        args.set("downloads", downloads);
        text.push_str(&i18n::t_args(lang, "stats-personal", &args));
        text.push('\n');
    }

    let mut args = FluentArgs::new();
    args.set("users", summary.total_users);
    args.set("commands", summary.total_commands);
    args.set("downloads", summary.total_downloads);
    text.push_str(&i18n::t_args(lang, "stats-global", &args));

    text.push_str("\n\n");
    text.push_str(&i18n::t(lang, "stats-top-commands"));
    if summary.top_commands.is_empty() {
        text.push_str(&format!("\n{}", i18n::t(lang, "stats-empty")));
    }
    for (i, row) in summary.top_commands.iter().enumerate() {
        text.push_str(&format!("\n{}. /{}: {}", i + 1, row.command, row.count));
    }

    text.push_str("\n\n");
    text.push_str(&i18n::t(lang, "stats-top-videos"));
    if summary.top_videos.is_empty() {
        text.push_str(&format!("\n{}", i18n::t(lang, "stats-empty")));
    }
    for (i, row) in summary.top_videos.iter().enumerate() {
        let title = row.video_title.as_deref().unwrap_or(&row.video_id);
        text.push_str(&format!("\n{}. {}: {}", i + 1, title, row.download_count));
    }

    text
}

/// Replies to `/stats` with personal and global usage.
pub struct StatsHandler {
    deps: HandlerDeps,
}

impl StatsHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl UpdateHandler for StatsHandler {
    fn name(&self) -> &'static str {
        "stats"
    }

    fn accepts(&self, event: &InboundEvent) -> bool {
        matches!(event, InboundEvent::ChatMessage(msg) if msg.command.as_deref() == Some("stats"))
    }

    async fn handle(&self, event: InboundEvent) -> AppResult<()> {
        let InboundEvent::ChatMessage(msg) = event else {
            return Ok(());
        };
        let lang = i18n::lang_from_locale(msg.sender.as_ref().and_then(|s| s.language_code.as_deref()));

        let user = msg
            .sender
            .as_ref()
            .and_then(|sender| self.deps.store.track_command(&sender.profile(), "stats"));

        let text = match self.deps.store.summary(user.map(|u| u.id), TOP_N) {
            Ok(summary) => format_summary(&lang, &summary),
            Err(e) => {
                log::error!("[STATS] Failed to build summary: {}", e);
                i18n::t(&lang, "stats-unavailable")
            }
        };
        self.deps.transport.send_text(msg.chat_id, &text).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::commands::CommandCount;
    use crate::storage::downloads::PopularVideo;

    #[test]
    fn test_format_summary_lists_rankings() {
        let summary = UsageSummary {
            user_commands: Some(3),
            user_downloads: Some(1),
            total_users: 2,
            total_commands: 5,
            total_downloads: 1,
            top_commands: vec![
                CommandCount {
                    command: "start".to_string(),
                    count: 3,
                },
                CommandCount {
                    command: "youtube".to_string(),
                    count: 2,
                },
            ],
            top_videos: vec![PopularVideo {
                video_id: "dQw4w9WgXcQ".to_string(),
                video_title: None,
                download_count: 1,
            }],
        };
        let text = format_summary(&i18n::lang_from_code("en"), &summary);

        assert!(text.starts_with("📊 Statistics"));
        assert!(text.contains("You: 3 commands, 1 downloads"));
        assert!(text.contains("Total: 2 users, 5 commands, 1 downloads"));
        assert!(text.contains("1. /start: 3\n2. /youtube: 2"));
        assert!(text.contains("1. dQw4w9WgXcQ: 1"));
    }

    #[test]
    fn test_format_summary_without_user_or_data() {
        let text = format_summary(&i18n::lang_from_code("en"), &UsageSummary::default());
        assert!(!text.contains("You:"));
        assert_eq!(text.matches("nothing yet").count(), 2);
    }
}
