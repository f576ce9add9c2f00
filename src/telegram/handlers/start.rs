use async_trait::async_trait;
use fluent_templates::fluent_bundle::FluentArgs;
use unic_langid::LanguageIdentifier;

use crate::core::error::AppResult;
use crate::i18n;
use crate::telegram::event::InboundEvent;
use crate::telegram::handlers::{HandlerDeps, UpdateHandler};

/// First name if present, otherwise the username, otherwise empty.
pub fn get_display_name(first_name: &str, username: &str) -> String {
    if !first_name.is_empty() {
        return first_name.to_string();
    }
    username.to_string()
}

pub fn format_greeting(lang: &LanguageIdentifier, name: &str) -> String {
    let mut args = FluentArgs::new();
    args.set("name", name.to_string());
    i18n::t_args(lang, "start-greeting", &args)
}

/// Replies to `/start` with a personal greeting.
pub struct StartHandler {
    deps: HandlerDeps,
}

impl StartHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl UpdateHandler for StartHandler {
    fn name(&self) -> &'static str {
        "start"
    }

    fn accepts(&self, event: &InboundEvent) -> bool {
        matches!(event, InboundEvent::ChatMessage(msg) if msg.command.as_deref() == Some("start"))
    }

    async fn handle(&self, event: InboundEvent) -> AppResult<()> {
        let InboundEvent::ChatMessage(msg) = event else {
            return Ok(());
        };

        let (name, lang) = match &msg.sender {
            Some(sender) => (
                get_display_name(&sender.first_name, sender.username.as_deref().unwrap_or("")),
                i18n::lang_from_locale(sender.language_code.as_deref()),
            ),
            None => (String::new(), i18n::default_lang()),
        };
        log::info!("[START] Greeting user: {}", name);

        if let Some(sender) = &msg.sender {
            self.deps.store.track_command(&sender.profile(), "start");
        }

        self.deps
            .transport
            .send_text(msg.chat_id, &format_greeting(&lang, &name))
            .await?;
        Ok(())
    }
}
