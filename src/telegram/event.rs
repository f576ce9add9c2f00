//! Inbound events, decoupled from the raw Telegram update types.

use teloxide::types::{CallbackQuery, CallbackQueryId, ChatId, Message, MessageId, Update, UpdateKind, User};

use crate::storage::UserProfile;

/// Identity of whoever triggered an event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sender {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
}

impl Sender {
    /// Profile fields persisted on every interaction.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            telegram_user_id: self.id,
            username: self.username.clone(),
            first_name: Some(self.first_name.clone()).filter(|n| !n.is_empty()),
            last_name: self.last_name.clone(),
            language_code: self.language_code.clone(),
        }
    }
}

impl From<&User> for Sender {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.0 as i64,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            language_code: user.language_code.clone(),
        }
    }
}

/// A text message posted in a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Absent for channel posts and anonymous admins
    pub sender: Option<Sender>,
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub text: String,
    /// "start" for "/start" or "/start@SomeBot"
    pub command: Option<String>,
}

/// A press on an inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackAction {
    pub id: CallbackQueryId,
    pub sender: Sender,
    /// Chat and id of the message carrying the keyboard
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    ChatMessage(ChatMessage),
    CallbackAction(CallbackAction),
}

impl InboundEvent {
    /// Converts a Telegram update; `None` for anything without text or callback data.
    pub fn from_update(update: &Update) -> Option<Self> {
        match &update.kind {
            UpdateKind::Message(msg) => Self::from_message(msg),
            UpdateKind::CallbackQuery(query) => Self::from_callback_query(query),
            _ => None,
        }
    }

    pub fn from_message(msg: &Message) -> Option<Self> {
        let text = msg.text()?;
        Some(InboundEvent::ChatMessage(ChatMessage {
            sender: msg.from.as_ref().map(Sender::from),
            chat_id: msg.chat.id,
            message_id: msg.id,
            text: text.to_string(),
            command: parse_command(text),
        }))
    }

    /// Queries whose keyboard message is gone (or inline-mode queries) are dropped.
    pub fn from_callback_query(query: &CallbackQuery) -> Option<Self> {
        let payload = query.data.clone()?;
        let message = query.message.as_ref()?;
        Some(InboundEvent::CallbackAction(CallbackAction {
            id: query.id.clone(),
            sender: Sender::from(&query.from),
            chat_id: message.chat().id,
            message_id: message.id(),
            payload,
        }))
    }

    pub fn chat_id(&self) -> ChatId {
        match self {
            InboundEvent::ChatMessage(m) => m.chat_id,
            InboundEvent::CallbackAction(c) => c.chat_id,
        }
    }

    /// Short description for logs
    pub fn summary(&self) -> String {
        match self {
            InboundEvent::ChatMessage(m) => format!(
                "message from {} in chat {}: {}",
                m.sender.as_ref().map_or("<unknown>".to_string(), |s| s.id.to_string()),
                m.chat_id,
                m.text
            ),
            InboundEvent::CallbackAction(c) => {
                format!("callback from {} in chat {}: {}", c.sender.id, c.chat_id, c.payload)
            }
        }
    }
}

/// Extracts the lowercase command name from "/name", "/name@Bot args".
pub fn parse_command(text: &str) -> Option<String> {
    let first = text.trim_start().split_whitespace().next()?;
    let name = first.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some(name.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("/start"), Some("start".to_string()));
        assert_eq!(parse_command("/Start@TubeDropBot hello"), Some("start".to_string()));
        assert_eq!(parse_command("  /stats"), Some("stats".to_string()));
        assert_eq!(parse_command("start"), None);
        assert_eq!(parse_command("/"), None);
        assert_eq!(parse_command("/ start"), None);
        assert_eq!(parse_command("https://youtu.be/dQw4w9WgXcQ"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn test_sender_profile_drops_empty_first_name() {
        let sender = Sender {
            id: 42,
            username: Some("jdoe".to_string()),
            ..Sender::default()
        };
        let profile = sender.profile();
        assert_eq!(profile.telegram_user_id, 42);
        assert_eq!(profile.first_name, None);
        assert_eq!(profile.username.as_deref(), Some("jdoe"));
    }

    #[test]
    fn test_summary_mentions_payload() {
        let event = InboundEvent::CallbackAction(CallbackAction {
            id: CallbackQueryId("cb".to_string()),
            sender: Sender {
                id: 7,
                ..Sender::default()
            },
            chat_id: ChatId(100),
            message_id: MessageId(5),
            payload: "yt:abc:720p".to_string(),
        });
        assert!(event.summary().contains("yt:abc:720p"));
        assert_eq!(event.chat_id(), ChatId(100));
    }
}
