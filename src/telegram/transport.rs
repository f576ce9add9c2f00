//! Outbound actions towards the chat.
//!
//! Handlers only see the [`Transport`] trait; [`TeloxideTransport`] is the
//! Bot API implementation and tests substitute a recording one.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQueryId, ChatAction, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId, ParseMode,
};

use crate::core::error::AppResult;

/// One inline button: visible label and callback payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub payload: String,
}

/// Presence indicator shown in the chat header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Typing,
    UploadVideo,
    UploadDocument,
}

impl From<Presence> for ChatAction {
    fn from(presence: Presence) -> Self {
        match presence {
            Presence::Typing => ChatAction::Typing,
            Presence::UploadVideo => ChatAction::UploadVideo,
            Presence::UploadDocument => ChatAction::UploadDocument,
        }
    }
}

/// A local file to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUpload {
    pub path: PathBuf,
    pub caption: String,
    /// Document (true) or playable video (false)
    pub as_document: bool,
    pub duration_secs: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> AppResult<MessageId>;

    /// Sends text with HTML formatting.
    async fn send_html(&self, chat_id: ChatId, html: &str) -> AppResult<MessageId>;

    /// Sends text with one inline button per row.
    async fn send_choices(&self, chat_id: ChatId, text: &str, choices: &[Choice]) -> AppResult<MessageId>;

    async fn send_media(&self, chat_id: ChatId, upload: &MediaUpload) -> AppResult<()>;

    async fn edit_text(&self, chat_id: ChatId, message_id: MessageId, text: &str) -> AppResult<()>;

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> AppResult<()>;

    /// Acknowledges a button press with a transient notice.
    async fn answer_callback(&self, callback_id: &CallbackQueryId, notice: &str) -> AppResult<()>;

    async fn send_presence(&self, chat_id: ChatId, presence: Presence) -> AppResult<()>;
}

/// Bot API transport backed by teloxide.
#[derive(Clone)]
pub struct TeloxideTransport {
    bot: Bot,
}

impl TeloxideTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn keyboard(choices: &[Choice]) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = choices
        .iter()
        .map(|c| vec![InlineKeyboardButton::callback(c.label.clone(), c.payload.clone())])
        .collect();
    InlineKeyboardMarkup::new(rows)
}

fn input_file(path: &Path) -> InputFile {
    InputFile::file(path.to_path_buf())
}

#[async_trait]
impl Transport for TeloxideTransport {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> AppResult<MessageId> {
        let msg = self.bot.send_message(chat_id, text).await?;
        Ok(msg.id)
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> AppResult<MessageId> {
        let msg = self.bot.send_message(chat_id, html).parse_mode(ParseMode::Html).await?;
        Ok(msg.id)
    }

    async fn send_choices(&self, chat_id: ChatId, text: &str, choices: &[Choice]) -> AppResult<MessageId> {
        let msg = self
            .bot
            .send_message(chat_id, text)
            .reply_markup(keyboard(choices))
            .await?;
        Ok(msg.id)
    }

    async fn send_media(&self, chat_id: ChatId, upload: &MediaUpload) -> AppResult<()> {
        if upload.as_document {
            self.bot
                .send_document(chat_id, input_file(&upload.path))
                .caption(upload.caption.clone())
                .await?;
            return Ok(());
        }

        let mut video_msg = self
            .bot
            .send_video(chat_id, input_file(&upload.path))
            .caption(upload.caption.clone())
            .supports_streaming(true);
        // Metadata for correct Telegram playback
        if let Some(duration) = upload.duration_secs.filter(|d| *d > 0) {
            video_msg = video_msg.duration(duration);
        }
        if let Some(w) = upload.width {
            video_msg = video_msg.width(w);
        }
        if let Some(h) = upload.height {
            video_msg = video_msg.height(h);
        }
        video_msg.await?;
        Ok(())
    }

    async fn edit_text(&self, chat_id: ChatId, message_id: MessageId, text: &str) -> AppResult<()> {
        self.bot.edit_message_text(chat_id, message_id, text).await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> AppResult<()> {
        self.bot.delete_message(chat_id, message_id).await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &CallbackQueryId, notice: &str) -> AppResult<()> {
        self.bot.answer_callback_query(callback_id.clone()).text(notice).await?;
        Ok(())
    }

    async fn send_presence(&self, chat_id: ChatId, presence: Presence) -> AppResult<()> {
        self.bot.send_chat_action(chat_id, presence.into()).await?;
        Ok(())
    }
}
