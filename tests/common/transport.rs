//! Transport that records every outbound action instead of calling Telegram

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use teloxide::types::{CallbackQueryId, ChatId, MessageId};

use tubedrop::core::error::{AppError, AppResult};
use tubedrop::telegram::{Choice, MediaUpload, Presence, Transport};

/// One recorded outbound action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Text { chat_id: ChatId, text: String },
    Html { chat_id: ChatId, html: String },
    Choices { chat_id: ChatId, text: String, choices: Vec<Choice> },
    /// `file_present` is whether the file existed when the upload started
    Media { chat_id: ChatId, upload: MediaUpload, file_present: bool },
    Edit { chat_id: ChatId, message_id: MessageId, text: String },
    Delete { chat_id: ChatId, message_id: MessageId },
    Answer { callback_id: CallbackQueryId, notice: String },
    Presence { chat_id: ChatId, presence: Presence },
}

#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<Call>>,
    next_message_id: AtomicI32,
    fail_media: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            next_message_id: AtomicI32::new(1000),
            ..Self::default()
        }
    }

    /// Makes every `send_media` fail from now on.
    pub fn fail_media(&self) {
        self.fail_media.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Edit { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn media(&self) -> Vec<(MediaUpload, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Media { upload, file_present, .. } => Some((upload, file_present)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_id(&self) -> MessageId {
        MessageId(self.next_message_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> AppResult<MessageId> {
        self.record(Call::Text {
            chat_id,
            text: text.to_string(),
        });
        Ok(self.next_id())
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> AppResult<MessageId> {
        self.record(Call::Html {
            chat_id,
            html: html.to_string(),
        });
        Ok(self.next_id())
    }

    async fn send_choices(&self, chat_id: ChatId, text: &str, choices: &[Choice]) -> AppResult<MessageId> {
        self.record(Call::Choices {
            chat_id,
            text: text.to_string(),
            choices: choices.to_vec(),
        });
        Ok(self.next_id())
    }

    async fn send_media(&self, chat_id: ChatId, upload: &MediaUpload) -> AppResult<()> {
        self.record(Call::Media {
            chat_id,
            upload: upload.clone(),
            file_present: upload.path.exists(),
        });
        if self.fail_media.load(Ordering::SeqCst) {
            return Err(AppError::Io(std::io::Error::other("upload rejected")));
        }
        Ok(())
    }

    async fn edit_text(&self, chat_id: ChatId, message_id: MessageId, text: &str) -> AppResult<()> {
        self.record(Call::Edit {
            chat_id,
            message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> AppResult<()> {
        self.record(Call::Delete { chat_id, message_id });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &CallbackQueryId, notice: &str) -> AppResult<()> {
        self.record(Call::Answer {
            callback_id: callback_id.clone(),
            notice: notice.to_string(),
        });
        Ok(())
    }

    async fn send_presence(&self, chat_id: ChatId, presence: Presence) -> AppResult<()> {
        self.record(Call::Presence { chat_id, presence });
        Ok(())
    }
}
