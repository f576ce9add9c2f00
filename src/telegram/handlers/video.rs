//! Video retrieval: link → quality buttons → fetch → deliver.
//!
//! Phase 1 runs on a chat message containing a video link and ends with a
//! keyboard of quality options. Phase 2 runs on a button press; the transient
//! file it fetches is owned by a [`FetchResult`] and disappears on every exit
//! path, early returns included.

use async_trait::async_trait;
use fluent_templates::fluent_bundle::FluentArgs;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use unic_langid::LanguageIdentifier;

use crate::core::config::{DeliveryLimits, CALLBACK_TAG, CAPTION_DESCRIPTION_CHARS, CAPTION_MAX_CHARS};
use crate::core::error::AppResult;
use crate::core::utils::{format_megabytes, truncate_chars};
use crate::download::ytdlp::video_url;
use crate::download::{DownloadError, FetchResult};
use crate::i18n;
use crate::storage::downloads::NewDownload;
use crate::telegram::event::{CallbackAction, ChatMessage, InboundEvent};
use crate::telegram::handlers::{HandlerDeps, UpdateHandler};
use crate::telegram::transport::{Choice, MediaUpload, Presence};

static VIDEO_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/shorts/)([a-zA-Z0-9_-]{11})")
        .expect("Failed to compile video link regex")
});

/// Extracts the 11-character video id from the first recognised link in `text`.
pub fn extract_video_id(text: &str) -> Option<String> {
    VIDEO_ID_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Callback payload that is not `{tag}:{videoId}:{quality}`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed callback payload '{0}'")]
pub struct MalformedCallback(pub String);

/// Decoded quality-selection payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackPayload {
    pub video_id: String,
    /// Quality label; empty means "smallest with audio"
    pub quality: String,
}

pub fn encode_callback_payload(video_id: &str, quality: &str) -> String {
    format!("{}:{}:{}", CALLBACK_TAG, video_id, quality)
}

/// Parses `{tag}:{videoId}:{quality}`; exactly two separators are accepted.
pub fn parse_callback_payload(payload: &str) -> Result<CallbackPayload, MalformedCallback> {
    let parts: Vec<&str> = payload.split(':').collect();
    match parts.as_slice() {
        [tag, video_id, quality] if *tag == CALLBACK_TAG && !video_id.is_empty() => Ok(CallbackPayload {
            video_id: video_id.to_string(),
            quality: quality.to_string(),
        }),
        _ => Err(MalformedCallback(payload.to_string())),
    }
}

/// Title, then a description excerpt, then the compression note; capped at
/// the Telegram caption limit.
pub fn build_caption(title: &str, description: Option<&str>, compressed_note: Option<&str>) -> String {
    let mut caption = title.trim().to_string();

    if let Some(desc) = description.map(str::trim).filter(|d| !d.is_empty()) {
        let excerpt = if desc.chars().count() > CAPTION_DESCRIPTION_CHARS {
            let head: String = desc.chars().take(CAPTION_DESCRIPTION_CHARS).collect();
            format!("{}...", head)
        } else {
            desc.to_string()
        };
        if !caption.is_empty() {
            caption.push_str("\n\n");
        }
        caption.push_str(&excerpt);
    }

    if let Some(note) = compressed_note {
        if !caption.is_empty() {
            caption.push_str("\n\n");
        }
        caption.push_str(note);
    }

    truncate_chars(&caption, CAPTION_MAX_CHARS)
}

/// Why a fetched file cannot be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SizeRejection {
    OverHardCeiling,
    OverSoftCeiling,
}

fn check_delivery_size(size_bytes: u64, limits: &DeliveryLimits) -> Result<(), SizeRejection> {
    if size_bytes > limits.hard_ceiling_bytes {
        return Err(SizeRejection::OverHardCeiling);
    }
    if size_bytes > limits.soft_ceiling_bytes {
        return Err(SizeRejection::OverSoftCeiling);
    }
    Ok(())
}

fn error_text(lang: &LanguageIdentifier, err: &DownloadError) -> String {
    i18n::t(lang, err.user_message_key())
}

fn quality_args(quality: &str) -> FluentArgs<'static> {
    let mut args = FluentArgs::new();
    args.set("quality", quality.to_string());
    args
}

/// Handles video links and quality-selection callbacks.
pub struct VideoHandler {
    deps: HandlerDeps,
}

impl VideoHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }

    /// Phase 1: list formats and offer them as buttons.
    async fn handle_link(&self, msg: ChatMessage) -> AppResult<()> {
        let Some(video_id) = extract_video_id(&msg.text) else {
            return Ok(());
        };
        let chat_id = msg.chat_id;
        let lang = i18n::lang_from_locale(msg.sender.as_ref().and_then(|s| s.language_code.as_deref()));
        log::info!("[VIDEO] Processing video ID: {} for chat: {}", video_id, chat_id);

        if let Some(sender) = &msg.sender {
            self.deps.store.track_command(&sender.profile(), "youtube");
        }

        if let Err(e) = self.deps.transport.send_presence(chat_id, Presence::Typing).await {
            log::warn!("[VIDEO] Failed to send typing action: {}", e);
        }

        let options = match self.deps.source.list_formats(&video_id).await {
            Ok(options) => options,
            Err(e) => {
                log::error!("[VIDEO] Failed to get formats for {}: {} ({})", video_id, e, e.subcategory());
                self.deps.transport.send_text(chat_id, &error_text(&lang, &e)).await?;
                return Ok(());
            }
        };
        log::info!("[VIDEO] Found {} formats for: {}", options.len(), video_id);

        let choices: Vec<Choice> = options
            .iter()
            .map(|option| Choice {
                label: option.description.clone(),
                payload: encode_callback_payload(&video_id, &option.label),
            })
            .collect();
        self.deps
            .transport
            .send_choices(chat_id, &i18n::t(&lang, "video-choose-quality"), &choices)
            .await?;

        if let Err(e) = self.deps.transport.delete_message(chat_id, msg.message_id).await {
            log::warn!("[VIDEO] Failed to delete user message: {}", e);
        }
        Ok(())
    }

    /// Phase 2: fetch the chosen rendition and deliver it.
    async fn handle_selection(&self, action: CallbackAction) -> AppResult<()> {
        let transport = &self.deps.transport;
        let (chat_id, message_id) = (action.chat_id, action.message_id);
        let lang = i18n::lang_from_locale(action.sender.language_code.as_deref());

        let payload = match parse_callback_payload(&action.payload) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("[VIDEO] {}", e);
                let text = i18n::t(&lang, "video-invalid-callback");
                if let Err(e) = transport.answer_callback(&action.id, &text).await {
                    log::warn!("[VIDEO] Failed to answer callback: {}", e);
                }
                transport.edit_text(chat_id, message_id, &text).await?;
                return Ok(());
            }
        };
        let CallbackPayload { video_id, quality } = payload;
        log::info!("[VIDEO] Callback: downloading {} in '{}' quality", video_id, quality);

        let user = self.deps.store.track_command(&action.sender.profile(), "download");

        let args = quality_args(&quality);
        if let Err(e) = transport
            .answer_callback(&action.id, &i18n::t_args(&lang, "video-downloading-notice", &args))
            .await
        {
            log::warn!("[VIDEO] Failed to answer callback: {}", e);
        }
        if let Err(e) = transport
            .edit_text(chat_id, message_id, &i18n::t_args(&lang, "video-downloading", &args))
            .await
        {
            log::warn!("[VIDEO] Failed to show progress: {}", e);
        }
        if let Err(e) = transport.send_presence(chat_id, Presence::UploadVideo).await {
            log::warn!("[VIDEO] Failed to send upload action: {}", e);
        }

        let fetched = match self.deps.source.fetch(&video_id, &quality).await {
            Ok(fetched) => fetched,
            Err(e) => {
                log::error!("[VIDEO] Download failed for {}: {} ({})", video_id, e, e.subcategory());
                transport.edit_text(chat_id, message_id, &error_text(&lang, &e)).await?;
                return Ok(());
            }
        };
        log::info!(
            "[VIDEO] Video metadata - Title: {}, Size: {:?}x{:?}, Duration: {}s, Compressed: {}, Bytes: {}",
            fetched.metadata.title,
            fetched.metadata.width,
            fetched.metadata.height,
            fetched.metadata.duration_secs,
            fetched.transcoded,
            fetched.size_bytes
        );

        if let Err(rejection) = check_delivery_size(fetched.size_bytes, &self.deps.limits) {
            let text = self.size_rejection_text(&lang, rejection, fetched.size_bytes);
            log::warn!("[VIDEO] Rejecting {}: {:?} ({} bytes)", video_id, rejection, fetched.size_bytes);
            fetched.cleanup();
            transport.edit_text(chat_id, message_id, &text).await?;
            return Ok(());
        }

        let presence = if self.deps.send_as_document {
            Presence::UploadDocument
        } else {
            Presence::UploadVideo
        };
        if let Err(e) = transport.send_presence(chat_id, presence).await {
            log::warn!("[VIDEO] Failed to send upload action: {}", e);
        }

        let upload = self.media_upload(&lang, &fetched);
        if let Err(e) = transport.send_media(chat_id, &upload).await {
            log::error!("[VIDEO] Failed to send video {}: {}", video_id, e);
            fetched.cleanup();
            transport
                .edit_text(chat_id, message_id, &i18n::t(&lang, "video-send-failed"))
                .await?;
            return Ok(());
        }
        log::info!("[VIDEO] Video sent successfully: {}", video_id);

        if let Some(user) = user {
            let record = NewDownload {
                user_id: user.id,
                video_id: video_id.clone(),
                video_url: video_url(&video_id),
                video_title: fetched.metadata.title.clone(),
                quality: quality.clone(),
                compressed: fetched.transcoded,
                file_size_bytes: fetched.size_bytes,
            };
            if let Err(e) = self.deps.store.record_download(&record) {
                log::error!("[DB] Failed to record download of {}: {}", video_id, e);
            }
        }

        fetched.cleanup();

        if let Err(e) = transport.delete_message(chat_id, message_id).await {
            log::warn!("[VIDEO] Failed to delete selection message: {}", e);
        }
        Ok(())
    }

    fn media_upload(&self, lang: &LanguageIdentifier, fetched: &FetchResult) -> MediaUpload {
        let note = fetched.transcoded.then(|| i18n::t(lang, "video-compressed-note"));
        MediaUpload {
            path: fetched.path.clone(),
            caption: build_caption(
                &fetched.metadata.title,
                fetched.metadata.description.as_deref(),
                note.as_deref(),
            ),
            as_document: self.deps.send_as_document,
            duration_secs: Some(fetched.metadata.duration_secs),
            width: fetched.metadata.width,
            height: fetched.metadata.height,
        }
    }

    fn size_rejection_text(&self, lang: &LanguageIdentifier, rejection: SizeRejection, size_bytes: u64) -> String {
        let (key, ceiling) = match rejection {
            SizeRejection::OverHardCeiling => ("video-too-large-hard", self.deps.limits.hard_ceiling_bytes),
            SizeRejection::OverSoftCeiling => ("video-too-large-soft", self.deps.limits.soft_ceiling_bytes),
        };
        let mut args = FluentArgs::new();
        args.set("size", format_megabytes(size_bytes));
        args.set("max", format_megabytes(ceiling));
        i18n::t_args(lang, key, &args)
    }
}

#[async_trait]
impl UpdateHandler for VideoHandler {
    fn name(&self) -> &'static str {
        "video"
    }

    fn accepts(&self, event: &InboundEvent) -> bool {
        match event {
            InboundEvent::ChatMessage(msg) => extract_video_id(&msg.text).is_some(),
            InboundEvent::CallbackAction(action) => action.payload.starts_with(&format!("{}:", CALLBACK_TAG)),
        }
    }

    async fn handle(&self, event: InboundEvent) -> AppResult<()> {
        match event {
            InboundEvent::ChatMessage(msg) => self.handle_link(msg).await,
            InboundEvent::CallbackAction(action) => self.handle_selection(action).await,
        }
    }
}
