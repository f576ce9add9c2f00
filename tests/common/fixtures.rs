//! Test fixtures: temporary database, events and a wired handler environment

#![allow(dead_code)]

use std::sync::Arc;

use teloxide::types::{CallbackQueryId, ChatId, MessageId};
use tempfile::TempDir;

use tubedrop::core::config::{DeliveryLimits, MB};
use tubedrop::storage::{create_pool, UsageStore};
use tubedrop::telegram::event::parse_command;
use tubedrop::telegram::{default_handlers, CallbackAction, ChatMessage, Dispatcher, HandlerDeps, InboundEvent, Sender};

use super::source::{option, FetchScript, ScriptedSource};
use super::transport::RecordingTransport;

pub const CHAT: ChatId = ChatId(555);
pub const USER_MESSAGE: MessageId = MessageId(10);
pub const KEYBOARD_MESSAGE: MessageId = MessageId(11);

pub fn temp_store() -> (TempDir, UsageStore) {
    let dir = tempfile::tempdir().unwrap();
    let pool = create_pool(dir.path().join("test.db").to_str().unwrap()).unwrap();
    (dir, UsageStore::new(Arc::new(pool)))
}

pub fn sender(id: i64) -> Sender {
    Sender {
        id,
        username: Some(format!("user{}", id)),
        first_name: "Alice".to_string(),
        last_name: None,
        language_code: Some("ru".to_string()),
    }
}

pub fn text_message(user_id: i64, text: &str) -> InboundEvent {
    InboundEvent::ChatMessage(ChatMessage {
        sender: Some(sender(user_id)),
        chat_id: CHAT,
        message_id: USER_MESSAGE,
        text: text.to_string(),
        command: parse_command(text),
    })
}

pub fn link_message(user_id: i64, video_id: &str) -> InboundEvent {
    text_message(user_id, &format!("https://youtu.be/{}", video_id))
}

pub fn callback(user_id: i64, payload: &str) -> InboundEvent {
    InboundEvent::CallbackAction(CallbackAction {
        id: CallbackQueryId(format!("cb-{}", user_id)),
        sender: sender(user_id),
        chat_id: CHAT,
        message_id: KEYBOARD_MESSAGE,
        payload: payload.to_string(),
    })
}

pub fn limits() -> DeliveryLimits {
    DeliveryLimits {
        soft_ceiling_bytes: 50 * MB,
        hard_ceiling_bytes: 2000 * MB,
        transcode_enabled: true,
    }
}

pub fn deps(transport: Arc<RecordingTransport>, store: UsageStore, source: Arc<ScriptedSource>) -> HandlerDeps {
    HandlerDeps::new(transport, store, source, limits(), false)
}

/// Everything a handler flow touches, backed by temp directories.
pub struct TestEnvironment {
    _db_dir: TempDir,
    _media_dir: TempDir,
    pub store: UsageStore,
    pub transport: Arc<RecordingTransport>,
    pub source: Arc<ScriptedSource>,
    pub dispatcher: Dispatcher,
}

impl TestEnvironment {
    pub fn new(fetch: FetchScript) -> Self {
        let media_dir = tempfile::tempdir().unwrap();
        let options = vec![option(360, Some(8 * MB)), option(720, Some(20 * MB))];
        let source = ScriptedSource::new(media_dir.path().to_path_buf(), options, fetch);
        Self::with_source(media_dir, |_| source)
    }

    pub fn with_failing_list() -> Self {
        let media_dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::failing_list(media_dir.path().to_path_buf());
        Self::with_source(media_dir, |_| source)
    }

    fn with_source(media_dir: TempDir, build: impl FnOnce(&TempDir) -> ScriptedSource) -> Self {
        let (db_dir, store) = temp_store();
        let source = Arc::new(build(&media_dir));
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = Dispatcher::new(default_handlers(&deps(transport.clone(), store.clone(), source.clone())));
        Self {
            _db_dir: db_dir,
            _media_dir: media_dir,
            store,
            transport,
            source,
            dispatcher,
        }
    }

    /// Dispatches the event and waits for its handler to finish.
    pub async fn run(&self, event: InboundEvent) -> bool {
        match self.dispatcher.dispatch(event) {
            Some(handle) => {
                handle.await.unwrap();
                true
            }
            None => false,
        }
    }
}
