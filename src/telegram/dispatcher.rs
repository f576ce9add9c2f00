//! Routes inbound events to handlers and runs the long-polling receive loop.
//!
//! Each accepted event is handled on its own task, so a slow download never
//! blocks other chats. Handlers are tried in registration order and the
//! first one that accepts the event wins.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::AllowedUpdate;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::core::config::{network, retry};
use crate::telegram::event::InboundEvent;
use crate::telegram::handlers::UpdateHandler;

#[derive(Default)]
pub struct Dispatcher {
    handlers: Vec<Arc<dyn UpdateHandler>>,
}

impl Dispatcher {
    pub fn new(handlers: Vec<Arc<dyn UpdateHandler>>) -> Self {
        Self { handlers }
    }

    pub fn register(&mut self, handler: Arc<dyn UpdateHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// Spawns the first accepting handler; `None` when nothing accepts the event.
    pub fn dispatch(&self, event: InboundEvent) -> Option<JoinHandle<()>> {
        let Some(handler) = self.handlers.iter().find(|h| h.accepts(&event)) else {
            log::debug!("[DISPATCH] No handler for {}", event.summary());
            return None;
        };

        let handler = Arc::clone(handler);
        log::debug!("[DISPATCH] {} -> {}", event.summary(), handler.name());
        Some(tokio::spawn(async move {
            let chat_id = event.chat_id();
            if let Err(e) = handler.handle(event).await {
                log::error!("[DISPATCH] Handler '{}' failed in chat {}: {}", handler.name(), chat_id, e);
            }
        }))
    }

    /// Long-polls Telegram until Ctrl-C.
    ///
    /// A failed poll is logged and retried after a fixed delay.
    pub async fn run(&self, bot: Bot) {
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        let mut offset: i32 = 0;
        log::info!("📡 Ready to receive updates!");

        loop {
            let request = bot
                .get_updates()
                .offset(offset)
                .timeout(network::LONG_POLL_TIMEOUT_SECS)
                .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery]);

            let polled = tokio::select! {
                _ = &mut shutdown => {
                    log::info!("Shutting down gracefully...");
                    break;
                }
                polled = request.send() => polled,
            };

            match polled {
                Ok(updates) => {
                    for update in updates {
                        offset = update.id.as_offset();
                        match InboundEvent::from_update(&update) {
                            Some(event) => {
                                self.dispatch(event);
                            }
                            None => log::debug!("[DISPATCH] Dropping update {:?} without text or callback data", update.id),
                        }
                    }
                }
                Err(e) => {
                    log::error!("[DISPATCH] Failed to fetch updates: {}", e);
                    sleep(retry::poll_delay()).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AppResult;
    use crate::telegram::event::ChatMessage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use teloxide::types::MessageId;

    struct Keyword {
        word: &'static str,
        hits: AtomicUsize,
    }

    #[async_trait]
    impl UpdateHandler for Keyword {
        fn name(&self) -> &'static str {
            self.word
        }

        fn accepts(&self, event: &InboundEvent) -> bool {
            matches!(event, InboundEvent::ChatMessage(m) if m.text.contains(self.word))
        }

        async fn handle(&self, _event: InboundEvent) -> AppResult<()> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn keyword(word: &'static str) -> Arc<Keyword> {
        Arc::new(Keyword {
            word,
            hits: AtomicUsize::new(0),
        })
    }

    fn message(text: &str) -> InboundEvent {
        InboundEvent::ChatMessage(ChatMessage {
            sender: None,
            chat_id: ChatId(1),
            message_id: MessageId(1),
            text: text.to_string(),
            command: None,
        })
    }

    #[tokio::test]
    async fn test_first_accepting_handler_wins() {
        let first = keyword("a");
        let second = keyword("ab");
        let handlers: Vec<Arc<dyn UpdateHandler>> = vec![first.clone(), second.clone()];
        let dispatcher = Dispatcher::new(handlers);

        dispatcher.dispatch(message("ab")).unwrap().await.unwrap();

        assert_eq!(first.hits.load(Ordering::SeqCst), 1);
        assert_eq!(second.hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unmatched_event_is_dropped() {
        let mut dispatcher = Dispatcher::default();
        dispatcher.register(keyword("x"));
        assert!(dispatcher.dispatch(message("nothing here")).is_none());
        assert_eq!(dispatcher.handler_names(), vec!["x"]);
    }
}
