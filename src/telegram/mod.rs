//! Telegram bot integration and handlers

pub mod bot;
pub mod dispatcher;
pub mod event;
pub mod handlers;
pub mod notifications;
pub mod transport;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands};
pub use dispatcher::Dispatcher;
pub use event::{CallbackAction, ChatMessage, InboundEvent, Sender};
pub use handlers::{default_handlers, HandlerDeps, UpdateHandler};
pub use notifications::notify_admin_startup;
pub use transport::{Choice, MediaUpload, Presence, TeloxideTransport, Transport};
pub use teloxide::Bot;
