//! Capability handlers
//!
//! Each handler decides whether it applies to an event and then performs the
//! resulting action. The set is fixed at build time; [`default_handlers`]
//! returns it in dispatch priority order.

mod start;
mod stats;
mod video;

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::config::DeliveryLimits;
use crate::core::error::AppResult;
use crate::download::VideoSource;
use crate::storage::UsageStore;
use crate::telegram::event::InboundEvent;
use crate::telegram::transport::Transport;

pub use start::{format_greeting, get_display_name, StartHandler};
pub use stats::{format_summary, StatsHandler};
pub use video::{
    build_caption, encode_callback_payload, extract_video_id, parse_callback_payload, CallbackPayload,
    MalformedCallback, VideoHandler,
};

#[async_trait]
pub trait UpdateHandler: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Cheap, side-effect free check run by the dispatcher.
    fn accepts(&self, event: &InboundEvent) -> bool;

    /// Handles an accepted event. User-facing failures are reported in the
    /// chat by the handler itself; an `Err` means even that was impossible.
    async fn handle(&self, event: InboundEvent) -> AppResult<()>;
}

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub transport: Arc<dyn Transport>,
    pub store: UsageStore,
    pub source: Arc<dyn VideoSource>,
    pub limits: DeliveryLimits,
    pub send_as_document: bool,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(
        transport: Arc<dyn Transport>,
        store: UsageStore,
        source: Arc<dyn VideoSource>,
        limits: DeliveryLimits,
        send_as_document: bool,
    ) -> Self {
        Self {
            transport,
            store,
            source,
            limits,
            send_as_document,
        }
    }
}

/// Greeting, statistics and video handlers, in that order.
pub fn default_handlers(deps: &HandlerDeps) -> Vec<Arc<dyn UpdateHandler>> {
    vec![
        Arc::new(StartHandler::new(deps.clone())),
        Arc::new(StatsHandler::new(deps.clone())),
        Arc::new(VideoHandler::new(deps.clone())),
    ]
}
