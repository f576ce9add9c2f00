//! Common test utilities
//!
//! This module is shared across all integration tests

pub mod fixtures;
pub mod source;
pub mod transport;

#[allow(unused_imports)]
pub use fixtures::{callback, deps, link_message, sender, temp_store, text_message, TestEnvironment};
#[allow(unused_imports)]
pub use source::{FetchScript, ScriptedSource};
#[allow(unused_imports)]
pub use transport::{Call, RecordingTransport};
