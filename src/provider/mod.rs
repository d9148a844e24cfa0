//! Conversational backend abstractions
//!
//! The engine never talks to a real service directly; it calls a
//! `ResponseProvider` to obtain avatar replies and (outside the engine) a
//! `PromptEnhancer` to improve system prompts. Canned implementations
//! simulate latency and content so the rest of the system can be exercised
//! without a network backend.

mod canned;
mod enhance;

use crate::session::Message;
use anyhow::Result;

pub use canned::CannedResponder;
pub use enhance::{CannedEnhancer, PromptEnhancer};

/// The turn-taking partner behind an avatar session
///
/// Implementations may return immediately, suspend for network latency, or
/// fail; the engine behaves identically in each case.
#[async_trait::async_trait]
pub trait ResponseProvider: Send + Sync {
    /// Produce a reply given the full ordered conversation so far
    async fn generate_reply(&self, context: &[Message]) -> Result<String>;
}
