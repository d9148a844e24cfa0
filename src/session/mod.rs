//! Conversation session management
//!
//! This module provides the `ConversationEngine` abstraction that manages:
//! - The append-only message log and its clear/save/end lifecycle
//! - The voice/text input-mode state machine and recording toggle
//! - Turn-taking against a pluggable response provider
//! - The session clock and elapsed-time display
//! - Lifecycle events for the caller's presentation layer

mod clock;
mod config;
mod engine;
mod events;
mod message;
mod status;

pub use clock::SessionClock;
pub use config::{shared, AvatarConfig, ConfigUpdate, SharedConfig, CREDENTIAL_SETUP_STEPS};
pub use engine::{ConversationEngine, EngineSettings};
pub use events::SessionEvent;
pub use message::{Message, Role};
pub use status::{InputMode, SessionStatus};
