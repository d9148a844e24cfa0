use super::message::Message;
use serde::{Deserialize, Serialize};

/// Lifecycle events emitted by the session engine
///
/// Every rejected operation emits exactly one event; nothing fails silently.
/// The caller maps these to notifications, navigation, or storage writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Voice capture started; no message is appended until the toggle stops it
    RecordingStarted,

    /// The requested input mode is disabled or cannot be switched to right now
    ModeUnavailable,

    /// Recording toggled outside voice mode or with speech input disabled
    RecordingUnavailable,

    /// Submitted text (or stop-of-recording transcript) was blank after trim
    EmptyInput,

    /// The response provider failed or timed out; the user message is retained
    AvatarTurnFailed { reason: String },

    /// The conversation log was emptied
    HistoryCleared,

    /// Snapshot of the log for the external persistence collaborator
    SaveRequested { messages: Vec<Message> },

    /// Session state was reset to initial values
    SessionEnded,
}
