use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the user is currently addressing the avatar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Push-to-talk recording path
    Voice,
    /// Typed text path
    Text,
}

/// Point-in-time snapshot of a conversation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Number of messages in the log
    pub message_count: usize,

    /// Current input mode
    pub input_mode: InputMode,

    /// Whether voice capture is active
    pub is_recording: bool,

    /// True while a reply is pending or being "spoken"
    pub is_avatar_responding: bool,

    /// When the session (or its latest reset) started
    pub started_at: DateTime<Utc>,

    /// Whole seconds since `started_at`, recomputed on a 1 s tick
    pub elapsed_seconds: u64,

    /// `elapsed_seconds` rendered as zero-padded `MM:SS`
    pub elapsed_display: String,

    /// Display identity passed through for a rendering surface
    pub display_name: String,

    /// Media locator passed through for a rendering surface
    pub avatar_media_ref: String,
}
