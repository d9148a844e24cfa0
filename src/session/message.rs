use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message in the conversation log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Avatar,
}

/// A single entry in the conversation log
///
/// Messages are immutable once appended; the log only shrinks through an
/// explicit clear or session end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique within a session
    pub id: Uuid,

    /// User or avatar
    pub role: Role,

    /// Message text
    pub content: String,

    /// When the message was appended
    pub created_at: DateTime<Utc>,

    /// True only for user messages produced through the recording path
    pub voice_origin: bool,
}

impl Message {
    /// Create a user message, marking whether it came from voice capture
    pub fn user(content: impl Into<String>, voice_origin: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.into(),
            created_at: Utc::now(),
            voice_origin,
        }
    }

    /// Create an avatar reply message
    pub fn avatar(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Avatar,
            content: content.into(),
            created_at: Utc::now(),
            voice_origin: false,
        }
    }
}
