use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Remediation steps surfaced when the entry gate rejects session creation
/// because no credential is configured.
pub const CREDENTIAL_SETUP_STEPS: [&str; 3] = [
    "Log in to your integration account and open Settings -> Integrations -> API Key",
    "Create or copy your private app token",
    "Paste it into the avatar configuration",
];

/// Avatar configuration supplied by the caller
///
/// The engine only ever reads this; the configuration surface may update it
/// between operations and the engine re-reads the current value on each one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    /// Free-text system prompt defining the avatar's behavior; may be empty
    pub system_prompt: String,

    /// Opaque integration secret; "present" means non-empty after trim
    pub credential: String,

    /// Whether voice input (recording) is available
    pub speech_input_enabled: bool,

    /// Whether spoken replies are enabled; also gates replies to typed text
    pub speech_output_enabled: bool,

    /// Opaque locator for the avatar rendering surface; may be empty
    pub avatar_media_ref: String,

    /// Name shown next to the avatar; may be empty
    pub display_name: String,
}

impl AvatarConfig {
    /// Entry gate: a session may only be created with a credential present.
    ///
    /// Checked once at session creation; engine operations never re-check it.
    pub fn can_start_session(&self) -> bool {
        !self.credential.trim().is_empty()
    }
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            system_prompt: String::new(),
            credential: String::new(),
            speech_input_enabled: true,
            speech_output_enabled: true,
            avatar_media_ref: String::new(),
            display_name: String::new(),
        }
    }
}

/// Caller-owned configuration handle shared with a running engine
pub type SharedConfig = Arc<RwLock<AvatarConfig>>;

/// Wrap a configuration for sharing between the caller and an engine
pub fn shared(config: AvatarConfig) -> SharedConfig {
    Arc::new(RwLock::new(config))
}

/// Partial configuration update; unset fields keep their current value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigUpdate {
    pub system_prompt: Option<String>,
    pub credential: Option<String>,
    pub speech_input_enabled: Option<bool>,
    pub speech_output_enabled: Option<bool>,
    pub avatar_media_ref: Option<String>,
    pub display_name: Option<String>,
}

impl ConfigUpdate {
    /// Merge set fields into an existing configuration
    pub fn apply(self, config: &mut AvatarConfig) {
        if let Some(v) = self.system_prompt {
            config.system_prompt = v;
        }
        if let Some(v) = self.credential {
            config.credential = v;
        }
        if let Some(v) = self.speech_input_enabled {
            config.speech_input_enabled = v;
        }
        if let Some(v) = self.speech_output_enabled {
            config.speech_output_enabled = v;
        }
        if let Some(v) = self.avatar_media_ref {
            config.avatar_media_ref = v;
        }
        if let Some(v) = self.display_name {
            config.display_name = v;
        }
    }
}
