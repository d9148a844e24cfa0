pub mod config;
pub mod http;
pub mod provider;
pub mod session;

pub use config::{Config, SessionDefaults};
pub use http::{create_router, ActiveSession, AppState};
pub use provider::{CannedEnhancer, CannedResponder, PromptEnhancer, ResponseProvider};
pub use session::{
    shared, AvatarConfig, ConfigUpdate, ConversationEngine, EngineSettings, InputMode, Message,
    Role, SessionClock, SessionEvent, SessionStatus, SharedConfig, CREDENTIAL_SETUP_STEPS,
};
