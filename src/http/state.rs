use crate::config::SessionDefaults;
use crate::provider::{CannedEnhancer, CannedResponder, PromptEnhancer, ResponseProvider};
use crate::session::{shared, AvatarConfig, ConversationEngine, SessionEvent, SharedConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};

/// A running session plus the plumbing the HTTP layer needs around it
pub struct ActiveSession {
    pub engine: Arc<ConversationEngine>,

    /// Caller-side handle to the session's configuration
    pub config: SharedConfig,

    /// Events collected off the engine's sink, drained by the events route
    pub events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl ActiveSession {
    /// Build an engine for `config` and start collecting its events
    pub fn start(
        config: AvatarConfig,
        provider: Arc<dyn ResponseProvider>,
        defaults: &SessionDefaults,
    ) -> Self {
        let config = shared(config);
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        let engine = Arc::new(ConversationEngine::new(
            Arc::clone(&config),
            provider,
            defaults.engine_settings(),
            event_tx,
        ));

        let events = Arc::new(Mutex::new(Vec::new()));
        let collected = Arc::clone(&events);

        // Ends when the engine (the only sender) is dropped.
        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                collected.lock().await.push(event);
            }
        });

        Self {
            engine,
            config,
            events,
        }
    }
}

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Active conversation sessions (session_id -> session)
    pub sessions: Arc<RwLock<HashMap<String, Arc<ActiveSession>>>>,

    /// Engine timing defaults from service configuration
    pub defaults: SessionDefaults,

    /// Conversational backend handed to every new engine
    pub provider: Arc<dyn ResponseProvider>,

    /// Prompt-improvement collaborator
    pub enhancer: Arc<dyn PromptEnhancer>,
}

impl AppState {
    pub fn new(defaults: SessionDefaults) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            defaults,
            provider: Arc::new(CannedResponder::default()),
            enhancer: Arc::new(CannedEnhancer::default()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(SessionDefaults::default())
    }
}
