use super::clock::SessionClock;
use super::config::SharedConfig;
use super::events::SessionEvent;
use super::message::Message;
use super::status::{InputMode, SessionStatus};
use crate::provider::ResponseProvider;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, timeout};
use tracing::{info, warn};

/// Timing knobs for a conversation engine
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Cap on a single response-provider call
    pub reply_timeout: Duration,

    /// How long `is_avatar_responding` stays asserted after the reply text
    /// has landed, so a rendering surface can animate a speaking indicator
    pub speaking_hold: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            reply_timeout: Duration::from_secs(30),
            speaking_hold: Duration::from_millis(2500),
        }
    }
}

/// An avatar turn queued for the worker task
///
/// Carries the generation observed when the triggering user message was
/// appended; a mismatch at any later point means the log was cleared or the
/// session ended, and the turn's result must be discarded.
struct TurnRequest {
    generation: u64,
}

/// Turn-taking state machine and message-log authority for one session
///
/// Owns two background tasks for its lifetime: a worker that serializes
/// avatar turns (at most one outstanding; further requests queue) and a 1 s
/// tick that keeps the displayed elapsed time fresh. `shutdown` tears both
/// down exactly once.
pub struct ConversationEngine {
    config: SharedConfig,
    events: mpsc::UnboundedSender<SessionEvent>,

    messages: Arc<Mutex<Vec<Message>>>,
    input_mode: Arc<Mutex<InputMode>>,
    is_recording: Arc<AtomicBool>,
    is_responding: Arc<AtomicBool>,

    clock: Arc<Mutex<SessionClock>>,
    elapsed_secs: Arc<AtomicU64>,

    /// Bumped by clear/end to invalidate in-flight and queued turns
    generation: Arc<AtomicU64>,

    turn_tx: Mutex<Option<mpsc::UnboundedSender<TurnRequest>>>,
    worker_handle: Mutex<Option<JoinHandle<()>>>,
    tick_handle: Mutex<Option<JoinHandle<()>>>,
}

impl ConversationEngine {
    /// Create an engine and start its background tasks
    ///
    /// `config` is read afresh on every operation, so the caller may update
    /// it mid-session. Lifecycle events are delivered on `events`.
    pub fn new(
        config: SharedConfig,
        provider: Arc<dyn ResponseProvider>,
        settings: EngineSettings,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let is_responding = Arc::new(AtomicBool::new(false));
        let generation = Arc::new(AtomicU64::new(0));
        let clock = Arc::new(Mutex::new(SessionClock::start()));
        let elapsed_secs = Arc::new(AtomicU64::new(0));

        let (turn_tx, turn_rx) = mpsc::unbounded_channel();

        let worker_handle = tokio::spawn(Self::run_turn_worker(
            turn_rx,
            provider,
            Arc::clone(&messages),
            Arc::clone(&is_responding),
            Arc::clone(&generation),
            events.clone(),
            settings,
        ));

        let tick_handle = tokio::spawn(Self::run_clock_tick(
            Arc::clone(&clock),
            Arc::clone(&elapsed_secs),
        ));

        Self {
            config,
            events,
            messages,
            input_mode: Arc::new(Mutex::new(InputMode::Voice)),
            is_recording: Arc::new(AtomicBool::new(false)),
            is_responding,
            clock,
            elapsed_secs,
            generation,
            turn_tx: Mutex::new(Some(turn_tx)),
            worker_handle: Mutex::new(Some(worker_handle)),
            tick_handle: Mutex::new(Some(tick_handle)),
        }
    }

    /// Switch between voice and text input
    ///
    /// Rejected while recording is active, and `Voice` is rejected when
    /// speech input is disabled in the current configuration.
    pub async fn set_input_mode(&self, mode: InputMode) {
        if self.is_recording.load(Ordering::SeqCst) {
            self.emit(SessionEvent::ModeUnavailable);
            return;
        }

        if mode == InputMode::Voice && !self.config.read().await.speech_input_enabled {
            self.emit(SessionEvent::ModeUnavailable);
            return;
        }

        *self.input_mode.lock().await = mode;
    }

    /// Start or stop voice capture
    ///
    /// Stopping appends one user message with the caller-supplied transcript
    /// (there is no real speech recognizer; the voice-capture collaborator
    /// owns the content) and begins an avatar turn if speech output is on.
    pub async fn toggle_recording(&self, transcript: Option<&str>) {
        let cfg = self.config.read().await.clone();

        // Stopping is always allowed: a recording that managed to start must
        // be able to finish even if speech input was disabled underneath it,
        // or the session would wedge with the recorder stuck on.
        if self.is_recording.load(Ordering::SeqCst) {
            self.is_recording.store(false, Ordering::SeqCst);

            let content = transcript.map(str::trim).unwrap_or("");
            if content.is_empty() {
                // Nothing was captured; the recording still stops.
                self.emit(SessionEvent::EmptyInput);
                return;
            }

            self.append_user_message(content, true).await;

            if cfg.speech_output_enabled {
                self.enqueue_turn().await;
            }
            return;
        }

        let mode = *self.input_mode.lock().await;
        if mode != InputMode::Voice || !cfg.speech_input_enabled {
            self.emit(SessionEvent::RecordingUnavailable);
            return;
        }

        self.is_recording.store(true, Ordering::SeqCst);
        info!("Recording started");
        self.emit(SessionEvent::RecordingStarted);
    }

    /// Submit a typed message
    ///
    /// Only valid in text mode; blank input is rejected without a state
    /// change. An avatar turn begins only when speech output is enabled --
    /// typed replies are gated by the same flag as spoken ones.
    pub async fn submit_text(&self, text: &str) {
        let cfg = self.config.read().await.clone();

        if *self.input_mode.lock().await != InputMode::Text {
            self.emit(SessionEvent::ModeUnavailable);
            return;
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            self.emit(SessionEvent::EmptyInput);
            return;
        }

        self.append_user_message(trimmed, false).await;

        if cfg.speech_output_enabled {
            self.enqueue_turn().await;
        }
    }

    /// Empty the message log, leaving mode, recording state, and the clock
    /// untouched; any in-flight avatar turn result is discarded
    pub async fn clear_history(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.messages.lock().await.clear();
        info!("Conversation history cleared");
        self.emit(SessionEvent::HistoryCleared);
    }

    /// Hand a snapshot of the log to the external persistence collaborator
    pub async fn request_save(&self) {
        let snapshot = self.messages.lock().await.clone();
        self.emit(SessionEvent::SaveRequested { messages: snapshot });
    }

    /// Auto-save, then reset all session state to initial values with a
    /// fresh start instant; cancels any in-flight turn and speaking hold
    pub async fn end_session(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);

        let snapshot = {
            let mut messages = self.messages.lock().await;
            std::mem::take(&mut *messages)
        };

        self.is_recording.store(false, Ordering::SeqCst);
        self.is_responding.store(false, Ordering::SeqCst);
        *self.input_mode.lock().await = InputMode::Voice;
        self.clock.lock().await.reset();
        self.elapsed_secs.store(0, Ordering::SeqCst);

        info!("Session ended with {} message(s) auto-saved", snapshot.len());
        self.emit(SessionEvent::SaveRequested { messages: snapshot });
        self.emit(SessionEvent::SessionEnded);
    }

    /// Stop the background tasks; further avatar turns are never started
    pub async fn shutdown(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);

        // Closing the channel lets the worker drain and exit.
        self.turn_tx.lock().await.take();

        if let Some(handle) = self.tick_handle.lock().await.take() {
            handle.abort();
        }

        if let Some(handle) = self.worker_handle.lock().await.take() {
            handle.abort();
            info!("Session engine shut down");
        }
    }

    /// Snapshot of the current session state
    pub async fn status(&self) -> SessionStatus {
        let cfg = self.config.read().await;
        let elapsed = self.elapsed_secs.load(Ordering::SeqCst);

        SessionStatus {
            message_count: self.messages.lock().await.len(),
            input_mode: *self.input_mode.lock().await,
            is_recording: self.is_recording.load(Ordering::SeqCst),
            is_avatar_responding: self.is_responding.load(Ordering::SeqCst),
            started_at: self.clock.lock().await.started_at(),
            elapsed_seconds: elapsed,
            elapsed_display: SessionClock::format(elapsed),
            display_name: cfg.display_name.clone(),
            avatar_media_ref: cfg.avatar_media_ref.clone(),
        }
    }

    /// Copy of the full ordered message log
    pub async fn messages(&self) -> Vec<Message> {
        self.messages.lock().await.clone()
    }

    /// Whole seconds since the session started, recomputed now
    pub async fn elapsed_now(&self) -> u64 {
        self.clock.lock().await.elapsed(Utc::now())
    }

    pub async fn input_mode(&self) -> InputMode {
        *self.input_mode.lock().await
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording.load(Ordering::SeqCst)
    }

    pub fn is_avatar_responding(&self) -> bool {
        self.is_responding.load(Ordering::SeqCst)
    }

    async fn append_user_message(&self, content: &str, voice_origin: bool) {
        let message = Message::user(content, voice_origin);
        self.messages.lock().await.push(message);
    }

    async fn enqueue_turn(&self) {
        let generation = self.generation.load(Ordering::SeqCst);
        if let Some(tx) = self.turn_tx.lock().await.as_ref() {
            if tx.send(TurnRequest { generation }).is_err() {
                warn!("Turn worker is gone; avatar reply skipped");
            }
        }
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            warn!("Event sink closed; dropping session event");
        }
    }

    /// Serializes avatar turns: one outstanding at a time, FIFO for the rest
    async fn run_turn_worker(
        mut turn_rx: mpsc::UnboundedReceiver<TurnRequest>,
        provider: Arc<dyn ResponseProvider>,
        messages: Arc<Mutex<Vec<Message>>>,
        is_responding: Arc<AtomicBool>,
        generation: Arc<AtomicU64>,
        events: mpsc::UnboundedSender<SessionEvent>,
        settings: EngineSettings,
    ) {
        info!("Avatar turn worker started");

        while let Some(request) = turn_rx.recv().await {
            // Stale request: the log was cleared or the session ended after
            // this turn was queued.
            if generation.load(Ordering::SeqCst) != request.generation {
                continue;
            }

            is_responding.store(true, Ordering::SeqCst);

            let context = { messages.lock().await.clone() };
            let reply = timeout(settings.reply_timeout, provider.generate_reply(&context)).await;

            match reply {
                Ok(Ok(content)) => {
                    if generation.load(Ordering::SeqCst) != request.generation {
                        is_responding.store(false, Ordering::SeqCst);
                        info!("Discarding avatar reply for a reset conversation");
                        continue;
                    }

                    messages.lock().await.push(Message::avatar(content));

                    // Keep the speaking indicator up after the text lands.
                    // The worker is serial, so no other turn can be mid-flight;
                    // clear unconditionally even if the log was reset meanwhile.
                    sleep(settings.speaking_hold).await;
                    is_responding.store(false, Ordering::SeqCst);
                }
                Ok(Err(e)) => {
                    is_responding.store(false, Ordering::SeqCst);
                    if generation.load(Ordering::SeqCst) == request.generation {
                        warn!("Avatar turn failed: {:#}", e);
                        events
                            .send(SessionEvent::AvatarTurnFailed {
                                reason: e.to_string(),
                            })
                            .ok();
                    }
                }
                Err(_) => {
                    is_responding.store(false, Ordering::SeqCst);
                    if generation.load(Ordering::SeqCst) == request.generation {
                        warn!(
                            "Avatar turn timed out after {:?}",
                            settings.reply_timeout
                        );
                        events
                            .send(SessionEvent::AvatarTurnFailed {
                                reason: "response provider timed out".to_string(),
                            })
                            .ok();
                    }
                }
            }
        }

        info!("Avatar turn worker stopped");
    }

    /// 1 s tick keeping the displayed elapsed time fresh
    async fn run_clock_tick(clock: Arc<Mutex<SessionClock>>, elapsed_secs: Arc<AtomicU64>) {
        let mut tick = interval(Duration::from_secs(1));

        loop {
            tick.tick().await;
            let elapsed = clock.lock().await.elapsed(Utc::now());
            elapsed_secs.store(elapsed, Ordering::SeqCst);
        }
    }
}
