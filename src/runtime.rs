//! Runtime for executing sessions
//!
//! Each session gets its own task that owns the step, context and history.
//! Turns arrive over an mpsc channel and are answered on a oneshot, so a
//! session handles exactly one turn at a time while separate sessions run
//! concurrently.

mod executor;
pub mod traits;


pub use executor::SessionRuntime;
pub use traits::*;

use crate::companion::Companion;
use crate::journal::JsonlJournal;
use crate::llm::LlmService;
use crate::state_machine::{Event, Service, SessionContext, SessionStep, WELCOME_MESSAGE};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};

/// Runtime over shared trait objects, used by the server and API tests
pub type SharedRuntime =
    SessionRuntime<Arc<dyn JournalStore>, Arc<dyn LlmClient>, Arc<dyn DocumentExtractor>>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("session {0} is no longer running")]
    SessionClosed(String),
    #[error("event rejected: {0}")]
    Rejected(String),
}

/// Commands accepted by a session task
#[derive(Debug)]
pub enum SessionCommand {
    Event {
        event: Event,
        reply_tx: oneshot::Sender<Result<TurnOutcome, String>>,
    },
    Snapshot {
        reply_tx: oneshot::Sender<SessionSnapshot>,
    },
}

/// Result of a settled turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub message: String,
    pub step: SessionStep,
}

/// Read-only view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub step: SessionStep,
    pub pending_mood: Option<String>,
    pub companion: Companion,
    pub active_service: Option<Service>,
    pub history_len: usize,
}

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Init {
        session: serde_json::Value,
    },
    Message {
        role: &'static str,
        text: String,
    },
    StepChange {
        /// Full step as JSON object (e.g., `{"type":"journal_awaiting_entry","mood":"Sad"}`)
        step: serde_json::Value,
    },
    Error {
        message: String,
    },
}

/// How often the idle sweeper checks for abandoned sessions
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub command_tx: mpsc::Sender<SessionCommand>,
    pub broadcast_tx: broadcast::Sender<SseEvent>,
    last_active: Arc<Mutex<Instant>>,
}

impl SessionHandle {
    fn new(
        command_tx: mpsc::Sender<SessionCommand>,
        broadcast_tx: broadcast::Sender<SseEvent>,
    ) -> Self {
        Self {
            command_tx,
            broadcast_tx,
            last_active: Arc::new(Mutex::new(Instant::now())),
        }
    }

    fn touch(&self) {
        if let Ok(mut last_active) = self.last_active.lock() {
            *last_active = Instant::now();
        }
    }

    fn idle_for(&self) -> Duration {
        self.last_active
            .lock()
            .map(|last_active| last_active.elapsed())
            .unwrap_or_default()
    }
}

/// Manager for all session runtimes
pub struct RuntimeManager {
    journal: Arc<dyn JournalStore>,
    llm_client: Arc<dyn LlmClient>,
    extractor: Arc<dyn DocumentExtractor>,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl RuntimeManager {
    pub fn new(
        journal: Arc<dyn JournalStore>,
        llm_client: Arc<dyn LlmClient>,
        extractor: Arc<dyn DocumentExtractor>,
    ) -> Self {
        Self {
            journal,
            llm_client,
            extractor,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Wire the production collaborators
    pub fn production(journal: JsonlJournal, llm: Arc<dyn LlmService>) -> Self {
        Self::new(
            Arc::new(journal),
            Arc::new(ServiceLlmClient::new(llm)),
            Arc::new(PdfExtractor),
        )
    }

    /// Start a new session in the menu and return its id with the welcome message
    pub async fn create_session(&self) -> (String, String) {
        let session_id = uuid::Uuid::new_v4().to_string();

        let (command_tx, command_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);

        let runtime: SharedRuntime = SessionRuntime::new(
            SessionContext::new(session_id.clone()),
            self.journal.clone(),
            self.llm_client.clone(),
            self.extractor.clone(),
            command_rx,
            broadcast_tx.clone(),
        );

        // Start runtime in background
        let id = session_id.clone();
        tokio::spawn(async move {
            runtime.run().await;
            tracing::info!(session_id = %id, "Session runtime finished");
        });

        self.sessions.write().await.insert(
            session_id.clone(),
            SessionHandle::new(command_tx, broadcast_tx),
        );

        let active_sessions = self.session_count().await;
        tracing::info!(session_id = %session_id, active_sessions, "Session created");
        (session_id, WELCOME_MESSAGE.to_string())
    }

    async fn handle(&self, session_id: &str) -> Result<SessionHandle, RuntimeError> {
        let handle = self
            .sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| RuntimeError::SessionNotFound(session_id.to_string()))?;
        handle.touch();
        Ok(handle)
    }

    /// Send an event and wait for the turn to settle
    pub async fn send_event(
        &self,
        session_id: &str,
        event: Event,
    ) -> Result<TurnOutcome, RuntimeError> {
        let handle = self.handle(session_id).await?;
        let (reply_tx, reply_rx) = oneshot::channel();
        handle
            .command_tx
            .send(SessionCommand::Event { event, reply_tx })
            .await
            .map_err(|_| RuntimeError::SessionClosed(session_id.to_string()))?;

        reply_rx
            .await
            .map_err(|_| RuntimeError::SessionClosed(session_id.to_string()))?
            .map_err(RuntimeError::Rejected)
    }

    pub async fn snapshot(&self, session_id: &str) -> Result<SessionSnapshot, RuntimeError> {
        let handle = self.handle(session_id).await?;
        let (reply_tx, reply_rx) = oneshot::channel();
        handle
            .command_tx
            .send(SessionCommand::Snapshot { reply_tx })
            .await
            .map_err(|_| RuntimeError::SessionClosed(session_id.to_string()))?;
        reply_rx
            .await
            .map_err(|_| RuntimeError::SessionClosed(session_id.to_string()))
    }

    /// Subscribe to session updates
    pub async fn subscribe(
        &self,
        session_id: &str,
    ) -> Result<broadcast::Receiver<SseEvent>, RuntimeError> {
        let handle = self.handle(session_id).await?;
        Ok(handle.broadcast_tx.subscribe())
    }

    /// Drop a session; its task stops once queued commands drain
    pub async fn close_session(&self, session_id: &str) -> Result<(), RuntimeError> {
        self.sessions
            .write()
            .await
            .remove(session_id)
            .map(|_| tracing::info!(session_id = %session_id, "Session closed"))
            .ok_or_else(|| RuntimeError::SessionNotFound(session_id.to_string()))
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop every session untouched for at least `max_idle`; returns how many went
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|session_id, handle| {
            let keep = handle.idle_for() < max_idle;
            if !keep {
                tracing::info!(session_id = %session_id, "Evicting idle session");
            }
            keep
        });
        before - sessions.len()
    }

    /// Start the background task that evicts abandoned sessions.
    /// Call once after wrapping the manager in an `Arc`.
    pub fn spawn_idle_sweeper(self: &Arc<Self>, max_idle: Duration) {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let period = SWEEP_INTERVAL.min(max_idle).max(Duration::from_millis(1));
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let evicted = manager.evict_idle(max_idle).await;
                if evicted > 0 {
                    let active_sessions = manager.session_count().await;
                    tracing::info!(evicted, active_sessions, "Idle sessions evicted");
                }
            }
        });
    }
}
