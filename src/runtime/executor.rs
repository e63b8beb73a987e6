//! Session runtime executor

use super::traits::{DocumentExtractor, JournalStore, LlmClient};
use super::{SessionCommand, SessionSnapshot, SseEvent, TurnOutcome};

use crate::journal::JournalEntry;
use crate::llm::LlmRequest;
use crate::prompt::{summary_request, therapy_request};
use crate::state_machine::{transition, Effect, Event, History, SessionContext, SessionStep};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;

/// Upper bound on a single LLM call
const LLM_TIMEOUT: Duration = Duration::from_secs(60);

/// Generic session runtime that can work with any journal, LLM, and extractor implementations
pub struct SessionRuntime<J, L, X>
where
    J: JournalStore + 'static,
    L: LlmClient + 'static,
    X: DocumentExtractor + 'static,
{
    context: SessionContext,
    state: SessionStep,
    history: History,
    journal: J,
    llm_client: Arc<L>,
    extractor: Arc<X>,
    llm_timeout: Duration,
    command_rx: mpsc::Receiver<SessionCommand>,
    broadcast_tx: broadcast::Sender<SseEvent>,
}

impl<J, L, X> SessionRuntime<J, L, X>
where
    J: JournalStore + 'static,
    L: LlmClient + 'static,
    X: DocumentExtractor + 'static,
{
    pub fn new(
        context: SessionContext,
        journal: J,
        llm_client: L,
        extractor: X,
        command_rx: mpsc::Receiver<SessionCommand>,
        broadcast_tx: broadcast::Sender<SseEvent>,
    ) -> Self {
        Self {
            context,
            state: SessionStep::Menu,
            history: History::default(),
            journal,
            llm_client: Arc::new(llm_client),
            extractor: Arc::new(extractor),
            llm_timeout: LLM_TIMEOUT,
            command_rx,
            broadcast_tx,
        }
    }

    /// Override the LLM call timeout
    pub fn with_llm_timeout(mut self, llm_timeout: Duration) -> Self {
        self.llm_timeout = llm_timeout;
        self
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.context.session_id, "Starting session runtime");

        // One command at a time: a turn finishes before the next is read
        while let Some(command) = self.command_rx.recv().await {
            match command {
                SessionCommand::Event { event, reply_tx } => {
                    let outcome = self.process_event(event).await;
                    if let Err(e) = &outcome {
                        tracing::error!(session_id = %self.context.session_id, error = %e, "Error handling event");
                        let _ = self.broadcast_tx.send(SseEvent::Error { message: e.clone() });
                    }
                    let _ = reply_tx.send(outcome);
                }
                SessionCommand::Snapshot { reply_tx } => {
                    let _ = reply_tx.send(self.snapshot());
                }
            }
        }

        tracing::info!(session_id = %self.context.session_id, "Session runtime stopped");
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.context.session_id.clone(),
            step: self.state.clone(),
            pending_mood: self.state.pending_mood().map(String::from),
            companion: self.context.companion.clone(),
            active_service: self.context.active_service,
            history_len: self.history.len(),
        }
    }

    async fn process_event(&mut self, event: Event) -> Result<TurnOutcome, String> {
        if let Event::UserTurn { text, .. } = &event {
            let _ = self.broadcast_tx.send(SseEvent::Message {
                role: "user",
                text: text.clone(),
            });
        }

        let mut replies = Vec::new();

        // Collaborator outcomes come back as events; process until settled
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            // Pure state transition
            let result = transition(&self.state, &self.context, current_event)
                .map_err(|e| e.to_string())?;

            // Update state
            let old_state = std::mem::replace(&mut self.state, result.new_state);
            if old_state != self.state {
                tracing::debug!(
                    session_id = %self.context.session_id,
                    from = old_state.name(),
                    to = self.state.name(),
                    "Step changed"
                );
                let _ = self.broadcast_tx.send(SseEvent::StepChange {
                    step: serde_json::to_value(&self.state).unwrap_or_default(),
                });
            }

            // Execute effects and collect generated events
            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect, &mut replies).await {
                    events_to_process.push(generated_event);
                }
            }
        }

        Ok(TurnOutcome {
            message: replies.join("\n\n"),
            step: self.state.clone(),
        })
    }

    /// Execute an effect and optionally return a generated event
    async fn execute_effect(&mut self, effect: Effect, replies: &mut Vec<String>) -> Option<Event> {
        match effect {
            Effect::Reply { text } => {
                let _ = self.broadcast_tx.send(SseEvent::Message {
                    role: "assistant",
                    text: text.clone(),
                });
                replies.push(text);
                None
            }

            Effect::RequestTherapyReply { text } => {
                let request =
                    therapy_request(&self.context.companion, &self.history.to_messages(), &text);
                Some(match self.complete(&request).await {
                    Ok(reply) => Event::TherapyReply {
                        user_text: text,
                        reply,
                    },
                    Err(message) => Event::LlmFailed { message },
                })
            }

            Effect::RequestSummary { document } => {
                let request = summary_request(&self.context.companion, &document);
                Some(match self.complete(&request).await {
                    Ok(reply) => Event::SummaryReady { reply },
                    Err(message) => Event::LlmFailed { message },
                })
            }

            Effect::ExtractDocument { attachment } => {
                tracing::info!(
                    session_id = %self.context.session_id,
                    name = %attachment.name,
                    bytes = attachment.data.len(),
                    "Extracting uploaded document"
                );
                Some(match self.extractor.extract(&attachment).await {
                    Ok(text) => Event::DocumentExtracted { text },
                    Err(e) => {
                        tracing::warn!(session_id = %self.context.session_id, error = %e, "Document extraction failed");
                        Event::ExtractionFailed {
                            message: e.to_string(),
                        }
                    }
                })
            }

            Effect::AppendJournal { mood, entry } => {
                let entry = JournalEntry::new(mood, entry);
                Some(match self.journal.append(&entry).await {
                    Ok(()) => {
                        tracing::info!(session_id = %self.context.session_id, "Journal entry saved");
                        Event::JournalSaved
                    }
                    Err(e) => {
                        tracing::error!(session_id = %self.context.session_id, error = %e, "Failed to save journal entry");
                        Event::JournalFailed {
                            message: e.to_string(),
                        }
                    }
                })
            }

            Effect::RecordExchange { user, assistant } => {
                self.history.record_exchange(user, assistant);
                None
            }

            Effect::UpdateCompanion { companion } => {
                tracing::info!(
                    session_id = %self.context.session_id,
                    name = %companion.name,
                    personality = %companion.personality,
                    "Companion updated"
                );
                self.context.companion = companion;
                None
            }

            Effect::SetActiveService { service } => {
                self.context.active_service = service;
                None
            }
        }
    }

    /// Run an LLM request under the timeout, flattening failures to a message
    async fn complete(&self, request: &LlmRequest) -> Result<String, String> {
        match timeout(self.llm_timeout, self.llm_client.complete(request)).await {
            Ok(Ok(response)) => Ok(response.text),
            Ok(Err(e)) => Err(e.message),
            Err(_) => {
                tracing::warn!(
                    session_id = %self.context.session_id,
                    model = %self.llm_client.model_id(),
                    timeout_secs = self.llm_timeout.as_secs(),
                    "LLM request timed out"
                );
                Err(format!(
                    "request timed out after {} seconds",
                    self.llm_timeout.as_secs()
                ))
            }
        }
    }
}
