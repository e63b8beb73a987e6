//! Pure state transition function
//!
//! Every user turn from a resting step either produces its reply directly or
//! asks for exactly one collaborator call; the collaborator's outcome event
//! then produces the reply. Either way a turn ends with exactly one
//! `Effect::Reply`.

use super::state::{Service, SessionContext, SessionStep};
use super::{Effect, Event};
use crate::companion::Companion;
use thiserror::Error;

pub const WELCOME_MESSAGE: &str = "🧠 Welcome to MindMate!\nChoose a service:\n1. Chat with Therapist\n2. Summarize Report\n3. Write Journal Entry\nPlease type 1, 2, or 3.";
pub const THERAPY_PROMPT: &str = "Tell me, how are you feeling today?";
pub const UPLOAD_PROMPT: &str = "Please upload your medical report PDF using the upload button.";
pub const MOOD_PROMPT: &str = "How do you feel today? (🙂 Happy, 😞 Sad, 😠 Angry, 😰 Anxious)";
pub const INVALID_OPTION: &str = "Invalid option. Please type 1, 2, or 3.";
pub const MISSING_UPLOAD: &str = "Please upload a PDF using the upload button below.";
pub const ENTRY_PROMPT: &str = "Now, write your thoughts for today:";
pub const JOURNAL_SAVED: &str = "Your journal entry has been saved. Thank you!";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionStep,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionStep) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs, with no I/O.
pub fn transition(
    state: &SessionStep,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Settings (any step, step unchanged)
        // ============================================================
        (
            _,
            Event::SettingsUpdated {
                companion_name,
                personality,
                active_service,
            },
        ) => {
            let name = match companion_name.trim() {
                "" => context.companion.name.clone(),
                trimmed => trimmed.to_string(),
            };
            let companion = Companion::new(name, personality);
            let greeting = mode_greeting(&companion, active_service);
            Ok(TransitionResult::new(state.clone())
                .with_effect(Effect::UpdateCompanion { companion })
                .with_effect(Effect::SetActiveService {
                    service: active_service,
                })
                .with_effect(Effect::reply(greeting)))
        }

        // ============================================================
        // Menu
        // ============================================================
        (SessionStep::Menu, Event::UserTurn { text, .. }) => Ok(match text.trim() {
            "1" => select(SessionStep::Therapy, Service::Therapy, THERAPY_PROMPT),
            "2" => select(SessionStep::Summary, Service::Summary, UPLOAD_PROMPT),
            "3" => select(SessionStep::JournalAwaitingMood, Service::Journal, MOOD_PROMPT),
            _ => TransitionResult::new(SessionStep::Menu).with_effect(Effect::reply(INVALID_OPTION)),
        }),

        // ============================================================
        // Therapy
        // ============================================================
        (SessionStep::Therapy, Event::UserTurn { text, .. }) => {
            Ok(TransitionResult::new(SessionStep::Therapy)
                .with_effect(Effect::RequestTherapyReply { text }))
        }

        (SessionStep::Therapy, Event::TherapyReply { user_text, reply }) => {
            Ok(TransitionResult::new(SessionStep::Menu)
                .with_effect(Effect::RecordExchange {
                    user: user_text,
                    assistant: reply.clone(),
                })
                .with_effect(Effect::reply(reply)))
        }

        // A failed call still completes the turn so the session never sticks
        (SessionStep::Therapy | SessionStep::Summary, Event::LlmFailed { message }) => {
            Ok(TransitionResult::new(SessionStep::Menu).with_effect(Effect::reply(apology(&message))))
        }

        // ============================================================
        // Summary
        // ============================================================
        (SessionStep::Summary, Event::UserTurn { attachment: None, .. }) => {
            Ok(TransitionResult::new(SessionStep::Summary).with_effect(Effect::reply(MISSING_UPLOAD)))
        }

        (
            SessionStep::Summary,
            Event::UserTurn {
                attachment: Some(attachment),
                ..
            },
        ) => Ok(TransitionResult::new(SessionStep::Summary)
            .with_effect(Effect::ExtractDocument { attachment })),

        (SessionStep::Summary, Event::DocumentExtracted { text }) => {
            Ok(TransitionResult::new(SessionStep::Summary)
                .with_effect(Effect::RequestSummary { document: text }))
        }

        // Stay in Summary so the user can upload another file
        (SessionStep::Summary, Event::ExtractionFailed { message }) => {
            Ok(TransitionResult::new(SessionStep::Summary)
                .with_effect(Effect::reply(extraction_failed(&message))))
        }

        (SessionStep::Summary, Event::SummaryReady { reply }) => {
            Ok(TransitionResult::new(SessionStep::Menu).with_effect(Effect::reply(reply)))
        }

        // ============================================================
        // Journal
        // ============================================================
        (SessionStep::JournalAwaitingMood, Event::UserTurn { text, .. }) => {
            let mood = text.trim();
            if mood.is_empty() {
                return Ok(TransitionResult::new(SessionStep::JournalAwaitingMood)
                    .with_effect(Effect::reply(MOOD_PROMPT)));
            }
            Ok(TransitionResult::new(SessionStep::JournalAwaitingEntry {
                mood: mood.to_string(),
            })
            .with_effect(Effect::reply(ENTRY_PROMPT)))
        }

        (SessionStep::JournalAwaitingEntry { mood }, Event::UserTurn { text, .. }) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::AppendJournal {
                mood: mood.clone(),
                entry: text.trim().to_string(),
            }))
        }

        (SessionStep::JournalAwaitingEntry { .. }, Event::JournalSaved) => {
            Ok(TransitionResult::new(SessionStep::Menu).with_effect(Effect::reply(JOURNAL_SAVED)))
        }

        // The entry is lost; no retry
        (SessionStep::JournalAwaitingEntry { .. }, Event::JournalFailed { message }) => {
            Ok(TransitionResult::new(SessionStep::Menu)
                .with_effect(Effect::reply(journal_failed(&message))))
        }

        // ============================================================
        // Anything else is a stray collaborator outcome
        // ============================================================
        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{} cannot handle {}",
            state.name(),
            event_name(&event)
        ))),
    }
}

fn select(step: SessionStep, service: Service, prompt: &str) -> TransitionResult {
    TransitionResult::new(step)
        .with_effect(Effect::SetActiveService {
            service: Some(service),
        })
        .with_effect(Effect::reply(prompt))
}

fn event_name(event: &Event) -> &'static str {
    match event {
        Event::UserTurn { .. } => "user_turn",
        Event::SettingsUpdated { .. } => "settings_updated",
        Event::TherapyReply { .. } => "therapy_reply",
        Event::SummaryReady { .. } => "summary_ready",
        Event::LlmFailed { .. } => "llm_failed",
        Event::DocumentExtracted { .. } => "document_extracted",
        Event::ExtractionFailed { .. } => "extraction_failed",
        Event::JournalSaved => "journal_saved",
        Event::JournalFailed { .. } => "journal_failed",
    }
}

pub fn apology(message: &str) -> String {
    format!(
        "I'm sorry, I couldn't reach the assistant service right now ({message}). Please try again."
    )
}

pub fn extraction_failed(message: &str) -> String {
    format!("Sorry, I couldn't read that file ({message}). {MISSING_UPLOAD}")
}

pub fn journal_failed(message: &str) -> String {
    format!("Sorry, your journal entry could not be saved ({message}).")
}

/// Greeting sent after a settings change
pub fn mode_greeting(companion: &Companion, service: Option<Service>) -> String {
    let intro = format!(
        "Hi, I'm {}, your {} companion.",
        companion.name, companion.personality
    );
    match service {
        Some(service) => format!("{intro} You're in {}. {}", service.title(), service.description()),
        None => format!("{intro} Type 1, 2, or 3 to choose a service."),
    }
}
