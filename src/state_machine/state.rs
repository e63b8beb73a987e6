//! Session state types

use crate::companion::Companion;
use crate::llm::LlmMessage;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

// ============================================================================
// Session Step
// ============================================================================

/// Where the session is in the menu → service → sub-step cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionStep {
    /// Waiting for a service choice (1, 2 or 3)
    #[default]
    Menu,

    /// Next turn is sent to the companion for a supportive reply
    Therapy,

    /// Waiting for a PDF report to summarize
    Summary,

    /// Next turn is the mood
    JournalAwaitingMood,

    /// Next turn is the journal entry for the captured mood
    JournalAwaitingEntry { mood: String },
}

impl SessionStep {
    /// Stable name used on the wire and in logs
    pub fn name(&self) -> &'static str {
        match self {
            SessionStep::Menu => "menu",
            SessionStep::Therapy => "therapy",
            SessionStep::Summary => "summary",
            SessionStep::JournalAwaitingMood => "journal_awaiting_mood",
            SessionStep::JournalAwaitingEntry { .. } => "journal_awaiting_entry",
        }
    }

    /// Mood captured for the entry being written, if any
    pub fn pending_mood(&self) -> Option<&str> {
        match self {
            SessionStep::JournalAwaitingEntry { mood } => Some(mood),
            _ => None,
        }
    }
}

// ============================================================================
// Services
// ============================================================================

/// The three services offered from the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    Therapy,
    Summary,
    Journal,
}

impl Service {
    pub fn title(self) -> &'static str {
        match self {
            Service::Therapy => "Therapist Chat",
            Service::Summary => "Report Summary",
            Service::Journal => "Mood Journal",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Service::Therapy => "Tell me how you're feeling and I'll listen and offer guidance.",
            Service::Summary => {
                "Upload a medical report PDF and I'll explain it in plain language."
            }
            Service::Journal => "Record your mood and write down what's on your mind.",
        }
    }
}

// ============================================================================
// Session Context
// ============================================================================

/// Per-session settings the transition function reads
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub companion: Companion,
    /// Service the user last chose or switched to in settings
    pub active_service: Option<Service>,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            companion: Companion::default(),
            active_service: None,
        }
    }
}

// ============================================================================
// Therapy History
// ============================================================================

/// Maximum number of messages kept as therapy context (10 exchanges)
pub const MAX_HISTORY_MESSAGES: usize = 20;

/// Bounded therapy history; the oldest messages are evicted first
#[derive(Debug, Clone)]
pub struct History {
    messages: VecDeque<LlmMessage>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_limit(MAX_HISTORY_MESSAGES)
    }
}

impl History {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// Append a completed user/assistant exchange
    pub fn record_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.push(LlmMessage::user(user));
        self.push(LlmMessage::assistant(assistant));
    }

    fn push(&mut self, message: LlmMessage) {
        if self.limit == 0 {
            return;
        }
        while self.messages.len() >= self.limit {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Messages oldest first
    pub fn to_messages(&self) -> Vec<LlmMessage> {
        self.messages.iter().cloned().collect()
    }
}
