//! Effects produced by state transitions

use super::event::Attachment;
use super::state::Service;
use crate::companion::Companion;

/// Effects to be executed after state transition
#[derive(Debug, Clone)]
pub enum Effect {
    /// Send the outbound message for this turn
    Reply { text: String },

    /// Ask the LLM for a supportive reply to the user's text
    RequestTherapyReply { text: String },

    /// Extract the text of an uploaded report
    ExtractDocument { attachment: Attachment },

    /// Ask the LLM to summarize extracted report text
    RequestSummary { document: String },

    /// Persist a journal entry
    AppendJournal { mood: String, entry: String },

    /// Append a completed exchange to the therapy history
    RecordExchange { user: String, assistant: String },

    /// Replace the session's companion persona
    UpdateCompanion { companion: Companion },

    /// Update the active-service indicator
    SetActiveService { service: Option<Service> },
}

impl Effect {
    pub fn reply(text: impl Into<String>) -> Self {
        Effect::Reply { text: text.into() }
    }
}
