//! Events that can occur in a session

use super::state::Service;
use crate::companion::Personality;
use std::fmt;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserTurn {
        text: String,
        attachment: Option<Attachment>,
    },
    SettingsUpdated {
        companion_name: String,
        personality: Personality,
        active_service: Option<Service>,
    },

    // LLM events
    TherapyReply {
        user_text: String,
        reply: String,
    },
    SummaryReady {
        reply: String,
    },
    LlmFailed {
        message: String,
    },

    // Document events
    DocumentExtracted {
        text: String,
    },
    ExtractionFailed {
        message: String,
    },

    // Journal events
    JournalSaved,
    JournalFailed {
        message: String,
    },
}

impl Event {
    pub fn user_turn(text: impl Into<String>) -> Self {
        Event::UserTurn {
            text: text.into(),
            attachment: None,
        }
    }

    pub fn user_upload(text: impl Into<String>, attachment: Attachment) -> Self {
        Event::UserTurn {
            text: text.into(),
            attachment: Some(attachment),
        }
    }
}

/// A file uploaded with a turn
#[derive(Clone)]
pub struct Attachment {
    pub name: String,
    pub media_type: String,
    pub data: Vec<u8>,
}

// Raw bytes stay out of logs
impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.data.len())
            .finish()
    }
}
