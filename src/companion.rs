//! Companion persona
//!
//! A companion is a display name plus one of a fixed set of personalities.
//! The personality only changes the wording of the system prompt.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Name used until the user picks one
pub const DEFAULT_COMPANION_NAME: &str = "Alex";

/// The five companion personalities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    #[default]
    Supportive,
    Empathetic,
    Cheerful,
    Calm,
    Motivational,
}

impl Personality {
    pub const ALL: [Personality; 5] = [
        Personality::Supportive,
        Personality::Empathetic,
        Personality::Cheerful,
        Personality::Calm,
        Personality::Motivational,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Personality::Supportive => "supportive",
            Personality::Empathetic => "empathetic",
            Personality::Cheerful => "cheerful",
            Personality::Calm => "calm",
            Personality::Motivational => "motivational",
        }
    }

    /// Prompt fragment describing how the companion speaks
    pub fn prompt_fragment(self) -> &'static str {
        match self {
            Personality::Supportive => {
                "You are warm and supportive. Validate the user's feelings and gently encourage them."
            }
            Personality::Empathetic => {
                "You are deeply empathetic. Reflect the user's emotions back to them and show that you understand."
            }
            Personality::Cheerful => {
                "You are upbeat and cheerful. Bring lightness and hope without dismissing the user's concerns."
            }
            Personality::Calm => {
                "You are calm and grounding. Speak slowly and simply, and suggest soothing techniques when helpful."
            }
            Personality::Motivational => {
                "You are motivational. Help the user find small, concrete steps they can take forward."
            }
        }
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown personality: {0}")]
pub struct UnknownPersonality(pub String);

impl FromStr for Personality {
    type Err = UnknownPersonality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Personality::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownPersonality(s.to_string()))
    }
}

/// Companion persona folded into the system prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Companion {
    pub name: String,
    pub personality: Personality,
}

impl Default for Companion {
    fn default() -> Self {
        Self {
            name: DEFAULT_COMPANION_NAME.to_string(),
            personality: Personality::default(),
        }
    }
}

impl Companion {
    pub fn new(name: impl Into<String>, personality: Personality) -> Self {
        Self {
            name: name.into(),
            personality,
        }
    }

    /// Persona text for the system prompt
    pub fn persona(&self) -> String {
        format!(
            "Your name is {}. {}",
            self.name,
            self.personality.prompt_fragment()
        )
    }
}
