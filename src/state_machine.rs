//! Core conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::{Attachment, Event};
pub use state::{History, Service, SessionContext, SessionStep, MAX_HISTORY_MESSAGES};
pub use transition::{transition, WELCOME_MESSAGE};
