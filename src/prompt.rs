//! Prompt assembly for the therapy and summary services
//!
//! The controller owns every word sent to the model: the base system prompt,
//! the companion persona, and the task-specific user prompt.

use crate::companion::Companion;
use crate::llm::{LlmMessage, LlmRequest};

/// Base system prompt establishing the assistant's role
const BASE_PROMPT: &str = "You are a helpful and compassionate AI mental health assistant.";

/// Maximum number of document characters forwarded for summarization
pub const MAX_DOCUMENT_CHARS: usize = 2000;

const THERAPY_MAX_TOKENS: u32 = 500;
const THERAPY_TEMPERATURE: f32 = 0.7;
const SUMMARY_MAX_TOKENS: u32 = 700;
const SUMMARY_TEMPERATURE: f32 = 0.3;

/// Build the system prompt for a companion
pub fn build_system_prompt(companion: &Companion) -> String {
    format!("{BASE_PROMPT}\n\n{}", companion.persona())
}

/// Request for a supportive reply to `text`, with prior exchanges as context
pub fn therapy_request(companion: &Companion, history: &[LlmMessage], text: &str) -> LlmRequest {
    let mut messages = history.to_vec();
    messages.push(LlmMessage::user(format!(
        "The user says: '{text}'. Respond with empathetic and thoughtful guidance."
    )));

    LlmRequest {
        system: build_system_prompt(companion),
        messages,
        max_tokens: Some(THERAPY_MAX_TOKENS),
        temperature: Some(THERAPY_TEMPERATURE),
    }
}

/// Request for a plain-language summary of a medical report
pub fn summary_request(companion: &Companion, document: &str) -> LlmRequest {
    let excerpt = truncate_chars(document, MAX_DOCUMENT_CHARS);
    LlmRequest {
        system: build_system_prompt(companion),
        messages: vec![LlmMessage::user(format!(
            "Summarize this medical report in plain language: {excerpt}"
        ))],
        max_tokens: Some(SUMMARY_MAX_TOKENS),
        temperature: Some(SUMMARY_TEMPERATURE),
    }
}

/// Prefix of `text` holding at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text.get(..byte_idx).unwrap_or(text),
        None => text,
    }
}
