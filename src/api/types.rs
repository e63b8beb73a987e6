//! API request and response types

use crate::state_machine::{Service, SessionStep};
use serde::{Deserialize, Serialize};

/// Response for session creation
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    /// Welcome menu
    pub message: String,
}

/// One chat turn: free text plus optional uploads
#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentPayload>,
}

/// Uploaded file, base64 encoded
#[derive(Debug, Deserialize)]
pub struct AttachmentPayload {
    #[serde(default = "default_attachment_name")]
    pub name: String,
    #[serde(default = "default_media_type")]
    pub media_type: String,
    pub data: String,
}

fn default_attachment_name() -> String {
    "upload.pdf".to_string()
}

fn default_media_type() -> String {
    "application/pdf".to_string()
}

/// Reply to a settled turn
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub message: String,
    pub step: SessionStep,
}

/// Companion and active-service settings
#[derive(Debug, Deserialize)]
pub struct SettingsRequest {
    #[serde(default)]
    pub companion_name: String,
    pub companion_personality: String,
    #[serde(default)]
    pub active_service: Option<Service>,
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub message: String,
}

/// Generic success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
