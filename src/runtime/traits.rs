//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::document::{self, ExtractionError};
use crate::journal::{JournalEntry, JournalError, JsonlJournal};
use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use crate::state_machine::Attachment;
use async_trait::async_trait;
use std::sync::Arc;

/// Append-only storage for journal entries
#[async_trait]
pub trait JournalStore: Send + Sync {
    /// Persist one entry
    async fn append(&self, entry: &JournalEntry) -> Result<(), JournalError>;
}

/// Client for making LLM requests
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete an LLM request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Text extraction for uploaded documents
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, attachment: &Attachment) -> Result<String, ExtractionError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: JournalStore + ?Sized> JournalStore for Arc<T> {
    async fn append(&self, entry: &JournalEntry) -> Result<(), JournalError> {
        (**self).append(entry).await
    }
}

#[async_trait]
impl<T: LlmClient + ?Sized> LlmClient for Arc<T> {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        (**self).complete(request).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

#[async_trait]
impl<T: DocumentExtractor + ?Sized> DocumentExtractor for Arc<T> {
    async fn extract(&self, attachment: &Attachment) -> Result<String, ExtractionError> {
        (**self).extract(attachment).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

#[async_trait]
impl JournalStore for JsonlJournal {
    async fn append(&self, entry: &JournalEntry) -> Result<(), JournalError> {
        JsonlJournal::append(self, entry).await
    }
}

/// Adapter to use an `LlmService` as `LlmClient`
pub struct ServiceLlmClient {
    service: Arc<dyn LlmService>,
}

impl ServiceLlmClient {
    pub fn new(service: Arc<dyn LlmService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl LlmClient for ServiceLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.service.complete(request).await
    }

    fn model_id(&self) -> &str {
        self.service.model_id()
    }
}

/// PDF extraction on the blocking pool
pub struct PdfExtractor;

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    async fn extract(&self, attachment: &Attachment) -> Result<String, ExtractionError> {
        let data = attachment.data.clone();
        tokio::task::spawn_blocking(move || document::extract_text(&data))
            .await
            .map_err(|e| ExtractionError::Parse(format!("extraction task failed: {e}")))?
    }
}
