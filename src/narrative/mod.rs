//! Narrative Generator collaborator.
//!
//! The engine only needs structured case content from a generator; the
//! narrative quality is the generator's concern. Any failure is absorbed by
//! case acquisition, which substitutes a locally built fallback case.

pub mod client;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::case::CasePayload;
use crate::error::NarrativeError;

pub use client::{parse_case_payload, LlmNarrativeClient, NarrativeSettings};

/// One request for case content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRequest {
    pub descriptor: String,
    pub mechanism: String,
    pub environment: String,
    pub region: String,
}

/// Source of generated case content.
pub trait NarrativeGenerator {
    fn generate_case(
        &self,
        request: &CaseRequest,
    ) -> impl Future<Output = Result<CasePayload, NarrativeError>>;
}

/// Generator that never produces content, so every case uses the fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineNarrative;

impl NarrativeGenerator for OfflineNarrative {
    async fn generate_case(&self, _request: &CaseRequest) -> Result<CasePayload, NarrativeError> {
        Err(NarrativeError::Unavailable)
    }
}

/// Generator selected at startup from the runtime settings.
#[derive(Clone)]
pub enum NarrativeBackend {
    Offline(OfflineNarrative),
    Llm(LlmNarrativeClient),
}

impl NarrativeBackend {
    /// Uses the LLM client when a narrative URL is configured, offline otherwise.
    pub fn from_settings(settings: Option<NarrativeSettings>) -> Self {
        match settings {
            Some(settings) => NarrativeBackend::Llm(LlmNarrativeClient::new(settings)),
            None => NarrativeBackend::Offline(OfflineNarrative),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            NarrativeBackend::Offline(_) => "offline (fallback cases only)".to_string(),
            NarrativeBackend::Llm(client) => format!("{} @ {}", client.model(), client.base_url()),
        }
    }
}

impl NarrativeGenerator for NarrativeBackend {
    async fn generate_case(&self, request: &CaseRequest) -> Result<CasePayload, NarrativeError> {
        match self {
            NarrativeBackend::Offline(offline) => offline.generate_case(request).await,
            NarrativeBackend::Llm(client) => client.generate_case(request).await,
        }
    }
}
