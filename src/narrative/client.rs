//! HTTP client for an OpenAI-compatible chat completions endpoint.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::debug;

use super::{CaseRequest, NarrativeGenerator};
use crate::case::CasePayload;
use crate::error::NarrativeError;

const CASE_SYSTEM_PROMPT: &str = "You write military medical training cases for a Role 2 \
    exercise. Respond with a single JSON object and nothing else.";

/// Connection settings for the narrative service.
#[derive(Debug, Clone)]
pub struct NarrativeSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_concurrent: usize,
    pub timeout_secs: u64,
}

impl NarrativeSettings {
    /// Reads settings from the environment. Returns `None` when `NARRATIVE_URL` is unset.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("NARRATIVE_URL").ok()?;
        let model = std::env::var("NARRATIVE_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let api_key = std::env::var("NARRATIVE_API_KEY").ok();
        let max_concurrent = std::env::var("NARRATIVE_MAX_CONCURRENT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(4);
        let timeout_secs = std::env::var("NARRATIVE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        Some(Self {
            base_url,
            model,
            api_key,
            max_concurrent,
            timeout_secs,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Narrative generator backed by a chat completions API.
#[derive(Clone)]
pub struct LlmNarrativeClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout_secs: u64,
    semaphore: Arc<Semaphore>,
}

impl LlmNarrativeClient {
    pub fn new(settings: NarrativeSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model,
            api_key: settings.api_key,
            timeout_secs: settings.timeout_secs,
            semaphore: Arc::new(Semaphore::new(settings.max_concurrent.max(1))),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: String) -> Result<String, NarrativeError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: CASE_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
            temperature: 0.7,
        };

        let url = format!("{}/v1/chat/completions", self.base_url);
        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(NarrativeError::Status { status, body });
        }

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| NarrativeError::Malformed("no choices in response".to_string()))
    }
}

impl NarrativeGenerator for LlmNarrativeClient {
    async fn generate_case(&self, request: &CaseRequest) -> Result<CasePayload, NarrativeError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| NarrativeError::Unavailable)?;

        debug!(descriptor = %request.descriptor, "requesting case narrative");
        let text = tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            self.complete(case_prompt(request)),
        )
        .await
        .map_err(|_| NarrativeError::Timeout(self.timeout_secs))??;

        parse_case_payload(&text)
    }
}

fn case_prompt(request: &CaseRequest) -> String {
    format!(
        "Write one casualty case.\n\
         Injury or illness: {}\n\
         Mechanism and setting: {}\n\
         Environment: {}\n\
         Region: {}\n\n\
         Return JSON with keys: \"age\" (integer), \"mechanism\" (string), \
         \"description\" (string, Z-MIST style), \"triage\" (one of \"T1\",\"T2\",\"T3\",\"T4\"), \
         \"vitals\" (object with heart_rate, blood_pressure, respiratory_rate, spo2, gcs), \
         \"phases\" (object keyed by \"resuscitation\", \"surgery\" if surgery is required, \
         and \"prolonged_care\", each a list of expected actions).",
        request.descriptor, request.mechanism, request.environment, request.region
    )
}

/// Extracts a case payload from model output, tolerating markdown fences and chatter.
pub fn parse_case_payload(text: &str) -> Result<CasePayload, NarrativeError> {
    let start = text
        .find('{')
        .ok_or_else(|| NarrativeError::Malformed("no JSON object in output".to_string()))?;
    let end = text
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| NarrativeError::Malformed("unterminated JSON object".to_string()))?;

    serde_json::from_str(&text[start..=end]).map_err(|e| NarrativeError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::TriageCategory;

    fn settings(url: &str) -> NarrativeSettings {
        NarrativeSettings {
            base_url: url.to_string(),
            model: "test-model".to_string(),
            api_key: None,
            max_concurrent: 2,
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_client_creation_trims_slash() {
        let client = LlmNarrativeClient::new(settings("http://localhost:8000/"));
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.model(), "test-model");
    }

    #[test]
    fn test_parse_fenced_payload() {
        let text = "Here is the case:\n```json\n{\"age\": 24, \"mechanism\": \"IED\", \
            \"description\": \"Left leg amputation\", \"triage\": \"T1\", \
            \"phases\": {\"resuscitation\": [\"TQ\"], \"surgery\": [\"Ex-fix\"]}}\n```";
        let payload = parse_case_payload(text).unwrap();
        assert_eq!(payload.age, Some(24));
        assert_eq!(payload.triage, TriageCategory::T1);
        assert!(payload.phases.contains_key("surgery"));
    }

    #[test]
    fn test_parse_rejects_unknown_triage() {
        let text = r#"{"mechanism": "IED", "description": "x", "triage": "Urgent"}"#;
        assert!(matches!(
            parse_case_payload(text),
            Err(NarrativeError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_plain_text() {
        assert!(parse_case_payload("I cannot help with that.").is_err());
    }

    #[test]
    fn test_prompt_mentions_request_fields() {
        let prompt = case_prompt(&CaseRequest {
            descriptor: "Heat stroke".to_string(),
            mechanism: "DNBI".to_string(),
            environment: "Desert".to_string(),
            region: "CENTCOM".to_string(),
        });
        assert!(prompt.contains("Heat stroke"));
        assert!(prompt.contains("CENTCOM"));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        let client = LlmNarrativeClient::new(settings("http://127.0.0.1:9"));
        let request = CaseRequest {
            descriptor: "Open tibia fracture".to_string(),
            mechanism: "Feint".to_string(),
            environment: "Urban".to_string(),
            region: String::new(),
        };
        assert!(client.generate_case(&request).await.is_err());
    }
}
