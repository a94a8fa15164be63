
use async_trait::async_trait;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{ChatMessage, ChatModel, Role, non_empty};
use crate::config::AdvisorConfig;
use crate::http::HttpClient;
use crate::{Result, WisestError};

/// Google Generative Language `generateContent` client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    endpoint: Url,
    model: String,
    http: HttpClient,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GeminiClient {
    #[inline]
    pub fn new(config: &AdvisorConfig, api_key: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(&config.base_url)
            .and_then(|base| base.join(&format!("/v1beta/models/{}:generateContent", config.model)))
            .map_err(|e| WisestError::Config(format!("Invalid advisor base URL: {}", e)))?;

        Ok(Self {
            endpoint,
            model: config.model.clone(),
            http: HttpClient::new(timeout).with_header("x-goog-api-key", api_key),
        })
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(messages: &[ChatMessage]) -> GenerateRequest {
        let system = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .join("\n\n");

        let contents = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| Content {
                role: Some(if m.role == Role::Assistant { "model" } else { "user" }.to_string()),
                parts: vec![Part {
                    text: m.content.clone(),
                }],
            })
            .collect();

        GenerateRequest {
            system_instruction: (!system.is_empty()).then(|| Content {
                role: None,
                parts: vec![Part { text: system }],
            }),
            contents,
        }
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Option<String>> {
        let request = Self::build_request(messages);

        let response: GenerateResponse = self.http.post_json_for(&self.endpoint, &request).await?;
        debug!("{} returned {} candidates", self.model, response.candidates.len());

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().map(|part| part.text).join(""));

        Ok(text.and_then(non_empty))
    }
}
