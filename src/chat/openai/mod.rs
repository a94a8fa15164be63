#[cfg(test)]
mod tests;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{ChatMessage, ChatModel, non_empty};
use crate::config::ChatConfig;
use crate::http::HttpClient;
use crate::{Result, WisestError};

/// Client for any `/chat/completions` endpoint speaking the OpenAI wire format
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    endpoint: Url,
    model: String,
    http: HttpClient,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatibleClient {
    #[inline]
    pub fn new(config: &ChatConfig, api_key: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(&format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        ))
        .map_err(|e| WisestError::Config(format!("Invalid chat base URL: {}", e)))?;

        Ok(Self {
            endpoint,
            model: config.model.clone(),
            http: HttpClient::new(timeout).with_bearer_token(api_key),
        })
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatibleClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Option<String>> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
        };

        let response: CompletionResponse = self.http.post_json_for(&self.endpoint, &request).await?;
        debug!("{} returned {} choices", self.model, response.choices.len());

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .and_then(non_empty))
    }
}
