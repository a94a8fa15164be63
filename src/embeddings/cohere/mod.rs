
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{Embedder, EmbeddingPurpose};
use crate::config::EmbeddingConfig;
use crate::http::HttpClient;
use crate::{Result, WisestError};

/// Cohere `/v1/embed` client
#[derive(Debug, Clone)]
pub struct CohereClient {
    endpoint: Url,
    model: String,
    dimension: usize,
    http: HttpClient,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    texts: [&'a str; 1],
    model: &'a str,
    input_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl CohereClient {
    #[inline]
    pub fn new(config: &EmbeddingConfig, api_key: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(&config.base_url)
            .and_then(|base| base.join("/v1/embed"))
            .map_err(|e| WisestError::Config(format!("Invalid embedding URL: {}", e)))?;

        Ok(Self {
            endpoint,
            model: config.model.clone(),
            dimension: config.dimension,
            http: HttpClient::new(timeout).with_bearer_token(api_key),
        })
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }
}

const fn input_type(purpose: EmbeddingPurpose) -> &'static str {
    match purpose {
        EmbeddingPurpose::Document => "search_document",
        EmbeddingPurpose::Query => "search_query",
    }
}

#[async_trait]
impl Embedder for CohereClient {
    async fn embed(&self, text: &str, purpose: EmbeddingPurpose) -> Result<Vec<f32>> {
        debug!("Generating embedding for text (length: {})", text.len());

        let request = EmbedRequest {
            texts: [text],
            model: &self.model,
            input_type: input_type(purpose),
        };

        let response: EmbedResponse = self.http.post_json_for(&self.endpoint, &request).await?;

        let embedding = response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| WisestError::Embedding("Provider returned no embeddings".to_string()))?;

        if embedding.len() != self.dimension {
            return Err(WisestError::Embedding(format!(
                "Expected {} dimensions from {}, got {}",
                self.dimension,
                self.model,
                embedding.len()
            )));
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
