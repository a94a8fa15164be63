// Query module
// embed question -> nearest chunks -> prompt -> one chat completion -> optional log


use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::Result;
use crate::chat::{ChatMessage, ChatModel};
use crate::config::DEFAULT_MATCH_COUNT;
use crate::embeddings::{Embedder, EmbeddingPurpose, embed_checked};
use crate::query_log::{QueryLog, QueryLogEntry};
use crate::store::{SearchMatch, VectorStore};

/// Returned when the store has nothing near the question
pub const NOT_FOUND_ANSWER: &str = "I don't have enough information to answer that question.";

/// Returned when the chat model answers without any text
pub const NO_RESPONSE_ANSWER: &str = "Sorry, I couldn't generate a response.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub found_results: bool,
    /// Source of every chunk placed in the context, best match first
    pub sources: Vec<String>,
}

impl Answer {
    #[inline]
    pub fn not_found() -> Self {
        Self {
            text: NOT_FOUND_ANSWER.to_string(),
            found_results: false,
            sources: Vec::new(),
        }
    }
}

/// Retrieval-augmented question answering over injected capabilities
pub struct QueryEngine {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    chat: Arc<dyn ChatModel>,
    log: Option<Arc<dyn QueryLog>>,
    system_prompt: String,
    match_count: usize,
}

impl QueryEngine {
    #[inline]
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        chat: Arc<dyn ChatModel>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            store,
            chat,
            log: None,
            system_prompt: system_prompt.into(),
            match_count: DEFAULT_MATCH_COUNT,
        }
    }

    #[inline]
    pub fn with_log(mut self, log: Arc<dyn QueryLog>) -> Self {
        self.log = Some(log);
        self
    }

    #[inline]
    pub fn with_match_count(mut self, match_count: usize) -> Self {
        self.match_count = match_count;
        self
    }

    /// Answer `question` from the stored chunks.
    ///
    /// Embedding, search and chat failures propagate. An empty search result
    /// is a normal answer and never reaches the chat model.
    #[inline]
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let started = Instant::now();

        let query_embedding =
            embed_checked(self.embedder.as_ref(), question, EmbeddingPurpose::Query).await?;
        let matches = self
            .store
            .similarity_search(&query_embedding, self.match_count)
            .await?;
        debug!("Retrieved {} chunks for question", matches.len());

        if matches.is_empty() {
            let answer = Answer::not_found();
            self.record(question, &answer, started).await;
            return Ok(answer);
        }

        let messages = [
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(build_user_prompt(&build_context(&matches), question)),
        ];
        let reply = self.chat.complete(&messages).await?;

        let answer = Answer {
            text: reply.unwrap_or_else(|| NO_RESPONSE_ANSWER.to_string()),
            found_results: true,
            sources: matches.into_iter().map(|m| m.metadata.source).collect(),
        };
        info!("Answered question in {} ms", started.elapsed().as_millis());

        self.record(question, &answer, started).await;
        Ok(answer)
    }

    async fn record(&self, question: &str, answer: &Answer, started: Instant) {
        let Some(log) = &self.log else {
            return;
        };

        let entry = QueryLogEntry {
            query: question.to_string(),
            response: answer.text.clone(),
            response_time_ms: i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX),
            found_results: answer.found_results,
        };

        if let Err(e) = log.record(&entry).await {
            warn!("Failed to log query: {}", e);
        }
    }
}

/// Join matches in the order given, each prefixed with its source
#[inline]
pub fn build_context(matches: &[SearchMatch]) -> String {
    matches
        .iter()
        .map(|m| format!("Source: {}\n{}", m.metadata.source, m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[inline]
pub fn build_user_prompt(context: &str, question: &str) -> String {
    format!(
        "Context from the portfolio:\n{}\n\nQuestion: {}\n\nAnswer:",
        context, question
    )
}
