//! In-memory capability doubles shared by unit tests.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::chat::{ChatMessage, ChatModel};
use crate::embeddings::{Embedder, EmbeddingPurpose};
use crate::query_log::{QueryLog, QueryLogEntry};
use crate::store::{SearchMatch, StoredRecord, VectorStore};
use crate::{Result, WisestError};

/// Embeds text as `[char count, 1.0]`; fails for texts containing `fail_on`.
/// `advertised_dimension` overrides what `dimension()` reports.
#[derive(Debug, Default)]
pub struct FakeEmbedder {
    pub fail_on: Option<String>,
    pub advertised_dimension: Option<usize>,
    pub calls: Mutex<Vec<(String, EmbeddingPurpose)>>,
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str, purpose: EmbeddingPurpose) -> Result<Vec<f32>> {
        self.calls
            .lock()
            .expect("lock")
            .push((text.to_string(), purpose));
        if self.fail_on.as_deref().is_some_and(|needle| text.contains(needle)) {
            return Err(WisestError::Embedding("rate limited".to_string()));
        }
        Ok(vec![text.chars().count() as f32, 1.0])
    }

    fn dimension(&self) -> usize {
        self.advertised_dimension.unwrap_or(2)
    }
}

/// Keeps records in insertion order; search returns the first `k`
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub records: Mutex<Vec<StoredRecord>>,
    pub upserts: AtomicUsize,
    pub unreachable: bool,
    pub clear_fails: bool,
}

impl MemoryStore {
    pub fn ids(&self) -> Vec<String> {
        self.records
            .lock()
            .expect("lock")
            .iter()
            .map(|r| r.id().to_string())
            .collect()
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn upsert(&self, record: &StoredRecord) -> Result<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.records.lock().expect("lock").push(record.clone());
        Ok(())
    }

    async fn similarity_search(
        &self,
        _query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<SearchMatch>> {
        if self.unreachable {
            return Err(WisestError::Store("connection refused".to_string()));
        }
        Ok(self
            .records
            .lock()
            .expect("lock")
            .iter()
            .take(k)
            .map(|r| SearchMatch {
                content: r.content.clone(),
                metadata: r.metadata.clone(),
                score: None,
            })
            .collect())
    }

    async fn clear(&self) -> Result<()> {
        if self.clear_fails {
            return Err(WisestError::Store("permission denied".to_string()));
        }
        self.records.lock().expect("lock").clear();
        Ok(())
    }

    async fn list_existing_ids(&self) -> Result<HashSet<String>> {
        Ok(self.ids().into_iter().collect())
    }
}

/// Returns a canned reply and remembers every conversation it was sent
#[derive(Debug, Default)]
pub struct FakeChat {
    pub reply: Option<String>,
    pub fail: bool,
    pub calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeChat {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("lock").len()
    }

    pub fn last_call(&self) -> Vec<ChatMessage> {
        self.calls
            .lock()
            .expect("lock")
            .last()
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for FakeChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Option<String>> {
        self.calls.lock().expect("lock").push(messages.to_vec());
        if self.fail {
            return Err(WisestError::Other(anyhow::anyhow!("model overloaded")));
        }
        Ok(self.reply.clone())
    }
}

#[derive(Debug, Default)]
pub struct FakeLog {
    pub fail: bool,
    pub entries: Mutex<Vec<QueryLogEntry>>,
}

#[async_trait]
impl QueryLog for FakeLog {
    async fn record(&self, entry: &QueryLogEntry) -> Result<()> {
        if self.fail {
            return Err(WisestError::Database("table missing".to_string()));
        }
        self.entries.lock().expect("lock").push(entry.clone());
        Ok(())
    }
}
