// Vector store module
// Remote (Supabase) and local (SQLite) implementations of the same capability

pub mod sqlite;
pub mod supabase;

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;

use crate::chunking::ChunkMetadata;

pub use sqlite::SqliteVectorStore;
pub use supabase::{SupabaseClient, SupabaseVectorStore};

/// Persisted unit: chunk text, its metadata (including the chunk id) and embedding
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub content: String,
    pub metadata: ChunkMetadata,
    pub embedding: Vec<f32>,
}

impl StoredRecord {
    #[inline]
    pub fn id(&self) -> &str {
        &self.metadata.id
    }
}

/// One nearest-neighbour hit, closest first in any returned list
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchMatch {
    pub content: String,
    pub metadata: ChunkMetadata,
    #[serde(default, alias = "similarity")]
    pub score: Option<f32>,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert a record. Duplicate ids are filtered by the caller, not the store.
    async fn upsert(&self, record: &StoredRecord) -> crate::Result<()>;

    /// The `k` records nearest to `query_embedding`, closest first
    async fn similarity_search(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> crate::Result<Vec<SearchMatch>>;

    /// Delete every record
    async fn clear(&self) -> crate::Result<()>;

    /// Chunk ids of everything currently stored
    async fn list_existing_ids(&self) -> crate::Result<HashSet<String>>;
}
