
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::{SearchMatch, StoredRecord, VectorStore};
use crate::chunking::ChunkMetadata;
use crate::database::sqlite::models::{decode_embedding, encode_embedding};
use crate::database::{Database, DocumentQueries, NewDocumentRow};
use crate::{Result, WisestError};

/// Local vector store: rows live in SQLite and similarity is scored in process
#[derive(Debug, Clone)]
pub struct SqliteVectorStore {
    database: Database,
}

impl SqliteVectorStore {
    #[inline]
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

fn store_error(error: anyhow::Error) -> WisestError {
    WisestError::Store(format!("{:#}", error))
}

/// Cosine similarity, or `None` when lengths differ or either vector is zero
#[inline]
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn upsert(&self, record: &StoredRecord) -> Result<()> {
        let metadata = serde_json::to_string(&record.metadata)
            .map_err(|e| WisestError::Store(format!("Failed to encode metadata: {}", e)))?;

        let row = NewDocumentRow {
            chunk_id: record.id().to_string(),
            content: record.content.clone(),
            metadata,
            embedding: encode_embedding(&record.embedding),
        };

        DocumentQueries::insert(self.database.pool(), &row)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn similarity_search(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<SearchMatch>> {
        let rows = DocumentQueries::list_all(self.database.pool())
            .await
            .map_err(store_error)?;

        let mut scored: Vec<SearchMatch> = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(embedding) = decode_embedding(&row.embedding) else {
                warn!("Skipping chunk {} with a corrupt embedding", row.chunk_id);
                continue;
            };
            let Some(score) = cosine_similarity(query_embedding, &embedding) else {
                warn!(
                    "Skipping chunk {}: embedding has {} dimensions, query has {}",
                    row.chunk_id,
                    embedding.len(),
                    query_embedding.len()
                );
                continue;
            };

            let metadata = serde_json::from_str(&row.metadata).unwrap_or_else(|_| ChunkMetadata {
                id: row.chunk_id.clone(),
                source: String::new(),
                page: 0,
            });

            scored.push(SearchMatch {
                content: row.content,
                metadata,
                score: Some(score),
            });
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
        });
        scored.truncate(k);

        debug!("Local similarity search returned {} matches", scored.len());
        Ok(scored)
    }

    async fn clear(&self) -> Result<()> {
        let removed = DocumentQueries::delete_all(self.database.pool())
            .await
            .map_err(store_error)?;
        info!("Removed {} stored chunks", removed);
        Ok(())
    }

    async fn list_existing_ids(&self) -> Result<HashSet<String>> {
        DocumentQueries::chunk_ids(self.database.pool())
            .await
            .map_err(store_error)
    }
}
