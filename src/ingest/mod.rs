// Ingestion module
// fetch documents -> split -> assign ids -> diff against the store -> embed + upsert each new chunk


use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::Result;
use crate::chunking::{ChunkSplitter, IdentifiedChunk, assign_ids};
use crate::documents::{Document, DocumentSource};
use crate::embeddings::{Embedder, EmbeddingPurpose, embed_checked};
use crate::store::{StoredRecord, VectorStore};

/// Counters describing one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
    /// Records already in the store before the run
    pub existing: usize,
    pub new_chunks: usize,
    pub added: usize,
    pub failed: usize,
}

/// Batch ingestion over injected embedding and storage capabilities
pub struct Ingestor {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    splitter: ChunkSplitter,
    throttle: Duration,
    progress: ProgressBar,
}

impl Ingestor {
    #[inline]
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        splitter: ChunkSplitter,
    ) -> Self {
        Self {
            embedder,
            store,
            splitter,
            throttle: Duration::ZERO,
            progress: ProgressBar::hidden(),
        }
    }

    /// Fixed pause between consecutive embedding calls
    #[inline]
    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    #[inline]
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Delete every stored record
    #[inline]
    pub async fn reset(&self) -> Result<()> {
        info!("Clearing vector store");
        self.store.clear().await
    }

    #[inline]
    pub async fn ingest_from(&self, source: &dyn DocumentSource) -> Result<IngestReport> {
        let documents = source.load().await?;
        info!("Loaded {} documents", documents.len());
        self.ingest_documents(&documents).await
    }

    /// Clear the store, then ingest `source`. A failed clear is logged and the
    /// run carries on against whatever the store still holds.
    #[inline]
    pub async fn reingest_from(&self, source: &dyn DocumentSource) -> Result<IngestReport> {
        if let Err(e) = self.reset().await {
            warn!("Error clearing vector store, continuing: {}", e);
        }
        self.ingest_from(source).await
    }

    /// Store every chunk of `documents` whose id is not already present.
    ///
    /// Only failing to list existing ids aborts the run. A chunk that fails to
    /// embed, comes back with the wrong dimension, or fails to upsert is logged
    /// and skipped; its id stays new, so the next run picks it up again.
    #[inline]
    pub async fn ingest_documents(&self, documents: &[Document]) -> Result<IngestReport> {
        let chunks = assign_ids(self.splitter.split_documents(documents));
        let existing = self.store.list_existing_ids().await?;
        info!("Number of records in the store: {}", existing.len());

        let mut report = IngestReport {
            documents: documents.len(),
            chunks: chunks.len(),
            existing: existing.len(),
            ..IngestReport::default()
        };

        let new_chunks: Vec<IdentifiedChunk> = chunks
            .into_iter()
            .filter(|chunk| !existing.contains(&chunk.id))
            .collect();
        report.new_chunks = new_chunks.len();

        if new_chunks.is_empty() {
            info!("No new chunks to add");
            return Ok(report);
        }
        info!("New chunks: {}", new_chunks.len());

        self.progress.set_position(0);
        self.progress.set_length(new_chunks.len() as u64);

        for (i, chunk) in new_chunks.iter().enumerate() {
            if i > 0 && !self.throttle.is_zero() {
                sleep(self.throttle).await;
            }

            self.progress.set_message(chunk.id.clone());
            match self.store_chunk(chunk).await {
                Ok(()) => {
                    debug!("Added {}", chunk.id);
                    report.added += 1;
                }
                Err(e) => {
                    error!("Failed to add {}: {}", chunk.id, e);
                    report.failed += 1;
                }
            }
            self.progress.inc(1);
        }

        self.progress.finish_and_clear();
        info!(
            "Ingestion finished: {} added, {} failed",
            report.added, report.failed
        );

        Ok(report)
    }

    async fn store_chunk(&self, chunk: &IdentifiedChunk) -> Result<()> {
        let embedding = embed_checked(
            self.embedder.as_ref(),
            &chunk.chunk.content,
            EmbeddingPurpose::Document,
        )
        .await?;

        let record = StoredRecord {
            content: chunk.chunk.content.clone(),
            metadata: chunk.metadata(),
            embedding,
        };
        self.store.upsert(&record).await
    }
}

/// Progress bar for interactive runs, hidden when stderr is not a terminal
#[inline]
pub fn progress_bar() -> ProgressBar {
    if !console::user_attended_stderr() {
        return ProgressBar::hidden();
    }

    let style = ProgressStyle::with_template("{bar:40} [{pos}/{len}] Embedding {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    ProgressBar::new(0).with_style(style)
}
