// Embeddings module
// One embedding capability shared by ingestion and query


pub mod cohere;

use async_trait::async_trait;

pub use cohere::CohereClient;

/// Which side of retrieval a text is embedded for. Both sides use the same
/// model and dimensionality; providers may tune the vector to the purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingPurpose {
    Document,
    Query,
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text; the vector length always equals [`Embedder::dimension`]
    async fn embed(&self, text: &str, purpose: EmbeddingPurpose) -> crate::Result<Vec<f32>>;

    fn dimension(&self) -> usize;
}

/// Embed `text`, rejecting a vector whose length is not `embedder.dimension()`.
///
/// Vectors of mixed length in one store make similarity scores meaningless,
/// so both pipelines go through this check.
#[inline]
pub async fn embed_checked(
    embedder: &dyn Embedder,
    text: &str,
    purpose: EmbeddingPurpose,
) -> crate::Result<Vec<f32>> {
    let embedding = embedder.embed(text, purpose).await?;
    if embedding.len() != embedder.dimension() {
        return Err(crate::WisestError::Embedding(format!(
            "Expected {} dimensions, got {}",
            embedder.dimension(),
            embedding.len()
        )));
    }
    Ok(embedding)
}
