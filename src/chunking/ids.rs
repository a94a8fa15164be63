use serde::{Deserialize, Serialize};

use super::Chunk;

/// Metadata persisted alongside every stored chunk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub page: u32,
}

/// A chunk paired with its positional identifier `source:page:index`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifiedChunk {
    pub id: String,
    pub chunk: Chunk,
}

impl IdentifiedChunk {
    #[inline]
    pub fn metadata(&self) -> ChunkMetadata {
        ChunkMetadata {
            id: self.id.clone(),
            source: self.chunk.source.clone(),
            page: self.chunk.page,
        }
    }
}

/// Assign `source:page:index` identifiers in sequence order.
///
/// The index counts up while consecutive chunks share a `source:page` key and
/// restarts at zero whenever the key changes. Identifiers therefore depend on
/// ingestion order, not content: editing an early chunk of a file shifts every
/// later index in that file.
#[inline]
pub fn assign_ids(chunks: Vec<Chunk>) -> Vec<IdentifiedChunk> {
    let mut last_page_id: Option<String> = None;
    let mut index = 0usize;

    chunks
        .into_iter()
        .map(|chunk| {
            let page_id = format!("{}:{}", chunk.source, chunk.page);

            if last_page_id.as_deref() == Some(page_id.as_str()) {
                index += 1;
            } else {
                index = 0;
            }

            let id = format!("{}:{}", page_id, index);
            last_page_id = Some(page_id);

            IdentifiedChunk { id, chunk }
        })
        .collect()
}
