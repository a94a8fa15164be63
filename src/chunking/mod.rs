
pub mod ids;

pub use ids::{ChunkMetadata, IdentifiedChunk, assign_ids};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::documents::Document;

/// A slice of a document's text, carrying the document's source and page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub content: String,
    pub source: String,
    pub page: u32,
}

/// Configuration for the recursive character splitter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk length in characters
    pub chunk_size: usize,
    /// Characters shared between neighbouring chunks
    pub chunk_overlap: usize,
    /// Boundaries tried in order; the empty string means a hard cut between characters
    pub separators: Vec<String>,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 80,
            separators: ["\n\n", "\n", ". ", " ", ""]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Deterministic recursive splitter: paragraph, line, sentence, word, then character.
///
/// Separators stay attached to the end of the piece they terminate and every
/// emitted chunk is whitespace-trimmed, so identical input always yields the
/// identical chunk sequence.
#[derive(Debug, Clone)]
pub struct ChunkSplitter {
    config: ChunkingConfig,
}

impl ChunkSplitter {
    #[inline]
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Split every document in order, copying its source and page onto each chunk
    #[inline]
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.content)
                    .into_iter()
                    .map(|content| Chunk {
                        content,
                        source: doc.source.clone(),
                        page: doc.page,
                    })
            })
            .collect();

        debug!(
            "Split {} documents into {} chunks",
            documents.len(),
            chunks.len()
        );

        chunks
    }

    #[inline]
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.config.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        // First separator present in the text wins; the ones after it are kept for oversized pieces
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut good_splits: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.config.chunk_size {
                good_splits.push(piece);
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits));
                good_splits.clear();
            }

            if remaining.is_empty() {
                if let Some(chunk) = trimmed(piece) {
                    final_chunks.push(chunk);
                }
            } else {
                final_chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits));
        }

        final_chunks
    }

    /// Greedily pack small pieces into chunks, carrying a tail of up to
    /// `chunk_overlap` characters into the next chunk
    fn merge_splits(&self, splits: &[&str]) -> Vec<String> {
        let chunk_size = self.config.chunk_size;
        let chunk_overlap = self.config.chunk_overlap;

        let mut docs = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut start = 0;
        let mut total = 0;

        for &piece in splits {
            let len = char_len(piece);

            if total + len > chunk_size {
                if total > chunk_size {
                    warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total, chunk_size
                    );
                }

                if start < current.len() {
                    if let Some(doc) = trimmed(&current[start..].concat()) {
                        docs.push(doc);
                    }

                    while total > chunk_overlap || (total + len > chunk_size && total > 0) {
                        total -= char_len(current[start]);
                        start += 1;
                    }
                }
            }

            current.push(piece);
            total += len;
        }

        if let Some(doc) = trimmed(&current[start..].concat()) {
            docs.push(doc);
        }

        docs
    }
}

/// Split `text` after every occurrence of `separator`, keeping the separator at
/// the end of the piece it closes. An empty separator splits into characters.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (index, matched) in text.match_indices(separator) {
        let end = index + matched.len();
        pieces.push(&text[start..end]);
        start = end;
    }
    pieces.push(&text[start..]);

    pieces.retain(|piece| !piece.is_empty());
    pieces
}

fn trimmed(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[inline]
fn char_len(text: &str) -> usize {
    text.chars().count()
}
