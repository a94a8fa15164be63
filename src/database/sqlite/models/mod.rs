
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A saved decision, stored as the client's JSON document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DecisionRecord {
    pub id: String,
    pub data: String,
    pub created_date: NaiveDateTime,
}

impl DecisionRecord {
    #[inline]
    pub fn data_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct QueryLogRow {
    pub id: i64,
    pub query: String,
    pub response: String,
    pub response_time_ms: i64,
    pub found_results: bool,
    pub created_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQueryLog {
    pub query: String,
    pub response: String,
    pub response_time_ms: i64,
    pub found_results: bool,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DocumentRow {
    pub id: i64,
    pub chunk_id: String,
    pub content: String,
    pub metadata: String,
    pub embedding: Vec<u8>,
    pub created_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewDocumentRow {
    pub chunk_id: String,
    pub content: String,
    pub metadata: String,
    pub embedding: Vec<u8>,
}

/// Pack a vector as little-endian `f32`s
#[inline]
pub fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Inverse of [`encode_embedding`]; `None` if the blob is not a whole number of `f32`s
#[inline]
pub fn decode_embedding(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
    )
}
