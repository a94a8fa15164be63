use thiserror::Error;

pub type Result<T> = std::result::Result<T, WisestError>;

#[derive(Error, Debug)]
pub enum WisestError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Provider error: {0}")]
    Provider(#[from] http::ProviderError),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Document source error: {0}")]
    Source(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for WisestError {
    #[inline]
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

pub mod advisor;
pub mod affirmation;
pub mod chat;
pub mod chunking;
pub mod commands;
pub mod config;
pub mod database;
pub mod documents;
pub mod embeddings;
pub mod http;
pub mod ingest;
pub mod query;
pub mod query_log;
pub mod server;
pub mod store;

#[cfg(test)]
mod testing;
