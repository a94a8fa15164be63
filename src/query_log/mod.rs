//! Optional persistence of answered queries.
//!
//! Failures here never affect the answer returned to the caller; the query
//! orchestrator logs them and moves on.

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use serde::Serialize;

use crate::database::{Database, NewQueryLog, QueryLogQueries};
use crate::store::SupabaseClient;
use crate::{Result, WisestError};

/// One answered query as persisted by a [`QueryLog`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryLogEntry {
    pub query: String,
    pub response: String,
    pub response_time_ms: i64,
    pub found_results: bool,
}

#[async_trait]
pub trait QueryLog: Send + Sync {
    async fn record(&self, entry: &QueryLogEntry) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct SqliteQueryLog {
    database: Database,
}

impl SqliteQueryLog {
    #[inline]
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl QueryLog for SqliteQueryLog {
    async fn record(&self, entry: &QueryLogEntry) -> Result<()> {
        let row = NewQueryLog {
            query: entry.query.clone(),
            response: entry.response.clone(),
            response_time_ms: entry.response_time_ms,
            found_results: entry.found_results,
        };

        QueryLogQueries::create(self.database.pool(), &row)
            .await
            .map_err(|e| WisestError::Database(format!("{:#}", e)))?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SupabaseQueryLog {
    client: SupabaseClient,
    table: String,
}

impl SupabaseQueryLog {
    #[inline]
    pub fn new(client: SupabaseClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

#[async_trait]
impl QueryLog for SupabaseQueryLog {
    async fn record(&self, entry: &QueryLogEntry) -> Result<()> {
        self.client.insert(&self.table, entry).await
    }
}
