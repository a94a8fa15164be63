#[cfg(test)]
mod tests;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::{SearchMatch, StoredRecord, VectorStore};
use crate::chunking::ChunkMetadata;
use crate::http::HttpClient;
use crate::{Result, WisestError};

/// Page size used when listing rows; PostgREST caps responses at 1000 by default
const PAGE_SIZE: usize = 1000;

/// Thin PostgREST client for a Supabase project
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    rest_url: Url,
    http: HttpClient,
}

impl SupabaseClient {
    #[inline]
    pub fn new(project_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let rest_url = Url::parse(project_url)
            .and_then(|base| base.join("/rest/v1/"))
            .map_err(|e| WisestError::Config(format!("Invalid Supabase URL: {}", e)))?;

        let http = HttpClient::new(timeout)
            .with_header("apikey", api_key)
            .with_bearer_token(api_key);

        Ok(Self { rest_url, http })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.rest_url
            .join(path)
            .map_err(|e| WisestError::Store(format!("Failed to build URL for {}: {}", path, e)))
    }

    #[inline]
    pub async fn insert<T: Serialize + Sync>(&self, table: &str, row: &T) -> Result<()> {
        let url = self.endpoint(table)?;
        self.http
            .post_json(&url, row, &[("Prefer", "return=minimal")])
            .await?;
        Ok(())
    }

    #[inline]
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        columns: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<T>> {
        let mut url = self.endpoint(table)?;
        url.query_pairs_mut()
            .append_pair("select", columns)
            .append_pair("order", "id.asc")
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());

        Ok(self.http.get_json(&url).await?)
    }

    /// Delete rows matching a PostgREST filter such as `("id", "neq.0")`
    #[inline]
    pub async fn delete_where(&self, table: &str, column: &str, filter: &str) -> Result<()> {
        let mut url = self.endpoint(table)?;
        url.query_pairs_mut().append_pair(column, filter);
        self.http.delete(&url).await?;
        Ok(())
    }

    #[inline]
    pub async fn rpc<A: Serialize + Sync, T: DeserializeOwned>(
        &self,
        function: &str,
        args: &A,
    ) -> Result<T> {
        let url = self.endpoint(&format!("rpc/{}", function))?;
        Ok(self.http.post_json_for(&url, args).await?)
    }
}

/// Vector store backed by a Supabase table plus a `match_documents`-style RPC
#[derive(Debug, Clone)]
pub struct SupabaseVectorStore {
    client: SupabaseClient,
    table: String,
    match_function: String,
}

#[derive(Debug, Serialize)]
struct InsertRow<'a> {
    content: &'a str,
    metadata: &'a ChunkMetadata,
    embedding: &'a [f32],
}

#[derive(Debug, Serialize)]
struct MatchArgs<'a> {
    query_embedding: &'a [f32],
    match_count: usize,
}

#[derive(Debug, Deserialize)]
struct MetadataRow {
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

impl SupabaseVectorStore {
    #[inline]
    pub fn new(
        client: SupabaseClient,
        table: impl Into<String>,
        match_function: impl Into<String>,
    ) -> Self {
        Self {
            client,
            table: table.into(),
            match_function: match_function.into(),
        }
    }
}

#[async_trait]
impl VectorStore for SupabaseVectorStore {
    async fn upsert(&self, record: &StoredRecord) -> Result<()> {
        let row = InsertRow {
            content: &record.content,
            metadata: &record.metadata,
            embedding: &record.embedding,
        };
        self.client.insert(&self.table, &row).await?;
        debug!("Inserted {} into {}", record.id(), self.table);
        Ok(())
    }

    async fn similarity_search(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<SearchMatch>> {
        let args = MatchArgs {
            query_embedding,
            match_count: k,
        };
        let matches: Vec<SearchMatch> = self.client.rpc(&self.match_function, &args).await?;
        debug!("{} returned {} matches", self.match_function, matches.len());
        Ok(matches)
    }

    async fn clear(&self) -> Result<()> {
        self.client.delete_where(&self.table, "id", "neq.0").await?;
        info!("Cleared table {}", self.table);
        Ok(())
    }

    async fn list_existing_ids(&self) -> Result<HashSet<String>> {
        let mut ids = HashSet::new();
        let mut offset = 0;

        loop {
            let rows: Vec<MetadataRow> = self
                .client
                .select(&self.table, "metadata", PAGE_SIZE, offset)
                .await?;
            let fetched = rows.len();

            ids.extend(rows.into_iter().filter_map(|row| {
                row.metadata?
                    .get("id")
                    .and_then(|id| id.as_str())
                    .map(String::from)
            }));

            if fetched < PAGE_SIZE {
                break;
            }
            offset += fetched;
        }

        Ok(ids)
    }
}
