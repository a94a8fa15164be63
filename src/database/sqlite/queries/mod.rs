
use super::models::*;
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::debug;

pub struct DecisionQueries;

impl DecisionQueries {
    /// Insert or replace the decision stored under `id`
    #[inline]
    pub async fn save(pool: &SqlitePool, id: &str, data: &str) -> Result<DecisionRecord> {
        let now = Utc::now().naive_utc();
        sqlx::query(
            "INSERT INTO decisions (id, data, created_date) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data",
        )
        .bind(id)
        .bind(data)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to save decision")?;

        Self::get_by_id(pool, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve saved decision"))
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<DecisionRecord>> {
        let result = sqlx::query_as::<_, DecisionRecord>(
            "SELECT id, data, created_date FROM decisions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get decision by id")?;

        Ok(result)
    }

    /// Returns whether a decision was removed
    #[inline]
    pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM decisions WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to delete decision")?;

        Ok(result.rows_affected() > 0)
    }
}

pub struct QueryLogQueries;

impl QueryLogQueries {
    #[inline]
    pub async fn create(pool: &SqlitePool, entry: &NewQueryLog) -> Result<i64> {
        let id = sqlx::query(
            "INSERT INTO query_logs (query, response, response_time_ms, found_results, created_date)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&entry.query)
        .bind(&entry.response)
        .bind(entry.response_time_ms)
        .bind(entry.found_results)
        .bind(Utc::now().naive_utc())
        .execute(pool)
        .await
        .context("Failed to insert query log")?
        .last_insert_rowid();

        Ok(id)
    }

    #[inline]
    pub async fn list_recent(pool: &SqlitePool, limit: i64) -> Result<Vec<QueryLogRow>> {
        let results = sqlx::query_as::<_, QueryLogRow>(
            "SELECT id, query, response, response_time_ms, found_results, created_date
             FROM query_logs ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to list query logs")?;

        Ok(results)
    }
}

pub struct DocumentQueries;

impl DocumentQueries {
    #[inline]
    pub async fn insert(pool: &SqlitePool, row: &NewDocumentRow) -> Result<i64> {
        let id = sqlx::query(
            "INSERT INTO documents (chunk_id, content, metadata, embedding, created_date)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&row.chunk_id)
        .bind(&row.content)
        .bind(&row.metadata)
        .bind(&row.embedding)
        .bind(Utc::now().naive_utc())
        .execute(pool)
        .await
        .context("Failed to insert document")?
        .last_insert_rowid();

        debug!("Inserted document row {} for chunk {}", id, row.chunk_id);
        Ok(id)
    }

    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<DocumentRow>> {
        let results = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, chunk_id, content, metadata, embedding, created_date
             FROM documents ORDER BY id",
        )
        .fetch_all(pool)
        .await
        .context("Failed to list documents")?;

        Ok(results)
    }

    #[inline]
    pub async fn chunk_ids(pool: &SqlitePool) -> Result<HashSet<String>> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT chunk_id FROM documents")
            .fetch_all(pool)
            .await
            .context("Failed to list chunk ids")?;

        Ok(ids.into_iter().collect())
    }

    /// Remove every stored document, returning how many were deleted
    #[inline]
    pub async fn delete_all(pool: &SqlitePool) -> Result<u64> {
        let result = sqlx::query("DELETE FROM documents")
            .execute(pool)
            .await
            .context("Failed to clear documents")?;

        Ok(result.rows_affected())
    }
}
