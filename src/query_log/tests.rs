use super::*;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn entry() -> QueryLogEntry {
    QueryLogEntry {
        query: "What projects?".to_string(),
        response: "A decision app.".to_string(),
        response_time_ms: 42,
        found_results: true,
    }
}

#[tokio::test]
async fn sqlite_log_persists_entries() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let database = Database::new(temp_dir.path().join("log.db"))
        .await
        .expect("should open database");
    let log = SqliteQueryLog::new(database.clone());

    log.record(&entry()).await.expect("record should succeed");

    let rows = QueryLogQueries::list_recent(database.pool(), 10)
        .await
        .expect("should list logs");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].query, "What projects?");
    assert_eq!(rows[0].response_time_ms, 42);
    assert!(rows[0].found_results);
}

#[tokio::test]
async fn supabase_log_inserts_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/query_logs"))
        .and(body_json(serde_json::json!({
            "query": "What projects?",
            "response": "A decision app.",
            "response_time_ms": 42,
            "found_results": true
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        SupabaseClient::new(&server.uri(), "key", Duration::from_secs(5)).expect("client builds");
    let log = SupabaseQueryLog::new(client, "query_logs");

    log.record(&entry()).await.expect("record should succeed");
}

#[tokio::test]
async fn supabase_log_reports_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client =
        SupabaseClient::new(&server.uri(), "key", Duration::from_secs(5)).expect("client builds");
    let log = SupabaseQueryLog::new(client, "query_logs");

    assert!(log.record(&entry()).await.is_err());
}
