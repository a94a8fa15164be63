use super::*;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store_for(server: &MockServer) -> SupabaseVectorStore {
    let client = SupabaseClient::new(&server.uri(), "sb-key", Duration::from_secs(5))
        .expect("client builds");
    SupabaseVectorStore::new(client, "documents", "match_documents")
}

fn record(id: &str) -> StoredRecord {
    StoredRecord {
        content: "chunk text".to_string(),
        metadata: ChunkMetadata {
            id: id.to_string(),
            source: "RAG/about.md".to_string(),
            page: 0,
        },
        embedding: vec![0.5, 0.25],
    }
}

#[tokio::test]
async fn upsert_posts_row_with_auth_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/documents"))
        .and(header("apikey", "sb-key"))
        .and(header("Authorization", "Bearer sb-key"))
        .and(header("Prefer", "return=minimal"))
        .and(body_json(serde_json::json!({
            "content": "chunk text",
            "metadata": {"id": "RAG/about.md:0:0", "source": "RAG/about.md", "page": 0},
            "embedding": [0.5, 0.25]
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    store_for(&server)
        .upsert(&record("RAG/about.md:0:0"))
        .await
        .expect("upsert should succeed");
}

#[tokio::test]
async fn similarity_search_calls_match_rpc() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/match_documents"))
        .and(body_json(serde_json::json!({
            "query_embedding": [1.0, 0.0],
            "match_count": 5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "content": "best",
                "metadata": {"id": "a.md:0:0", "source": "a.md", "page": 0},
                "similarity": 0.75
            },
            {
                "content": "second",
                "metadata": {"source": "b.md", "extra": true}
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let matches = store_for(&server)
        .similarity_search(&[1.0, 0.0], 5)
        .await
        .expect("search should succeed");

    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].content, "best");
    assert_eq!(matches[0].score, Some(0.75));
    assert_eq!(matches[1].metadata.source, "b.md");
    assert_eq!(matches[1].score, None);
}

#[tokio::test]
async fn clear_deletes_with_catch_all_filter() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/documents"))
        .and(query_param("id", "neq.0"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    store_for(&server).clear().await.expect("clear should succeed");
}

#[tokio::test]
async fn list_existing_ids_skips_rows_without_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/documents"))
        .and(query_param("select", "metadata"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"metadata": {"id": "a.md:0:0"}},
            {"metadata": {"id": "a.md:0:1"}},
            {"metadata": null},
            {"metadata": {"source": "orphan"}}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let ids = store_for(&server)
        .list_existing_ids()
        .await
        .expect("listing should succeed");

    let expected: HashSet<String> = ["a.md:0:0", "a.md:0:1"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn list_existing_ids_follows_pages_until_a_short_one() {
    let server = MockServer::start().await;
    let full_page: Vec<serde_json::Value> = (0..PAGE_SIZE)
        .map(|i| serde_json::json!({"metadata": {"id": format!("big.md:0:{i}")}}))
        .collect();

    Mock::given(method("GET"))
        .and(path("/rest/v1/documents"))
        .and(query_param("limit", "1000"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(full_page))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/documents"))
        .and(query_param("limit", "1000"))
        .and(query_param("offset", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"metadata": {"id": "small.md:0:0"}},
            {"metadata": {"id": "small.md:0:1"}}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let ids = store_for(&server)
        .list_existing_ids()
        .await
        .expect("listing should succeed");

    assert_eq!(ids.len(), PAGE_SIZE + 2);
    assert!(ids.contains("big.md:0:0"));
    assert!(ids.contains("big.md:0:999"));
    assert!(ids.contains("small.md:0:1"));
    let requests = server
        .received_requests()
        .await
        .expect("request recording is on");
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn unreachable_rpc_propagates_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = store_for(&server).similarity_search(&[0.0, 1.0], 5).await;

    assert!(matches!(result, Err(WisestError::Provider(_))));
}
