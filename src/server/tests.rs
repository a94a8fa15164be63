use super::*;
use crate::chunking::ChunkMetadata;
use crate::config::ServerConfig;
use crate::store::StoredRecord;
use crate::testing::{FakeChat, FakeEmbedder, MemoryStore};
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

struct Fixture {
    _dir: TempDir,
    router: Router,
}

async fn fixture(store: MemoryStore, chat: FakeChat) -> Fixture {
    let dir = TempDir::new().expect("should create TempDir successfully");
    let database = Database::new(dir.path().join("server.db"))
        .await
        .expect("should open database");
    let chat: Arc<FakeChat> = Arc::new(chat);

    let state = AppState {
        query: Arc::new(QueryEngine::new(
            Arc::new(FakeEmbedder::default()),
            Arc::new(store),
            chat.clone(),
            "system",
        )),
        advisor: Arc::new(Advisor::new(chat.clone())),
        affirmations: Arc::new(AffirmationGenerator::new(chat)),
        database,
    };

    let config = ServerConfig {
        allowed_origins: vec!["http://localhost:3000".to_string()],
        ..ServerConfig::default()
    };

    Fixture {
        _dir: dir,
        router: build_router(state, &config),
    }
}

fn stocked_store() -> MemoryStore {
    let store = MemoryStore::default();
    store.records.lock().expect("lock").push(StoredRecord {
        content: "Built a decision app.".to_string(),
        metadata: ChunkMetadata {
            id: "RAG/projects.md:0:0".to_string(),
            source: "RAG/projects.md".to_string(),
            page: 0,
        },
        embedding: vec![1.0, 0.0],
    });
    store
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body should be json")
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

#[tokio::test]
async fn status_endpoints() {
    let f = fixture(MemoryStore::default(), FakeChat::default()).await;

    let (status, body) = send(&f.router, get("/test")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "API is working!"}));

    let (status, body) = send(&f.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy", "message": "Backend is running!"}));
}

#[tokio::test]
async fn chat_answers_from_the_pipeline() {
    let f = fixture(stocked_store(), FakeChat::replying("She built a decision app.")).await;

    let (status, body) = send(
        &f.router,
        post_json("/chat", json!({"message": "What has she built?"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"answer": "She built a decision app."}));
}

#[tokio::test]
async fn chat_with_empty_store_returns_not_found_answer() {
    let f = fixture(MemoryStore::default(), FakeChat::replying("unused")).await;

    let (status, body) = send(&f.router, post_json("/chat", json!({"message": "Hi?"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], crate::query::NOT_FOUND_ANSWER);
}

#[tokio::test]
async fn chat_requires_a_message() {
    let f = fixture(MemoryStore::default(), FakeChat::default()).await;

    let (status, body) = send(&f.router, post_json("/chat", json!({"message": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Message is required"}));

    let (status, _) = send(&f.router, post_json("/chat", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_failure_returns_apology_with_500() {
    let store = MemoryStore {
        unreachable: true,
        ..MemoryStore::default()
    };
    let f = fixture(store, FakeChat::default()).await;

    let (status, body) = send(&f.router, post_json("/chat", json!({"message": "Hi?"}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"answer": routes::CHAT_FAILURE_ANSWER}));
}

#[tokio::test]
async fn wisest_returns_feedback() {
    let f = fixture(MemoryStore::default(), FakeChat::replying("**Choose A**")).await;

    let (status, body) = send(
        &f.router,
        post_json(
            "/wisest",
            json!({
                "options": ["A", "B"],
                "scores": [{"option": "A", "score": 1.5}, {"option": "B", "score": 1.0}],
                "best_decision": "A",
                "main_Consideration": "daily routine"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"feedback": "**Choose A**"}));
}

#[tokio::test]
async fn wisest_maps_empty_output_and_errors_to_500() {
    let f = fixture(MemoryStore::default(), FakeChat::default()).await;
    let (status, body) = send(&f.router, post_json("/wisest", json!({"options": ["A"]}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to generate feedback"}));

    let failing = FakeChat {
        fail: true,
        ..FakeChat::default()
    };
    let f = fixture(MemoryStore::default(), failing).await;
    let (status, body) = send(&f.router, post_json("/wisest", json!({"options": ["A"]}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        body["error"]
            .as_str()
            .is_some_and(|e| e.contains("model overloaded"))
    );
}

#[tokio::test]
async fn affirmation_round_trip_and_validation() {
    let f = fixture(MemoryStore::default(), FakeChat::replying("You showed up today.")).await;

    let (status, body) = send(
        &f.router,
        post_json("/affirmation", json!({"entry": "Went for a run.", "mood": "tired"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"affirmation": "You showed up today."}));

    let (status, _) = send(&f.router, post_json("/affirmation", json!({"entry": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn decisions_can_be_saved_fetched_and_deleted() {
    let f = fixture(MemoryStore::default(), FakeChat::default()).await;
    let decision = json!({"id": 42, "title": "Which city?", "options": ["A", "B"]});

    let (status, body) = send(
        &f.router,
        post_json("/save-decision", json!({"body": decision.to_string()})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Decision saved successfully", "id": "42"}));

    let (status, body) = send(&f.router, get("/decision/42")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "42");
    assert_eq!(body["data"], decision);
    let timestamp = body["timestamp"].as_str().expect("timestamp is a string");
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());

    let delete = Request::builder()
        .method("DELETE")
        .uri("/delete-decision/42")
        .body(Body::empty())
        .expect("request builds");
    let (status, body) = send(&f.router, delete).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Decision deleted successfully"}));

    let (status, body) = send(&f.router, get("/decision/42")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Decision not found"}));
}

#[tokio::test]
async fn decision_without_id_gets_a_generated_one() {
    let f = fixture(MemoryStore::default(), FakeChat::default()).await;

    let (status, body) = send(
        &f.router,
        post_json("/save-decision", json!({"body": "{\"title\": \"untitled\"}"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_str().expect("id is a string");
    assert!(uuid::Uuid::parse_str(id).is_ok());

    let (status, _) = send(&f.router, get(&format!("/decision/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn invalid_decision_body_is_rejected() {
    let f = fixture(MemoryStore::default(), FakeChat::default()).await;

    let (status, _) = send(
        &f.router,
        post_json("/save-decision", json!({"body": "not json"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_unknown_decision_is_404() {
    let f = fixture(MemoryStore::default(), FakeChat::default()).await;
    let delete = Request::builder()
        .method("DELETE")
        .uri("/delete-decision/missing")
        .body(Body::empty())
        .expect("request builds");

    let (status, body) = send(&f.router, delete).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Decision not found"}));
}

#[tokio::test]
async fn cors_allows_configured_origin_only() {
    let f = fixture(MemoryStore::default(), FakeChat::default()).await;

    let allowed = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .expect("request builds");
    let response = f.router.clone().oneshot(allowed).await.expect("response");
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:3000")
    );

    let denied = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://evil.example")
        .body(Body::empty())
        .expect("request builds");
    let response = f.router.clone().oneshot(denied).await.expect("response");
    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}
