use super::*;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OpenAiCompatibleClient {
    let config = ChatConfig {
        base_url: format!("{}/openai/v1/", server.uri()),
        model: "llama-3.1-8b-instant".to_string(),
        ..ChatConfig::default()
    };
    OpenAiCompatibleClient::new(&config, "groq-key", Duration::from_secs(5)).expect("client builds")
}

#[tokio::test]
async fn sends_messages_and_returns_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(header("Authorization", "Bearer groq-key"))
        .and(body_json(serde_json::json!({
            "model": "llama-3.1-8b-instant",
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [
                {"message": {"role": "assistant", "content": "Hi there"}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .complete(&[ChatMessage::system("be brief"), ChatMessage::user("hello")])
        .await
        .expect("completion should succeed");

    assert_eq!(reply.as_deref(), Some("Hi there"));
}

#[tokio::test]
async fn missing_or_blank_content_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": []
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": "   "}}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let messages = [ChatMessage::user("hello")];

    assert_eq!(client.complete(&messages).await.expect("first call"), None);
    assert_eq!(client.complete(&messages).await.expect("second call"), None);
}

#[tokio::test]
async fn rate_limit_surfaces_as_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .complete(&[ChatMessage::user("hello")])
        .await
        .expect_err("429 should fail");

    match err {
        WisestError::Provider(provider) => assert_eq!(provider.status(), Some(429)),
        other => panic!("unexpected error: {other:?}"),
    }
}
