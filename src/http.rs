//! Blocking HTTP plumbing shared by every hosted-provider client.
//!
//! All outbound calls go through [`HttpClient`], which wraps a `ureq` agent and
//! runs each request on tokio's blocking pool so the async callers never stall
//! a runtime worker. Requests are attempted exactly once.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Failure talking to a hosted provider (embedding, chat, vector store, GitHub).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Transport error calling {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Failed to encode request for {url}: {message}")]
    Encode { url: String, message: String },

    #[error("Request to {url} was interrupted")]
    Interrupted { url: String },
}

impl ProviderError {
    #[inline]
    pub fn status(&self) -> Option<u16> {
        match *self {
            Self::Status { status, .. } => Some(status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Method {
    Get,
    Post,
    Delete,
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
    headers: Vec<(String, String)>,
}

impl HttpClient {
    #[inline]
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();

        Self {
            agent,
            headers: Vec::new(),
        }
    }

    /// Attach a header sent with every request made by this client.
    #[inline]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[inline]
    pub fn with_bearer_token(self, token: &str) -> Self {
        self.with_header("Authorization", format!("Bearer {}", token))
    }

    #[inline]
    pub async fn get_text(&self, url: &Url) -> Result<String, ProviderError> {
        self.execute(Method::Get, url, None, &[]).await
    }

    #[inline]
    pub async fn get_json<R: DeserializeOwned>(&self, url: &Url) -> Result<R, ProviderError> {
        let text = self.get_text(url).await?;
        decode(url, &text)
    }

    #[inline]
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &Url,
        body: &B,
        extra_headers: &[(&str, &str)],
    ) -> Result<String, ProviderError> {
        let body = serde_json::to_string(body).map_err(|e| ProviderError::Encode {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        self.execute(Method::Post, url, Some(body), extra_headers)
            .await
    }

    #[inline]
    pub async fn post_json_for<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        url: &Url,
        body: &B,
    ) -> Result<R, ProviderError> {
        let text = self.post_json(url, body, &[]).await?;
        decode(url, &text)
    }

    #[inline]
    pub async fn delete(&self, url: &Url) -> Result<String, ProviderError> {
        self.execute(Method::Delete, url, None, &[]).await
    }

    async fn execute(
        &self,
        method: Method,
        url: &Url,
        body: Option<String>,
        extra_headers: &[(&str, &str)],
    ) -> Result<String, ProviderError> {
        let agent = self.agent.clone();
        let mut headers = self.headers.clone();
        headers.extend(
            extra_headers
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string())),
        );
        let target = url.to_string();

        debug!("{:?} {}", method, redact(url));

        let task_url = target.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            send_blocking(&agent, method, &task_url, &headers, body.as_deref())
        })
        .await
        .map_err(|_| ProviderError::Interrupted {
            url: target.clone(),
        })?;

        outcome.map_err(|error| classify(&target, error))
    }
}

fn send_blocking(
    agent: &ureq::Agent,
    method: Method,
    url: &str,
    headers: &[(String, String)],
    body: Option<&str>,
) -> Result<String, ureq::Error> {
    match method {
        Method::Get | Method::Delete => {
            let mut request = if matches!(method, Method::Get) {
                agent.get(url)
            } else {
                agent.delete(url)
            };
            for (name, value) in headers {
                request = request.header(name, value);
            }
            request
                .call()
                .and_then(|mut resp| resp.body_mut().read_to_string())
        }
        Method::Post => {
            let mut request = agent.post(url).header("Content-Type", "application/json");
            for (name, value) in headers {
                request = request.header(name, value);
            }
            request
                .send(body.unwrap_or("{}"))
                .and_then(|mut resp| resp.body_mut().read_to_string())
        }
    }
}

fn classify(url: &str, error: ureq::Error) -> ProviderError {
    let url = strip_query(url);
    match error {
        ureq::Error::StatusCode(status) => {
            warn!("Provider returned HTTP {} for {}", status, url);
            ProviderError::Status { url, status }
        }
        other => {
            warn!("Transport error for {}: {}", url, other);
            ProviderError::Transport {
                url,
                message: other.to_string(),
            }
        }
    }
}

fn decode<R: DeserializeOwned>(url: &Url, text: &str) -> Result<R, ProviderError> {
    serde_json::from_str(text).map_err(|e| ProviderError::Decode {
        url: redact(url),
        message: e.to_string(),
    })
}

/// Query strings may carry API keys (Gemini), so they never reach logs or errors.
fn redact(url: &Url) -> String {
    strip_query(url.as_str())
}

fn strip_query(url: &str) -> String {
    url.split('?').next().unwrap_or(url).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Echo {
        value: String,
    }

    fn client() -> HttpClient {
        HttpClient::new(Duration::from_secs(5)).with_header("apikey", "secret")
    }

    #[tokio::test]
    async fn post_sends_json_and_default_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(header("apikey", "secret"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(serde_json::json!({"value": "hi"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": "hi"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/echo", server.uri())).expect("valid url");
        let echo: Echo = client()
            .post_json_for(&url, &serde_json::json!({"value": "hi"}))
            .await
            .expect("request should succeed");

        assert_eq!(echo.value, "hi");
    }

    #[tokio::test]
    async fn server_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/broken", server.uri())).expect("valid url");
        let err = client().get_text(&url).await.expect_err("503 should fail");

        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/x?key=topsecret", server.uri())).expect("valid url");
        let err = client()
            .get_json::<Echo>(&url)
            .await
            .expect_err("decode should fail");

        match err {
            ProviderError::Decode { url, .. } => assert!(!url.contains("topsecret")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn redact_drops_query_string() {
        let url = Url::parse("https://example.com/v1/models?key=abc").expect("valid url");
        assert_eq!(redact(&url), "https://example.com/v1/models");
    }
}
