//! HTTP boundary.
//!
//! Every capability is built once at startup and shared through [`AppState`];
//! handlers only translate between JSON and the library calls.

#[cfg(test)]
mod tests;

pub mod routes;

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, post};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::advisor::Advisor;
use crate::affirmation::AffirmationGenerator;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::query::QueryEngine;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub query: Arc<QueryEngine>,
    pub advisor: Arc<Advisor>,
    pub affirmations: Arc<AffirmationGenerator>,
    pub database: Database,
}

/// CORS for the configured origins; an empty list allows any origin
#[inline]
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.trim().parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    cors.allow_origin(origins)
}

#[inline]
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/test", get(routes::test))
        .route("/health", get(routes::health))
        .route("/chat", post(routes::chat))
        .route("/wisest", post(routes::wisest))
        .route("/affirmation", post(routes::affirmation))
        .route("/save-decision", post(routes::save_decision))
        .route("/decision/{id}", get(routes::get_decision))
        .route("/delete-decision/{id}", delete(routes::delete_decision))
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Bind `host:port` and serve until the process is stopped
#[inline]
pub async fn serve(state: AppState, config: &ServerConfig) -> anyhow::Result<()> {
    let app = build_router(state, config);
    let addr = format!("{}:{}", config.host, config.port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
