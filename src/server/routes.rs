use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use super::AppState;
use crate::advisor::DecisionRequest;
use crate::affirmation::AffirmationRequest;
use crate::database::DecisionQueries;

/// Sent with a 500 from `/chat` whenever the pipeline fails
pub const CHAT_FAILURE_ANSWER: &str =
    "I'm having trouble accessing my knowledge base right now. Please try again later!";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SaveDecisionRequest {
    /// The decision, itself JSON-encoded as a string
    pub body: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

pub async fn test() -> Json<Value> {
    Json(json!({ "message": "API is working!" }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "message": "Backend is running!" }))
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let message = payload
        .map(|Json(request)| request.message)
        .unwrap_or_default();
    if message.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Message is required");
    }

    match state.query.answer(&message).await {
        Ok(answer) => Json(json!({ "answer": answer.text })).into_response(),
        Err(e) => {
            error!("Error in chat endpoint: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "answer": CHAT_FAILURE_ANSWER })),
            )
                .into_response()
        }
    }
}

pub async fn wisest(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DecisionRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid request body");
    };

    match state.advisor.feedback(&request).await {
        Ok(Some(feedback)) => Json(json!({ "feedback": feedback })).into_response(),
        Ok(None) => {
            error!("Advisor returned no feedback");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate feedback",
            )
        }
        Err(e) => {
            error!("Advisor failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

pub async fn affirmation(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AffirmationRequest>, JsonRejection>,
) -> Response {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    if request.entry.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Entry is required");
    }

    match state.affirmations.generate(&request).await {
        Ok(Some(affirmation)) => Json(json!({ "affirmation": affirmation })).into_response(),
        Ok(None) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to generate affirmation",
        ),
        Err(e) => {
            error!("Affirmation failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// `id` field of a decision as a string; numbers are accepted too
fn decision_id(decision: &Value) -> Option<String> {
    match decision.get("id")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

pub async fn save_decision(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SaveDecisionRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid request body");
    };
    let decision: Value = match serde_json::from_str(&request.body) {
        Ok(decision @ Value::Object(_)) => decision,
        _ => return error_response(StatusCode::BAD_REQUEST, "Invalid decision data"),
    };

    let id = decision_id(&decision).unwrap_or_else(|| Uuid::new_v4().to_string());

    match DecisionQueries::save(state.database.pool(), &id, &decision.to_string()).await {
        Ok(_) => {
            info!("Saved decision {}", id);
            Json(json!({ "message": "Decision saved successfully", "id": id })).into_response()
        }
        Err(e) => {
            error!("Error saving decision: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save decision")
        }
    }
}

pub async fn get_decision(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let record = match DecisionQueries::get_by_id(state.database.pool(), &id).await {
        Ok(Some(record)) => record,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Decision not found"),
        Err(e) => {
            error!("Error loading decision {}: {:#}", id, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load decision");
        }
    };

    match record.data_json() {
        Ok(data) => {
            let timestamp = DateTime::<Utc>::from_naive_utc_and_offset(record.created_date, Utc);
            Json(json!({
                "id": record.id,
                "data": data,
                "timestamp": timestamp.to_rfc3339(),
            }))
            .into_response()
        }
        Err(e) => {
            error!("Stored decision {} is not valid JSON: {}", id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load decision")
        }
    }
}

pub async fn delete_decision(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match DecisionQueries::delete(state.database.pool(), &id).await {
        Ok(true) => Json(json!({ "message": "Decision deleted successfully" })).into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Decision not found"),
        Err(e) => {
            error!("Error deleting decision {}: {:#}", id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete decision")
        }
    }
}
