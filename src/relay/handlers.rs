use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use super::RelayState;
use crate::ai::validation::sanitize;
use crate::constants::gemini::NO_RESPONSE_TEXT;
use crate::constants::relay::MISSING_KEY_ERROR;
use crate::types::{ErrorClassifier, FailureKind, FitError};

#[derive(Debug, Deserialize)]
struct ProxyRequest {
    prompt: Option<String>,
}

/// GET /health
pub async fn health(State(state): State<Arc<RelayState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "credential": state.has_credential(),
    }))
}

/// Proxy route, all methods
pub async fn proxy(
    State(state): State<Arc<RelayState>>,
    method: Method,
    body: Bytes,
) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }
    if method != Method::POST {
        return error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    }

    let Some(prompt) = serde_json::from_slice::<ProxyRequest>(&body)
        .ok()
        .and_then(|r| r.prompt)
        .filter(|p| !p.is_empty())
    else {
        return error_response(StatusCode::BAD_REQUEST, "Prompt is required");
    };

    let Some(client) = state.client.as_ref() else {
        error!("Relay request rejected: no API key configured");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            MISSING_KEY_ERROR,
        );
    };

    let text = match client.generate_text(&prompt).await {
        Ok(text) => text,
        Err(e) => return upstream_error(&e),
    };

    match sanitize(&text) {
        Ok(value) => {
            info!(prompt_chars = prompt.len(), "Relayed model response");
            (StatusCode::OK, Json(value)).into_response()
        }
        Err(FitError::InvalidResponse { raw, .. }) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Invalid JSON response from Gemini API",
                "rawResponse": raw,
            })),
        )
            .into_response(),
        Err(e) => upstream_error(&e),
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Map an upstream failure onto the relay's status contract
fn upstream_error(err: &FitError) -> Response {
    if err.to_string() == NO_RESPONSE_TEXT {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, NO_RESPONSE_TEXT);
    }

    let failure = ErrorClassifier::classify_error(err, "gemini");
    warn!(failure = %failure.diagnostic(), "Upstream call failed");

    let (status, message) = match failure.kind {
        FailureKind::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "API quota exceeded"),
        FailureKind::ServiceUnavailable => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Service temporarily unavailable",
        ),
        FailureKind::SafetyBlocked => (
            StatusCode::BAD_REQUEST,
            "Request blocked due to safety settings",
        ),
        FailureKind::NetworkError => (StatusCode::BAD_GATEWAY, "Network connectivity issue"),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "An unexpected error occurred",
        ),
    };
    error_response(status, message)
}
