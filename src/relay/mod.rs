//! Relay Server
//!
//! HTTP service that holds the Gemini credential on the server side. Clients
//! post `{prompt}` and receive the sanitized model object, or a JSON error
//! with a status code derived from the upstream failure.

mod handlers;

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, header},
    middleware,
    response::Response,
    routing::{any, get},
};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::ai::provider::GeminiClient;
use crate::config::{Config, GeminiConfig};
use crate::types::Result;

/// State shared by every request
#[derive(Debug)]
pub struct RelayState {
    /// Absent when no credential is configured; requests then answer 500
    client: Option<GeminiClient>,
}

impl RelayState {
    pub fn new(client: Option<GeminiClient>) -> Self {
        Self { client }
    }

    /// Build the upstream client, keeping the server up without a key
    pub fn from_config(config: &GeminiConfig) -> Self {
        match GeminiClient::new(config) {
            Ok(client) => {
                info!(model = %client.model(), "Relay upstream configured");
                Self::new(Some(client))
            }
            Err(e) => {
                warn!(error = %e, "Relay started without a usable Gemini client");
                Self::new(None)
            }
        }
    }

    pub fn has_credential(&self) -> bool {
        self.client.is_some()
    }
}

/// Router with the proxy mounted at `path` and `/health`
pub fn build_router(state: Arc<RelayState>, path: &str) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(path, any(handlers::proxy))
        .layer(middleware::map_response(cors_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

/// Serve until `shutdown` is cancelled
pub async fn serve(config: &Config, bind: &str, shutdown: CancellationToken) -> Result<()> {
    let state = Arc::new(RelayState::from_config(&config.gemini));
    let app = build_router(state, &config.relay.path);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(
        addr = %listener.local_addr()?,
        path = %config.relay.path,
        "Relay listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("Relay stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use httpmock::prelude::*;
    use secrecy::SecretString;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const PATH: &str = "/api/gemini-proxy";

    fn app_with(client: Option<GeminiClient>) -> Router {
        build_router(Arc::new(RelayState::new(client)), PATH)
    }

    fn app_for(server: &MockServer) -> Router {
        let config = GeminiConfig {
            api_base: server.base_url(),
            timeout_secs: 5,
            ..Default::default()
        };
        let client = GeminiClient::with_api_key(&config, SecretString::from("relay-key")).unwrap();
        app_with(Some(client))
    }

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(PATH)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Response, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, Response::from_parts(parts, Body::empty()), value)
    }

    fn gemini_text(server: &MockServer, text: &str) {
        let text = text.to_string();
        server.mock(move |when, then| {
            when.method(POST)
                .path("/models/gemini-2.5-flash:generateContent")
                .query_param("key", "relay-key");
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": text }] },
                    "finishReason": "STOP"
                }]
            }));
        });
    }

    fn gemini_status(server: &MockServer, status: u16) {
        server.mock(move |when, then| {
            when.method(POST);
            then.status(status);
        });
    }

    #[tokio::test]
    async fn test_options_is_no_content_with_cors() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri(PATH)
            .body(Body::empty())
            .unwrap();
        let (status, response, _) = send(app_with(None), request).await;

        assert_eq!(status, StatusCode::NO_CONTENT);
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "POST, OPTIONS");
        assert_eq!(headers["access-control-allow-headers"], "Content-Type");
        assert_eq!(headers["content-type"], "application/json");
    }

    #[tokio::test]
    async fn test_other_methods_not_allowed() {
        let request = Request::builder()
            .method("GET")
            .uri(PATH)
            .body(Body::empty())
            .unwrap();
        let (status, response, body) = send(app_with(None), request).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], "Method not allowed");
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_missing_prompt_is_bad_request() {
        for body in ["{}", r#"{"prompt": ""}"#, "not json"] {
            let (status, _, value) = send(app_with(None), post(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
            assert_eq!(value["error"], "Prompt is required");
        }
    }

    #[tokio::test]
    async fn test_missing_credential_is_server_error() {
        let (status, _, body) = send(app_with(None), post(r#"{"prompt":"hi"}"#)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["error"],
            "Server configuration error: API key not configured"
        );
    }

    #[tokio::test]
    async fn test_sanitized_object_returned() {
        let server = MockServer::start();
        gemini_text(&server, "```json\n{'total': 81, \"tags\": [\"a\",],}\n```");

        let (status, _, body) = send(app_for(&server), post(r#"{"prompt":"hi"}"#)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"total": 81, "tags": ["a"]}));
    }

    #[tokio::test]
    async fn test_unparseable_output_carries_raw_response() {
        let server = MockServer::start();
        gemini_text(&server, "```json\nnot json at all\n```");

        let (status, _, body) = send(app_for(&server), post(r#"{"prompt":"hi"}"#)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Invalid JSON response from Gemini API");
        assert_eq!(body["rawResponse"], "not json at all");
    }

    #[tokio::test]
    async fn test_upstream_statuses_mapped() {
        let cases = [
            (429, StatusCode::TOO_MANY_REQUESTS, "API quota exceeded"),
            (503, StatusCode::SERVICE_UNAVAILABLE, "Service temporarily unavailable"),
            (500, StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error occurred"),
        ];

        for (upstream, expected, message) in cases {
            let server = MockServer::start();
            gemini_status(&server, upstream);

            let (status, _, body) = send(app_for(&server), post(r#"{"prompt":"hi"}"#)).await;
            assert_eq!(status, expected);
            assert_eq!(body["error"], message);
        }
    }

    #[tokio::test]
    async fn test_safety_block_is_bad_request() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200)
                .json_body(json!({ "candidates": [{ "finishReason": "SAFETY" }] }));
        });

        let (status, _, body) = send(app_for(&server), post(r#"{"prompt":"hi"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Request blocked due to safety settings");
    }

    #[tokio::test]
    async fn test_empty_candidate_text() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({ "candidates": [] }));
        });

        let (status, _, body) = send(app_for(&server), post(r#"{"prompt":"hi"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "No response text received from API");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_bad_gateway() {
        let config = GeminiConfig {
            api_base: "http://127.0.0.1:1".to_string(),
            timeout_secs: 2,
            ..Default::default()
        };
        let client = GeminiClient::with_api_key(&config, SecretString::from("k")).unwrap();

        let (status, _, body) = send(app_with(Some(client)), post(r#"{"prompt":"hi"}"#)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Network connectivity issue");
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(app_with(None), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["credential"], false);
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let mut config = Config::default();
        config.gemini.api_key = None;
        let token = CancellationToken::new();
        token.cancel();

        serve(&config, "127.0.0.1:0", token).await.unwrap();
    }
}
