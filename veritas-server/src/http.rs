//! Veritas HTTP REST API
//!
//! Axum-based HTTP server that fact-checks claims. Each endpoint has a thin
//! axum handler that delegates to an inner function; the inner functions are
//! directly testable without axum dispatch machinery.
//!
//! Endpoints:
//! - GET  /            - service banner
//! - GET  /health      - health check with provider status
//! - GET  /version     - server version info
//! - POST /api/check   - fact-check a claim, always answers with a verdict
//! - POST /api/detect  - find claim-like passages in a block of text

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use veritas_core::{check_claim, detect_claims, VerdictProvider, VeritasConfig, VeritasError};

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub config: VeritasConfig,
    /// `None` when no provider could be built; every check then uses the
    /// fallback classifier.
    pub provider: Option<Arc<dyn VerdictProvider>>,
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    let allow_any_origin = state.config.http.cors_allow_any_origin;

    let router = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/api/check", post(check_handler))
        .route("/api/detect", post(detect_handler))
        .with_state(state);

    let router = if allow_any_origin {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE]),
        )
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http())
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    config: VeritasConfig,
    provider: Option<Arc<dyn VerdictProvider>>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), VeritasError> {
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let state = Arc::new(HttpState { config, provider });

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Veritas HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request / Response DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    pub text: Option<String>,
}

/// Standard HTTP error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            status: "error".to_string(),
        }
    }

    fn into_body(self) -> serde_json::Value {
        serde_json::json!({
            "error": self.error,
            "status": self.status,
        })
    }
}

/// Map a rejected JSON body to the standard error shape, keeping axum's
/// status code (400 syntax, 415 content type, 422 wrong field types).
pub fn rejection_inner(rejection: JsonRejection) -> (StatusCode, serde_json::Value) {
    (
        rejection.status(),
        ErrorResponse::new(rejection.body_text()).into_body(),
    )
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

/// Inner root - service banner (pure, no IO).
pub fn root_inner() -> serde_json::Value {
    serde_json::json!({
        "message": "Veritas Truth Protocol API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "operational",
    })
}

/// Inner health - reports which provider (if any) backs the checks.
pub fn health_inner(state: &HttpState) -> serde_json::Value {
    let (provider, model) = match &state.provider {
        Some(p) => (p.name().to_string(), p.model().to_string()),
        None => ("disabled".to_string(), "fallback-only".to_string()),
    };

    serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "provider": provider,
        "model": model,
    })
}

/// Inner version - returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "veritas/1",
    })
}

/// Validate a claim against the configured length bounds. Returns the
/// trimmed claim.
pub fn validate_claim<'a>(
    text: Option<&'a str>,
    config: &VeritasConfig,
) -> Result<&'a str, ErrorResponse> {
    let claim = text.map(str::trim).unwrap_or("");
    let len = claim.chars().count();
    let (min, max) = (config.http.min_claim_chars, config.http.max_claim_chars);

    if claim.is_empty() {
        return Err(ErrorResponse::new("text field is required"));
    }
    if len < min {
        return Err(ErrorResponse::new(format!(
            "claim must be at least {} characters",
            min
        )));
    }
    if len > max {
        return Err(ErrorResponse::new(format!(
            "claim must be at most {} characters",
            max
        )));
    }
    Ok(claim)
}

/// Inner check - validates the claim and resolves a verdict.
pub async fn check_inner(state: &HttpState, req: CheckRequest) -> (StatusCode, serde_json::Value) {
    let claim = match validate_claim(req.text.as_deref(), &state.config) {
        Ok(c) => c,
        Err(e) => return (StatusCode::BAD_REQUEST, e.into_body()),
    };

    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("check", %request_id, claim_len = claim.chars().count());

    async move {
        let start = Instant::now();
        let resolution = check_claim(state.provider.as_deref(), claim).await;
        let took_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            status = %resolution.verdict.status(),
            credibility = resolution.verdict.credibility(),
            from_model = resolution.from_model(),
            took_ms,
            "Claim checked"
        );

        match serde_json::to_value(&resolution.verdict) {
            Ok(body) => (StatusCode::OK, body),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize verdict");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("failed to serialize verdict").into_body(),
                )
            }
        }
    }
    .instrument(span)
    .await
}

/// Inner detect - finds claim-like passages in the submitted text.
pub fn detect_inner(req: DetectRequest) -> (StatusCode, serde_json::Value) {
    let text = match req.text {
        Some(t) if !t.trim().is_empty() => t,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("text field is required").into_body(),
            );
        }
    };

    let claims = detect_claims(&text);

    (
        StatusCode::OK,
        serde_json::json!({
            "count": claims.len(),
            "claims": claims,
        }),
    )
}

// ============================================================================
// Axum handler wrappers (thin - delegate to inner functions)
// ============================================================================

pub async fn root_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(root_inner()))
}

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(health_inner(&state)))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn check_handler(
    State(state): State<Arc<HttpState>>,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> impl IntoResponse {
    let (status, body) = match payload {
        Ok(Json(req)) => check_inner(&state, req).await,
        Err(rejection) => rejection_inner(rejection),
    };
    (status, Json(body))
}

pub async fn detect_handler(
    payload: Result<Json<DetectRequest>, JsonRejection>,
) -> impl IntoResponse {
    let (status, body) = match payload {
        Ok(Json(req)) => detect_inner(req),
        Err(rejection) => rejection_inner(rejection),
    };
    (status, Json(body))
}

// ============================================================================
// Unit Tests - call inner functions directly
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback_state() -> HttpState {
        HttpState {
            config: VeritasConfig::default(),
            provider: None,
        }
    }

    #[test]
    fn test_version_inner_pure() {
        let v = version_inner();
        assert!(v["version"].is_string(), "version must be string");
        assert_eq!(v["protocol"], "veritas/1");
    }

    #[test]
    fn test_root_inner_operational() {
        let v = root_inner();
        assert_eq!(v["status"], "operational");
        assert_eq!(v["version"], env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_health_inner_reports_disabled_provider() {
        let body = health_inner(&fallback_state());
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["provider"], "disabled");
    }

    #[test]
    fn test_validate_claim_bounds() {
        let config = VeritasConfig::default();
        assert!(validate_claim(None, &config).is_err());
        assert!(validate_claim(Some("   "), &config).is_err());
        assert!(validate_claim(Some("abcd"), &config).is_err());
        assert_eq!(validate_claim(Some("  abcde  "), &config).unwrap(), "abcde");

        let too_long = "x".repeat(config.http.max_claim_chars + 1);
        let err = validate_claim(Some(&too_long), &config).unwrap_err();
        assert!(err.error.contains("at most"));
    }

    #[test]
    fn test_validate_claim_counts_chars_not_bytes() {
        let config = VeritasConfig::default();
        // Four characters, twelve bytes.
        assert!(validate_claim(Some("日本語だ"), &config).is_err());
        assert!(validate_claim(Some("日本語です"), &config).is_ok());
    }

    #[tokio::test]
    async fn test_check_inner_rejects_short_claim() {
        let state = fallback_state();
        let req = CheckRequest {
            text: Some("hi".to_string()),
        };
        let (status, body) = check_inner(&state, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_check_inner_without_provider_uses_fallback() {
        let state = fallback_state();
        let req = CheckRequest {
            text: Some("  The earth is flat and NASA is lying ".to_string()),
        };
        let (status, body) = check_inner(&state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["claim"], "The earth is flat and NASA is lying");
        assert_eq!(body["status"], "False");
        assert_eq!(body["credibility"], 0.0);
        assert!(!body["sources"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_detect_inner_requires_text() {
        let (status, body) = detect_inner(DetectRequest { text: None });
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[test]
    fn test_detect_inner_counts_claims() {
        let req = DetectRequest {
            text: Some(
                "Experts warn that the lake will dry up by next summer.\nNice weather today, isn't it?"
                    .to_string(),
            ),
        };
        let (status, body) = detect_inner(req);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["claims"][0]["category"], "attribution");
    }
}
