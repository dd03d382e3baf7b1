//! HTTP request handlers

use super::types::{ErrorResponse, VersionResponse};
use super::AppState;
use crate::line::{parse_webhook, WebhookError, SIGNATURE_HEADER};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Webhook deliveries from the messaging platform
        .route("/callback", post(callback))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Webhook
// ============================================================

/// Verify, parse and dispatch a webhook delivery.
///
/// Once the delivery is authentic and well-formed the answer is 200, whatever
/// happens to the individual replies.
async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let payload = parse_webhook(&state.channel_secret, signature, &body)?;

    tracing::debug!(
        destination = ?payload.destination,
        events = payload.events.len(),
        "Webhook received"
    );

    let summary = state.dispatcher.handle_events(payload.events).await;

    tracing::info!(
        replied = summary.replied,
        reply_failed = summary.reply_failed,
        ignored = summary.ignored,
        "Webhook handled"
    );

    Ok(StatusCode::OK)
}

async fn get_version() -> Json<VersionResponse> {
    Json(VersionResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    Internal(String),
}

impl From<WebhookError> for AppError {
    fn from(e: WebhookError) -> Self {
        match e {
            WebhookError::InvalidSignature => {
                tracing::warn!("Webhook signature verification failed");
                AppError::BadRequest(e.to_string())
            }
            WebhookError::Parse(_) => {
                tracing::error!(error = %e, "Webhook payload could not be parsed");
                AppError::Internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
