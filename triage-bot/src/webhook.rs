use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{Json, Response},
    routing::post,
    Router,
};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::payload::{decode_event, GitHubEventPayload};
use crate::pipeline::{handle_event, PipelineOutcome};
use crate::{AppState, CorrelationId};

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub message: String,
}

type HmacSha256 = Hmac<Sha256>;

fn verify_github_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    let Some(signature_hex) = signature.strip_prefix("sha256=") else {
        return false;
    };

    let signature_bytes = match hex::decode(signature_hex) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };

    mac.update(payload);

    // constant-time comparison
    mac.verify_slice(&signature_bytes).is_ok()
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|h| h.to_str().ok())
}

async fn verify_webhook_signature(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    let signature = header(&parts.headers, "x-hub-signature-256").ok_or(StatusCode::UNAUTHORIZED)?;

    if !verify_github_signature(&state.webhook_secret, &bytes, signature) {
        error!("Invalid webhook signature");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let correlation_id = CorrelationId(
        header(&parts.headers, "x-github-delivery")
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
    );

    let mut request = Request::from_parts(parts, axum::body::Body::from(bytes));
    request.extensions_mut().insert(correlation_id);

    Ok(next.run(request).await)
}

fn respond(
    status: StatusCode,
    message: String,
) -> Result<Json<WebhookResponse>, (StatusCode, Json<WebhookResponse>)> {
    if status.is_success() {
        Ok(Json(WebhookResponse { message }))
    } else {
        Err((status, Json(WebhookResponse { message })))
    }
}

pub async fn github_webhook_handler(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<WebhookResponse>, (StatusCode, Json<WebhookResponse>)> {
    let correlation_id = request
        .extensions()
        .get::<CorrelationId>()
        .map(|id| id.0.clone())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let (parts, body) = request.into_parts();
    let event_name = header(&parts.headers, "x-github-event")
        .unwrap_or_default()
        .to_string();

    let span = info_span!("webhook", correlation_id = %correlation_id, event = %event_name);

    async move {
        info!("Received webhook payload");

        let bytes = match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => bytes,
            Err(e) => return respond(StatusCode::BAD_REQUEST, format!("Unreadable body: {}", e)),
        };
        let payload: GitHubEventPayload = match serde_json::from_slice(&bytes) {
            Ok(payload) => payload,
            Err(e) => return respond(StatusCode::BAD_REQUEST, format!("Invalid payload: {}", e)),
        };

        let result = match decode_event(&event_name, &payload, None, None) {
            Ok(event) => handle_event(state.tracker.as_ref(), &state.settings, event, false).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(PipelineOutcome::Ignored(reason)) => {
                respond(StatusCode::OK, format!("Ignored: {}", reason))
            }
            Ok(PipelineOutcome::Triaged(decision)) => {
                respond(StatusCode::OK, format!("Triaged: {:?}", decision))
            }
            Ok(PipelineOutcome::Lock(decision)) => {
                respond(StatusCode::OK, format!("Lock: {}", decision))
            }
            Err(e) => {
                error!("Failed to handle webhook: {:#}", e);
                respond(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
            }
        }
    }
    .instrument(span)
    .await
}

pub fn webhook_router(middleware_state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/webhook", post(github_webhook_handler))
        .route_layer(middleware::from_fn_with_state(
            middleware_state,
            verify_webhook_signature,
        ))
}
