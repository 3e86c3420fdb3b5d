//! Webhook ingestion routes: the Linear event entrypoint and the runner's
//! progress-callback entrypoint.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use crate::rest::dto::WebhookAcceptedResponse;
use crate::rest::error::ApiError;
use crate::rest::state::ApiState;
use crate::router;
use crate::runner::RunnerEvent;
use crate::webhook;

const SIGNATURE_HEADER: &str = "x-linear-signature";

#[utoipa::path(
    post,
    path = "/webhooks/linear",
    tag = "Webhooks",
    responses(
        (status = 200, description = "Event parsed and routed", body = WebhookAcceptedResponse),
        (status = 401, description = "Invalid signature"),
        (status = 400, description = "Malformed payload"),
    )
)]
pub async fn linear(State(state): State<ApiState>, headers: HeaderMap, body: axum::body::Bytes) -> Result<Json<WebhookAcceptedResponse>, ApiError> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

    let processed = webhook::handle(
        &body,
        signature,
        state.config.webhook_secret.as_deref(),
        &state.config.tenant_id,
        state.config.agent_user_id.as_deref(),
    )?;

    tracing::info!(
        should_trigger = processed.should_trigger,
        reason = %processed.trigger_reason,
        "processed linear webhook event"
    );

    if processed.should_trigger {
        let sessions = state.sessions.clone();
        tokio::spawn(async move {
            if let Err(e) = router::route(&sessions, processed).await {
                tracing::error!(error = %e, "failed to route triggering event");
            }
        });
    }

    Ok(Json(WebhookAcceptedResponse { accepted: true }))
}

#[utoipa::path(
    post,
    path = "/webhooks/codegen/{task_id}",
    tag = "Webhooks",
    params(("task_id" = String, Path, description = "Runner task id")),
    responses(
        (status = 200, description = "Progress event accepted"),
        (status = 401, description = "Invalid signature"),
        (status = 400, description = "Malformed payload"),
    )
)]
pub async fn codegen(State(state): State<ApiState>, Path(task_id): Path<String>, headers: HeaderMap, body: axum::body::Bytes) -> Result<(), ApiError> {
    if let Some(secret) = state.config.boss_agent.runner_webhook_secret.as_deref() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::InvalidSignature)?;
        if !webhook::verify_signature(&body, signature, secret) {
            return Err(ApiError::InvalidSignature);
        }
    }

    let event: RunnerEvent = serde_json::from_slice(&body).map_err(|e| ApiError::MalformedPayload(e.to_string()))?;

    if let Some(boss_agent) = &state.boss_agent {
        boss_agent.handle_progress_event(&task_id, event).await;
    }

    Ok(())
}
