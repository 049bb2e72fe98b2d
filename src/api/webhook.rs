use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use crate::error::AppError;
use crate::services::ingest;
use crate::services::state::AppState;

/// POST /webhook/parsio — the OCR service's asynchronous callback.
/// When a shared secret is configured the payload is not trusted without it.
pub async fn parsio_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, AppError> {
    if let Some(secret) = state.config.webhook_secret.as_deref() {
        let provided = headers
            .get("x-webhook-secret")
            .and_then(|value| value.to_str().ok());
        if provided != Some(secret) {
            return Err(AppError::Unauthorized("Invalid webhook secret".to_string()));
        }
    }

    let invoice = ingest::process_webhook(&state, &payload)?;
    info!(invoice_id = %invoice.id, "invoice updated with parsed data");

    Ok(Json(json!({
        "success": true,
        "message": "Webhook processed successfully"
    })))
}
