use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::services::billing::compute_billing_stats;
use crate::services::state::AppState;

pub async fn billing_stats(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let invoices = state.db()?.list_invoices()?;
    let stats = compute_billing_stats(&invoices, Utc::now());
    Ok(Json(json!({ "success": true, "data": stats })))
}
