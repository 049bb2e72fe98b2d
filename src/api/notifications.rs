use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::services::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsQuery {
    pub user_id: Option<String>,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationsQuery>,
) -> Result<Json<Value>, AppError> {
    let user_id = query
        .user_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("userId is required".to_string()))?;

    let notifications = state.db()?.list_notifications(&user_id)?;
    Ok(Json(json!({ "success": true, "data": notifications })))
}
