use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::models::{NewProjectPayload, Project};
use crate::services::state::AppState;

pub async fn create_project(
    State(state): State<AppState>,
    Json(payload): Json<NewProjectPayload>,
) -> Result<Json<Value>, AppError> {
    let title = payload
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("Project title is required".to_string()))?;

    let project = Project {
        id: uuid::Uuid::new_v4().to_string(),
        code: payload.code.unwrap_or_default(),
        title,
        client_id: payload.client_id,
        created_at: Utc::now(),
    };
    state.db()?.insert_project(&project)?;

    Ok(Json(json!({ "success": true, "data": project })))
}

pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let projects = state.db()?.list_projects()?;
    Ok(Json(json!({ "success": true, "data": projects })))
}
