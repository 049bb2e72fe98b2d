use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::services::state::AppState;

mod billing;
mod invoices;
mod notifications;
mod projects;
mod webhook;

const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let files_root = state.blobs.root().to_path_buf();

    Router::new()
        .route(
            "/invoices",
            post(invoices::upload_invoice).get(invoices::list_invoices),
        )
        .route(
            "/invoices/:id",
            get(invoices::get_invoice)
                .put(invoices::update_invoice)
                .delete(invoices::delete_invoice),
        )
        .route("/invoices/:id/mark-paid", post(invoices::mark_invoice_paid))
        .route("/webhook/parsio", post(webhook::parsio_webhook))
        .route("/billing-stats", get(billing::billing_stats))
        .route(
            "/projects",
            post(projects::create_project).get(projects::list_projects),
        )
        .route("/notifications", get(notifications::list_notifications))
        .route("/health", get(health))
        .nest_service("/files", ServeDir::new(files_root))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "success": true, "status": "ok" }))
}
