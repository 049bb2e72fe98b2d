use axum::extract::{Multipart, Path, State};
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::warn;

use crate::db::Database;
use crate::error::AppError;
use crate::models::{MarkPaidPayload, UpdateInvoicePayload};
use crate::services::ingest::{ingest_invoice, mark_paid, UploadRequest, UploadedFile};
use crate::services::normalize;
use crate::services::state::AppState;

pub async fn upload_invoice(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let mut file: Option<UploadedFile> = None;
    let mut project_id: Option<String> = None;
    let mut vendor = String::new();
    let mut uploaded_by: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("invoice.bin").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
                file = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "projectId" => {
                project_id = Some(read_text(field).await?);
            }
            "vendor" => {
                vendor = read_text(field).await?;
            }
            "uploadedBy" => {
                uploaded_by = Some(read_text(field).await?).filter(|s| !s.is_empty());
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;
    let project_id = project_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("Project is required".to_string()))?;

    let invoice = ingest_invoice(
        &state,
        file,
        UploadRequest {
            project_id,
            vendor,
            uploaded_by,
        },
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "invoiceId": invoice.id,
        "data": invoice
    })))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map(|s| s.trim().to_string())
        .map_err(|e| AppError::Validation(format!("Invalid multipart field: {e}")))
}

pub async fn list_invoices(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let db = state.db()?;
    let invoices = db.list_invoices()?;

    let mut labels: HashMap<String, String> = HashMap::new();
    let mut data = Vec::with_capacity(invoices.len());
    for invoice in invoices {
        let label = match labels.get(&invoice.project_id) {
            Some(label) => label.clone(),
            None => {
                let label = project_label(&db, &invoice.project_id)?;
                labels.insert(invoice.project_id.clone(), label.clone());
                label
            }
        };
        let mut value = serde_json::to_value(&invoice).map_err(anyhow::Error::from)?;
        value["projectName"] = json!(label);
        data.push(value);
    }

    Ok(Json(json!({ "success": true, "data": data })))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let db = state.db()?;
    let invoice = db
        .get_invoice(&id)?
        .ok_or_else(|| AppError::NotFound("Invoice not found".to_string()))?;
    let label = project_label(&db, &invoice.project_id)?;

    let mut value = serde_json::to_value(&invoice).map_err(anyhow::Error::from)?;
    value["projectName"] = json!(label);
    Ok(Json(json!({ "success": true, "data": value })))
}

pub async fn mark_invoice_paid(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Option<Json<MarkPaidPayload>>,
) -> Result<Json<Value>, AppError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    mark_paid(&state, &id, payload)?;
    Ok(Json(json!({ "success": true, "message": "Invoice marked as paid" })))
}

pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateInvoicePayload>,
) -> Result<Json<Value>, AppError> {
    let db = state.db()?;
    let mut invoice = db
        .get_invoice(&id)?
        .ok_or_else(|| AppError::NotFound("Invoice not found".to_string()))?;

    if let Some(vendor) = payload.vendor {
        invoice.vendor = vendor;
    }
    if let Some(total_amount) = payload.total_amount {
        invoice.total_amount = Some(total_amount);
    }
    if let Some(subtotal) = payload.subtotal {
        invoice.subtotal = Some(subtotal);
    }
    if let Some(tax) = payload.tax {
        invoice.tax = Some(tax);
    }
    if let Some(invoice_date) = payload.invoice_date.as_deref() {
        invoice.invoice_date = normalize::parse_date_str(invoice_date);
    }
    if let Some(due_date) = payload.due_date.as_deref() {
        invoice.due_date = normalize::parse_date_str(due_date);
    }
    if let Some(description) = payload.description {
        invoice.description = description;
    }
    if let Some(po_number) = payload.po_number {
        invoice.po_number = po_number;
    }
    if let Some(status) = payload.status {
        invoice.status = status;
    }
    if let Some(line_items) = payload.line_items {
        invoice.line_items = line_items;
    }
    invoice.updated_at = Utc::now();
    db.upsert_invoice(&invoice)?;

    Ok(Json(json!({ "success": true, "message": "Invoice updated successfully" })))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let invoice = {
        let db = state.db()?;
        db.get_invoice(&id)?
            .ok_or_else(|| AppError::NotFound("Invoice not found".to_string()))?
    };

    // The record is authoritative; a missing blob is logged, not fatal.
    if let Err(err) = state.blobs.delete(&invoice.storage_path).await {
        warn!("failed to delete blob for invoice {id}: {err:#}");
    }

    state.db()?.delete_invoice(&id)?;
    Ok(Json(json!({ "success": true, "message": "Invoice deleted successfully" })))
}

fn project_label(db: &Database, project_id: &str) -> Result<String, AppError> {
    Ok(db
        .get_project(project_id)?
        .map(|p| p.label())
        .unwrap_or_else(|| "—".to_string()))
}
