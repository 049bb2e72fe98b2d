//! Upload orchestration and webhook processing.
//!
//! An upload creates the authoritative invoice record first; the blob and the
//! OCR submission are derived side effects. The OCR submission is
//! fire-and-forget: if it fails the invoice simply stays unparsed and the
//! fields can be entered by hand.

use chrono::Utc;
use serde_json::Value;
use tracing::warn;

use crate::error::AppError;
use crate::models::{Invoice, InvoiceStatus, MarkPaidPayload, Project};
use crate::services::state::AppState;
use crate::services::{normalize, notify};
use crate::utils::{format_amount, sanitized_ext, sha256_bytes};

pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub struct UploadRequest {
    pub project_id: String,
    pub vendor: String,
    pub uploaded_by: Option<String>,
}

pub async fn ingest_invoice(
    state: &AppState,
    file: UploadedFile,
    request: UploadRequest,
) -> Result<Invoice, AppError> {
    if file.bytes.is_empty() {
        return Err(AppError::Validation("No file uploaded".to_string()));
    }

    let (project, number): (Project, String) = {
        let db = state.db()?;
        let project = db
            .get_project(&request.project_id)?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
        (project, db.next_invoice_number()?)
    };

    let ext = sanitized_ext(&file.file_name);
    let storage_path = format!(
        "invoices/{}/{}_{}.{}",
        request.project_id,
        Utc::now().timestamp_millis(),
        number,
        ext
    );
    state.blobs.save(&storage_path, &file.bytes).await?;

    let token = uuid::Uuid::new_v4().to_string();
    let file_url = state.blobs.url_for(&storage_path, &token);
    let now = Utc::now();
    let invoice = Invoice {
        id: uuid::Uuid::new_v4().to_string(),
        number: number.clone(),
        invoice_number: Some(number.clone()),
        project_id: request.project_id.clone(),
        project_code: project.code.clone(),
        vendor: request.vendor,
        file_name: file.file_name,
        file_url: file_url.clone(),
        storage_path,
        file_size: file.bytes.len() as i64,
        file_type: file.content_type.clone(),
        file_hash: sha256_bytes(&file.bytes),
        status: InvoiceStatus::Pending,
        parsed: false,
        parsed_at: None,
        total_amount: None,
        subtotal: None,
        tax: None,
        invoice_date: None,
        due_date: None,
        paid_date: None,
        currency: "PHP".to_string(),
        description: String::new(),
        po_number: String::new(),
        payment_method: None,
        payment_reference: None,
        line_items: Vec::new(),
        raw_parsed_data: None,
        uploaded_by: request.uploaded_by.clone(),
        created_at: now,
        updated_at: now,
    };

    {
        let db = state.db()?;
        db.upsert_invoice(&invoice)?;

        let recipient = request.uploaded_by.as_deref().unwrap_or("admin");
        notify::emit(
            &db,
            recipient,
            Some(&request.project_id),
            "invoice_uploaded",
            format!(
                "Invoice {} uploaded for project {}",
                number,
                project.code_or_title()
            ),
        )?;
    }

    // OCR enrichment must never abort an upload that already succeeded.
    let parsio = state.parsio.clone();
    let invoice_id = invoice.id.clone();
    let mime_type = file.content_type;
    tokio::spawn(async move {
        if let Err(err) = parsio.submit_document(&file_url, &invoice_id, &mime_type).await {
            warn!("parsio submission failed for {invoice_id}: {err:#}");
        }
    });

    Ok(invoice)
}

/// Explicit paid transition, reachable from both unparsed and parsed.
/// Payment metadata defaults mirror the documented API: the paid date falls
/// back to now, the method to "unknown", the reference to empty.
pub fn mark_paid(
    state: &AppState,
    id: &str,
    payload: MarkPaidPayload,
) -> Result<Invoice, AppError> {
    let db = state.db()?;
    let mut invoice = db
        .get_invoice(id)?
        .ok_or_else(|| AppError::NotFound("Invoice not found".to_string()))?;

    let now = Utc::now();
    invoice.status = InvoiceStatus::Paid;
    invoice.paid_date = payload
        .paid_date
        .as_deref()
        .and_then(normalize::parse_date_str)
        .or(Some(now));
    invoice.payment_method = Some(payload.payment_method.unwrap_or_else(|| "unknown".to_string()));
    invoice.payment_reference = Some(payload.payment_reference.unwrap_or_default());
    invoice.updated_at = now;
    db.upsert_invoice(&invoice)?;

    if let Some(project) = db.get_project(&invoice.project_id)? {
        if let Some(client_id) = project.client_id.as_deref() {
            let shown_number = invoice
                .invoice_number
                .clone()
                .unwrap_or_else(|| invoice.number.clone());
            notify::emit(
                &db,
                client_id,
                Some(&invoice.project_id),
                "invoice_paid",
                format!(
                    "Invoice {} for project {} has been marked as paid.",
                    shown_number,
                    project.code_or_title()
                ),
            )?;
        }
    }

    Ok(invoice)
}

/// Applies an OCR webhook payload to the invoice it correlates with.
/// At-least-once redelivery is safe: the mapping is a pure function of the
/// payload, so reapplying produces the same record.
pub fn process_webhook(state: &AppState, payload: &Value) -> Result<Invoice, AppError> {
    let invoice_id = normalize::correlation_id(payload)
        .ok_or_else(|| AppError::Validation("Missing invoiceId".to_string()))?;

    let db = state.db()?;
    let invoice = db
        .get_invoice(&invoice_id)?
        .ok_or_else(|| AppError::NotFound("Invoice not found".to_string()))?;

    let parsed = normalize::parsed_section(payload);
    let updated = normalize::apply_parsed(&invoice, parsed, Utc::now());
    db.upsert_invoice(&updated)?;

    if let Some(uploaded_by) = updated.uploaded_by.as_deref() {
        let shown_number = updated
            .invoice_number
            .clone()
            .unwrap_or_else(|| updated.number.clone());
        notify::emit(
            &db,
            uploaded_by,
            Some(&updated.project_id),
            "invoice_parsed",
            format!(
                "Invoice {} has been parsed. Total: ₱{}",
                shown_number,
                format_amount(updated.total_amount.unwrap_or(0.0))
            ),
        )?;
    }

    Ok(updated)
}
