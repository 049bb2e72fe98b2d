//! End-to-end run of the invoice pipeline against a scratch database and
//! blob directory: upload, webhook normalization, billing snapshot.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use serde_json::json;
use tower::ServiceExt;

use domus_billing::db::Database;
use domus_billing::models::{InvoiceStatus, MarkPaidPayload, Project};
use domus_billing::services::billing::compute_billing_stats;
use domus_billing::services::ingest::{
    ingest_invoice, mark_paid, process_webhook, UploadRequest, UploadedFile,
};
use domus_billing::{build_router, AppState, Config};

fn test_config(dir: &tempfile::TempDir) -> Config {
    Config {
        bind_addr: "127.0.0.1:0".to_string(),
        data_dir: dir.path().to_path_buf(),
        public_base_url: "http://127.0.0.1:8080".to_string(),
        parsio_api_key: None,
        parsio_mailbox_id: None,
        parsio_base_url: "https://api.parsio.io".to_string(),
        webhook_secret: None,
    }
}

fn test_state(dir: &tempfile::TempDir) -> AppState {
    let db = Database::new(dir.path().join("test.sqlite")).unwrap();
    AppState::new(test_config(dir), db)
}

fn seed_project(state: &AppState, id: &str) {
    state
        .db()
        .unwrap()
        .insert_project(&Project {
            id: id.to_string(),
            code: "DOM-017".to_string(),
            title: "Riverside Annex".to_string(),
            client_id: Some("client-1".to_string()),
            created_at: Utc::now(),
        })
        .unwrap();
}

#[tokio::test]
async fn upload_then_webhook_then_stats() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);
    seed_project(&state, "proj-1");

    let invoice = ingest_invoice(
        &state,
        UploadedFile {
            file_name: "acme-invoice.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: b"%PDF-1.4 fake invoice".to_vec(),
        },
        UploadRequest {
            project_id: "proj-1".to_string(),
            vendor: "Acme Concrete".to_string(),
            uploaded_by: Some("user-7".to_string()),
        },
    )
    .await
    .unwrap();

    assert_eq!(invoice.number, "INV-00001");
    assert_eq!(invoice.status, InvoiceStatus::Pending);
    assert!(!invoice.parsed);
    assert_eq!(invoice.total_amount, None);
    assert_eq!(invoice.currency, "PHP");

    // the blob landed under the data dir
    let blob = dir.path().join("blobs").join(&invoice.storage_path);
    assert!(blob.exists());

    // upload notification reached the uploader
    let notifications = state.db().unwrap().list_notifications("user-7").unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, "invoice_uploaded");

    // OCR callback arrives
    let payload = json!({
        "metadata": { "invoiceId": invoice.id },
        "parsed": {
            "total": "$1,200.00",
            "due_date": "2024-01-15",
            "vendor": "Acme Concrete Corp",
            "line_items": [
                { "description": "Foundation work", "amount": "₱1,000.00" },
                { "notes": "no description, no amount" },
                { "item": "Rebar", "total": 200 }
            ]
        }
    });
    let updated = process_webhook(&state, &payload).unwrap();

    assert!(updated.parsed);
    assert_eq!(updated.total_amount, Some(1200.0));
    assert_eq!(
        updated.due_date,
        Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
    );
    assert_eq!(updated.vendor, "Acme Concrete Corp");
    assert_eq!(updated.line_items.len(), 2);
    assert_eq!(updated.line_items[0].line_number, 1);
    assert_eq!(updated.line_items[1].line_number, 3);

    // redelivery of the same payload is safe
    let redelivered = process_webhook(&state, &payload).unwrap();
    assert_eq!(redelivered.total_amount, updated.total_amount);
    assert_eq!(redelivered.line_items, updated.line_items);

    // parse notification carries the formatted total
    let notifications = state.db().unwrap().list_notifications("user-7").unwrap();
    let parsed_note = notifications
        .iter()
        .find(|n| n.kind == "invoice_parsed")
        .unwrap();
    assert!(parsed_note.message.contains("₱1,200.00"));

    // billing snapshot: one pending invoice, overdue since 2024-01-15
    let invoices = state.db().unwrap().list_invoices().unwrap();
    let stats = compute_billing_stats(&invoices, Utc::now());
    assert_eq!(stats.total_count, 1);
    assert_eq!(stats.overdue_count, 1);
    assert_eq!(stats.overdue_amount, 1200.0);
    assert_eq!(stats.outstanding_amount, 1200.0);
    assert_eq!(stats.total_revenue, 0.0);
}

#[tokio::test]
async fn webhook_without_correlation_id_is_rejected_without_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let err = process_webhook(&state, &json!({ "parsed": { "total": "100" } })).unwrap_err();
    assert!(matches!(
        err,
        domus_billing::error::AppError::Validation(_)
    ));

    let err = process_webhook(
        &state,
        &json!({ "metadata": { "invoiceId": "nope" }, "parsed": {} }),
    )
    .unwrap_err();
    assert!(matches!(err, domus_billing::error::AppError::NotFound(_)));
}

#[tokio::test]
async fn upload_without_project_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let err = ingest_invoice(
        &state,
        UploadedFile {
            file_name: "scan.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: b"%PDF".to_vec(),
        },
        UploadRequest {
            project_id: "missing-project".to_string(),
            vendor: String::new(),
            uploaded_by: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, domus_billing::error::AppError::NotFound(_)));
}

#[tokio::test]
async fn sequential_numbers_across_uploads() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);
    seed_project(&state, "proj-1");

    for expected in ["INV-00001", "INV-00002", "INV-00003"] {
        let invoice = ingest_invoice(
            &state,
            UploadedFile {
                file_name: "scan.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                bytes: b"%PDF".to_vec(),
            },
            UploadRequest {
                project_id: "proj-1".to_string(),
                vendor: String::new(),
                uploaded_by: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(invoice.number, expected);
    }
}

#[tokio::test]
async fn mark_paid_shows_up_in_revenue() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);
    seed_project(&state, "proj-1");

    let invoice = ingest_invoice(
        &state,
        UploadedFile {
            file_name: "scan.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: b"%PDF".to_vec(),
        },
        UploadRequest {
            project_id: "proj-1".to_string(),
            vendor: String::new(),
            uploaded_by: None,
        },
    )
    .await
    .unwrap();

    // OCR fills in the amount, then the invoice is settled
    process_webhook(
        &state,
        &json!({ "metadata": { "invoiceId": invoice.id }, "parsed": { "total": "500" } }),
    )
    .unwrap();
    mark_paid(&state, &invoice.id, MarkPaidPayload::default()).unwrap();

    let invoices = state.db().unwrap().list_invoices().unwrap();
    let stats = compute_billing_stats(&invoices, Utc::now());
    assert_eq!(stats.total_revenue, 500.0);
    assert_eq!(stats.revenue_this_month, 500.0);
    assert_eq!(stats.paid_count, 1);
    assert_eq!(stats.outstanding_amount, 0.0);
}

#[tokio::test]
async fn mark_paid_records_payment_and_notifies_client() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);
    seed_project(&state, "proj-1");

    let invoice = ingest_invoice(
        &state,
        UploadedFile {
            file_name: "scan.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: b"%PDF".to_vec(),
        },
        UploadRequest {
            project_id: "proj-1".to_string(),
            vendor: String::new(),
            uploaded_by: None,
        },
    )
    .await
    .unwrap();

    // without payment metadata the transition still lands with sane defaults
    let before = Utc::now();
    let paid = mark_paid(&state, &invoice.id, MarkPaidPayload::default()).unwrap();
    assert_eq!(paid.status, InvoiceStatus::Paid);
    assert!(paid.paid_date.unwrap() >= before);
    assert_eq!(paid.payment_method.as_deref(), Some("unknown"));
    assert_eq!(paid.payment_reference.as_deref(), Some(""));

    // explicit metadata wins
    let paid = mark_paid(
        &state,
        &invoice.id,
        MarkPaidPayload {
            paid_date: Some("2024-03-01".to_string()),
            payment_method: Some("bank transfer".to_string()),
            payment_reference: Some("TXN-4411".to_string()),
        },
    )
    .unwrap();
    assert_eq!(
        paid.paid_date,
        Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(paid.payment_method.as_deref(), Some("bank transfer"));
    assert_eq!(paid.payment_reference.as_deref(), Some("TXN-4411"));

    let stored = state.db().unwrap().get_invoice(&invoice.id).unwrap().unwrap();
    assert_eq!(stored.status, InvoiceStatus::Paid);

    // the project's client hears about it, with the project code in the message
    let notes = state.db().unwrap().list_notifications("client-1").unwrap();
    let paid_note = notes.iter().find(|n| n.kind == "invoice_paid").unwrap();
    assert!(paid_note.message.contains("DOM-017"));

    let err = mark_paid(&state, "missing", MarkPaidPayload::default()).unwrap_err();
    assert!(matches!(err, domus_billing::error::AppError::NotFound(_)));
}

#[tokio::test]
async fn webhook_secret_gates_the_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.webhook_secret = Some("s3cret".to_string());
    let db = Database::new(dir.path().join("test.sqlite")).unwrap();
    let state = AppState::new(config, db);
    seed_project(&state, "proj-1");

    let invoice = ingest_invoice(
        &state,
        UploadedFile {
            file_name: "scan.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: b"%PDF".to_vec(),
        },
        UploadRequest {
            project_id: "proj-1".to_string(),
            vendor: String::new(),
            uploaded_by: None,
        },
    )
    .await
    .unwrap();

    let payload = json!({
        "metadata": { "invoiceId": invoice.id },
        "parsed": { "total": "100" }
    })
    .to_string();

    let request = |secret: Option<&str>| {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/webhook/parsio")
            .header("content-type", "application/json");
        if let Some(secret) = secret {
            builder = builder.header("x-webhook-secret", secret);
        }
        builder.body(Body::from(payload.clone())).unwrap()
    };

    let response = build_router(state.clone()).oneshot(request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = build_router(state.clone())
        .oneshot(request(Some("wrong")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // nothing was parsed while the secret was missing or wrong
    let stored = state.db().unwrap().get_invoice(&invoice.id).unwrap().unwrap();
    assert!(!stored.parsed);

    let response = build_router(state.clone())
        .oneshot(request(Some("s3cret")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = state.db().unwrap().get_invoice(&invoice.id).unwrap().unwrap();
    assert!(stored.parsed);
    assert_eq!(stored.total_amount, Some(100.0));
}
