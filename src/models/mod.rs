use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "paid" => InvoiceStatus::Paid,
            _ => InvoiceStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub number: String,
    pub invoice_number: Option<String>,
    pub project_id: String,
    pub project_code: String,
    pub vendor: String,
    pub file_name: String,
    pub file_url: String,
    pub storage_path: String,
    pub file_size: i64,
    pub file_type: String,
    pub file_hash: String,
    pub status: InvoiceStatus,
    pub parsed: bool,
    pub parsed_at: Option<DateTime<Utc>>,
    pub total_amount: Option<f64>,
    pub subtotal: Option<f64>,
    pub tax: Option<f64>,
    pub invoice_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub paid_date: Option<DateTime<Utc>>,
    pub currency: String,
    pub description: String,
    pub po_number: String,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
    pub line_items: Vec<LineItem>,
    pub raw_parsed_data: Option<Value>,
    pub uploaded_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub line_number: u32,
    pub description: String,
    pub quantity: f64,
    pub unit_price: Option<f64>,
    pub amount: Option<f64>,
    pub unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub code: String,
    pub title: String,
    pub client_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Human-facing label shown next to invoices, e.g. "DOM-017 - Riverside Annex".
    pub fn label(&self) -> String {
        format!("{} - {}", self.code, self.title).trim().to_string()
    }

    /// Short label used in notification messages; the title stands in for
    /// projects without a code.
    pub fn code_or_title(&self) -> &str {
        if self.code.is_empty() {
            &self.title
        } else {
            &self.code
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub project_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Aggregated on read from the full invoice collection; never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingStats {
    pub total_revenue: f64,
    pub revenue_this_month: f64,
    pub outstanding_amount: f64,
    pub overdue_amount: f64,
    pub paid_this_month: f64,
    pub pending_count: u32,
    pub overdue_count: u32,
    pub paid_count: u32,
    pub total_count: u32,
    pub monthly_revenue: Vec<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPaidPayload {
    pub paid_date: Option<String>,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
}

/// Allow-listed partial update; anything not named here is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoicePayload {
    pub vendor: Option<String>,
    pub total_amount: Option<f64>,
    pub subtotal: Option<f64>,
    pub tax: Option<f64>,
    pub invoice_date: Option<String>,
    pub due_date: Option<String>,
    pub description: Option<String>,
    pub po_number: Option<String>,
    pub status: Option<InvoiceStatus>,
    pub line_items: Option<Vec<LineItem>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProjectPayload {
    pub code: Option<String>,
    pub title: Option<String>,
    pub client_id: Option<String>,
}
