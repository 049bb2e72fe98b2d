use anyhow::{bail, Result};
use serde_json::json;
use tracing::{info, warn};

/// Outbound submission of a stored file to the Parsio OCR service. The
/// invoice id travels in the metadata and comes back as the webhook's
/// correlation id. Results only ever arrive through the webhook; this call
/// persists nothing locally.
#[derive(Debug, Clone)]
pub struct ParsioClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    mailbox_id: Option<String>,
}

impl ParsioClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, mailbox_id: Option<String>) -> Self {
        ParsioClient {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
            mailbox_id,
        }
    }

    pub async fn submit_document(&self, file_url: &str, invoice_id: &str, mime_type: &str) -> Result<()> {
        let (Some(api_key), Some(mailbox_id)) = (self.api_key.as_ref(), self.mailbox_id.as_ref())
        else {
            warn!("parsio credentials not configured, skipping OCR submission");
            return Ok(());
        };

        let url = format!(
            "{}/mailboxes/{}/documents",
            self.base_url.trim_end_matches('/'),
            mailbox_id
        );
        let body = json!({
            "url": file_url,
            "contentType": mime_type,
            "metadata": {
                "invoiceId": invoice_id,
                "source": "domus_billing"
            }
        });

        let response = self
            .http
            .post(&url)
            .header("X-API-Key", api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            bail!("parsio api error {}: {}", status, text);
        }

        info!(invoice_id, "parsio document submitted");
        Ok(())
    }
}
