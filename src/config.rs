use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "domus-billing", about = "Invoice ingestion and billing service")]
pub struct Config {
    /// Address the HTTP server binds to.
    #[arg(long, env = "DOMUS_BIND_ADDR", default_value = "127.0.0.1:8080")]
    pub bind_addr: String,

    /// Directory holding the database and stored invoice files.
    #[arg(long, env = "DOMUS_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Base URL under which stored files are reachable from outside.
    /// The OCR service fetches invoice files through it, so it must resolve publicly.
    #[arg(long, env = "DOMUS_PUBLIC_BASE_URL", default_value = "http://127.0.0.1:8080")]
    pub public_base_url: String,

    #[arg(long, env = "PARSIO_API_KEY")]
    pub parsio_api_key: Option<String>,

    #[arg(long, env = "PARSIO_MAILBOX_ID")]
    pub parsio_mailbox_id: Option<String>,

    #[arg(long, env = "PARSIO_BASE_URL", default_value = "https://api.parsio.io")]
    pub parsio_base_url: String,

    /// Shared secret required in the X-Webhook-Secret header of OCR callbacks.
    /// Unset leaves the webhook open; a warning is logged at startup.
    #[arg(long, env = "DOMUS_WEBHOOK_SECRET")]
    pub webhook_secret: Option<String>,
}
