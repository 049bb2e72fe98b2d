use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use domus_billing::{build_router, AppState, Config};
use domus_billing::db::Database;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = Config::parse();
    info!(
        "Starting domus-billing v{}",
        env!("CARGO_PKG_VERSION")
    );

    std::fs::create_dir_all(&config.data_dir)?;
    let db_path = config.data_dir.join("domus.sqlite");
    info!("Database path: {}", db_path.display());
    let db = Database::new(db_path)?;

    if config.webhook_secret.is_none() {
        warn!("DOMUS_WEBHOOK_SECRET not set, the OCR webhook endpoint is unauthenticated");
    }
    if config.parsio_api_key.is_none() || config.parsio_mailbox_id.is_none() {
        warn!("Parsio credentials not configured, uploads will stay unparsed until entered manually");
    }

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config, db);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("domus-billing listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
