use anyhow::anyhow;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::Config;
use crate::db::Database;
use crate::error::AppError;
use crate::services::parsio::ParsioClient;
use crate::storage::BlobStore;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub blobs: BlobStore,
    pub parsio: ParsioClient,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Self {
        let blobs = BlobStore::new(config.data_dir.join("blobs"), config.public_base_url.clone());
        let parsio = ParsioClient::new(
            config.parsio_base_url.clone(),
            config.parsio_api_key.clone(),
            config.parsio_mailbox_id.clone(),
        );
        AppState {
            db: Arc::new(Mutex::new(db)),
            blobs,
            parsio,
            config: Arc::new(config),
        }
    }

    pub fn db(&self) -> Result<MutexGuard<'_, Database>, AppError> {
        self.db
            .lock()
            .map_err(|_| AppError::Internal(anyhow!("database lock poisoned")))
    }
}
