use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Blob store for raw invoice files. The database record is the source of
/// truth; blobs are derived artifacts, so deletion here is best effort from
/// the caller's point of view.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl BlobStore {
    pub fn new(root: PathBuf, public_base_url: impl Into<String>) -> Self {
        BlobStore {
            root,
            public_base_url: public_base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn save(&self, storage_path: &str, bytes: &[u8]) -> Result<()> {
        let full = self.root.join(storage_path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create blob dir {}", parent.display()))?;
        }
        tokio::fs::write(&full, bytes)
            .await
            .with_context(|| format!("write blob {}", full.display()))?;
        Ok(())
    }

    pub async fn delete(&self, storage_path: &str) -> Result<()> {
        let full = self.root.join(storage_path);
        tokio::fs::remove_file(&full)
            .await
            .with_context(|| format!("delete blob {}", full.display()))?;
        Ok(())
    }

    /// Public access URL for a stored blob, token appended Firebase-style.
    pub fn url_for(&self, storage_path: &str, token: &str) -> String {
        format!(
            "{}/files/{}?alt=media&token={}",
            self.public_base_url.trim_end_matches('/'),
            storage_path,
            token
        )
    }
}
