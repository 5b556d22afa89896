use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::errors::ArtifactError;

/// Durable storage for decoded artifact payloads. Implementations take an
/// already-staged local file so the caller controls the temp-file lifetime.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store the staged file under `name` and return the durable URL.
    async fn put(&self, name: &str, staged: &Path) -> Result<String, ArtifactError>;
}

/// Filesystem-backed artifact store.
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(&self, name: &str, staged: &Path) -> Result<String, ArtifactError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let destination = self.root.join(name);
        tokio::fs::copy(staged, &destination).await?;

        debug!(artifact = %destination.display(), "artifact stored");
        Ok(format!("file://{}", destination.display()))
    }
}
