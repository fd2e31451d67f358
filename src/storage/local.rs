use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{AppError, AppResult};

use super::ImageStore;

/// Images as flat files in the documents directory, one per photo, named by
/// the last path segment of the source URL.
pub struct LocalImageStore {
    dir: PathBuf,
}

impl LocalImageStore {
    pub async fn new(dir: PathBuf) -> AppResult<Self> {
        fs::create_dir_all(&dir).await?;
        tracing::info!("Image directory: {}", dir.display());
        Ok(Self { dir })
    }

    /// Resolve a stored path (or bare file name) inside the documents
    /// directory. Only the file name is kept, so a record written under an
    /// older directory still resolves.
    fn resolve(&self, stored_path: &str) -> AppResult<PathBuf> {
        let file_name = Path::new(stored_path)
            .file_name()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::Storage(format!("invalid image path: {:?}", stored_path)))?;
        Ok(self.dir.join(file_name))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn save(&self, file_name: &str, data: &[u8]) -> AppResult<String> {
        let path = self.resolve(file_name)?;
        fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("write {} failed: {}", path.display(), e)))?;

        tracing::debug!("Stored image: path={}, size={}", path.display(), data.len());
        Ok(path.to_string_lossy().into_owned())
    }

    async fn load(&self, stored_path: &str) -> AppResult<Vec<u8>> {
        let path = self.resolve(stored_path)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("image {}", path.display())))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, stored_path: &str) -> AppResult<()> {
        let path = self.resolve(stored_path)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("Deleted image: path={}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "delete {} failed: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn exists(&self, stored_path: &str) -> bool {
        match self.resolve(stored_path) {
            Ok(path) => fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }
}
