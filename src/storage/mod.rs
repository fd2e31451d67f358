// Image storage abstraction for downloaded photos

pub mod local;

pub use local::LocalImageStore;

use async_trait::async_trait;

use crate::error::AppResult;

/// Where downloaded image bytes live. Paths returned by `save` are what the
/// photo record stores; the other methods accept them back.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Write the bytes under `file_name` and return the stored path.
    async fn save(&self, file_name: &str, data: &[u8]) -> AppResult<String>;

    async fn load(&self, stored_path: &str) -> AppResult<Vec<u8>>;

    /// Remove the file. A file that is already gone is not an error.
    async fn delete(&self, stored_path: &str) -> AppResult<()>;

    async fn exists(&self, stored_path: &str) -> bool;

}
