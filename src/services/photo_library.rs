use sqlx::SqlitePool;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::db::{photos, pins, settings};
use crate::error::{AppError, AppResult};
use crate::models::{Coordinate, MapRegion, Photo, Pin, SearchPage, IMAGE_ERROR_MARKER};
use crate::storage::ImageStore;

/// Outcome of applying a finished image download to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageRecord {
    Stored(Photo),
    Failed(Photo),
    /// The photo was deleted while its download was running.
    Discarded,
}

/// Pins, photos and their image files. Owns the deletion rules: photo rows go
/// before their pin, and a file goes once no photo references it.
#[derive(Clone)]
pub struct PhotoLibrary {
    pool: SqlitePool,
    images: Arc<dyn ImageStore>,
}

impl PhotoLibrary {
    pub fn new(pool: SqlitePool, images: Arc<dyn ImageStore>) -> Self {
        Self { pool, images }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn images(&self) -> &Arc<dyn ImageStore> {
        &self.images
    }

    pub async fn create_pin(&self, coordinate: Coordinate) -> AppResult<Pin> {
        if !coordinate.is_valid() {
            return Err(AppError::InvalidInput(format!(
                "coordinate out of range: {}, {}",
                coordinate.latitude, coordinate.longitude
            )));
        }

        let pin = Pin::new(coordinate);
        pins::insert_pin(&self.pool, &pin).await?;
        tracing::info!(
            "Created pin: id={}, lat={}, lon={}",
            pin.id,
            pin.latitude,
            pin.longitude
        );
        Ok(pin)
    }

    pub async fn pin(&self, pin_id: &str) -> AppResult<Pin> {
        pins::get_pin(&self.pool, pin_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("pin {}", pin_id)))
    }

    pub async fn find_pin(&self, pin_id: &str) -> AppResult<Option<Pin>> {
        Ok(pins::get_pin(&self.pool, pin_id).await?)
    }

    pub async fn pins(&self) -> AppResult<Vec<Pin>> {
        Ok(pins::list_pins(&self.pool).await?)
    }

    pub async fn photos(&self, pin_id: &str) -> AppResult<Vec<Photo>> {
        Ok(photos::photos_for_pin(&self.pool, pin_id).await?)
    }

    pub async fn photo(&self, photo_id: &str) -> AppResult<Option<Photo>> {
        Ok(photos::get_photo(&self.pool, photo_id).await?)
    }

    /// Persist a successful search: the page count and one pending photo per
    /// URL, in one transaction. `None` when the pin no longer exists.
    pub async fn record_search(
        &self,
        pin_id: &str,
        search: &SearchPage,
    ) -> AppResult<Option<Vec<Photo>>> {
        let mut tx = self.pool.begin().await?;

        if pins::update_page_count(&mut *tx, pin_id, i64::from(search.pages)).await? == 0 {
            tracing::warn!("Search finished for deleted pin {}, discarding", pin_id);
            return Ok(None);
        }

        let mut created = Vec::with_capacity(search.urls.len());
        for url in &search.urls {
            let photo = Photo::new(pin_id, url.as_str());
            photos::insert_photo(&mut *tx, &photo).await?;
            created.push(photo);
        }
        tx.commit().await?;

        tracing::info!(
            "Recorded search: pin={}, page={}, pages={}, photos={}",
            pin_id,
            search.page,
            search.pages,
            created.len()
        );
        Ok(Some(created))
    }

    /// Record a finished download: the stored path, or the error marker.
    pub async fn record_image(
        &self,
        photo_id: &str,
        result: &AppResult<String>,
    ) -> AppResult<ImageRecord> {
        let Some(mut photo) = photos::get_photo(&self.pool, photo_id).await? else {
            tracing::warn!("Download finished for deleted photo {}, discarding", photo_id);
            if let Ok(path) = result {
                self.release_files([path.clone()]).await;
            }
            return Ok(ImageRecord::Discarded);
        };

        match result {
            Ok(path) if !self.images.exists(path).await => {
                tracing::warn!("Image for photo {} vanished before it was recorded: {}", photo_id, path);
                photos::set_image_path(&self.pool, photo_id, Some(IMAGE_ERROR_MARKER)).await?;
                photo.image_path = Some(IMAGE_ERROR_MARKER.to_string());
                Ok(ImageRecord::Failed(photo))
            }
            Ok(path) => {
                photos::set_image_path(&self.pool, photo_id, Some(path)).await?;
                photo.image_path = Some(path.clone());
                Ok(ImageRecord::Stored(photo))
            }
            Err(e) => {
                tracing::warn!("Image download failed: photo={}, error={}", photo_id, e);
                photos::set_image_path(&self.pool, photo_id, Some(IMAGE_ERROR_MARKER)).await?;
                photo.image_path = Some(IMAGE_ERROR_MARKER.to_string());
                Ok(ImageRecord::Failed(photo))
            }
        }
    }

    /// Put a photo back in the pending state before retrying its download.
    pub async fn mark_pending(&self, photo_id: &str) -> AppResult<()> {
        if photos::set_image_path(&self.pool, photo_id, None).await? == 0 {
            return Err(AppError::NotFound(format!("photo {}", photo_id)));
        }
        Ok(())
    }

    /// Delete the given photos and their files.
    pub async fn delete_photos(&self, photo_ids: &[String]) -> AppResult<usize> {
        let mut tx = self.pool.begin().await?;
        let mut paths = Vec::new();
        let mut deleted = 0;
        for photo_id in photo_ids {
            if let Some(photo) = photos::get_photo(&mut *tx, photo_id).await? {
                paths.extend(photo.stored_path().map(str::to_string));
                deleted += photos::delete_photo(&mut *tx, photo_id).await? as usize;
            }
        }
        tx.commit().await?;

        self.release_files(paths).await;
        tracing::info!("Deleted {} photos", deleted);
        Ok(deleted)
    }

    /// Delete every photo of a pin and their files, keeping the pin.
    pub async fn discard_photos_for_pin(&self, pin_id: &str) -> AppResult<usize> {
        let mut tx = self.pool.begin().await?;
        let existing = photos::photos_for_pin(&mut *tx, pin_id).await?;
        let deleted = photos::delete_photos_for_pin(&mut *tx, pin_id).await? as usize;
        tx.commit().await?;

        self.release_files(existing.iter().filter_map(|p| p.stored_path().map(str::to_string)))
            .await;
        tracing::info!("Discarded {} photos of pin {}", deleted, pin_id);
        Ok(deleted)
    }

    /// Delete a pin, its photos and their files. Returns the number of photos removed.
    pub async fn delete_pin(&self, pin_id: &str) -> AppResult<usize> {
        let mut tx = self.pool.begin().await?;
        let existing = photos::photos_for_pin(&mut *tx, pin_id).await?;
        let deleted_photos = photos::delete_photos_for_pin(&mut *tx, pin_id).await? as usize;
        if pins::delete_pin(&mut *tx, pin_id).await? == 0 {
            return Err(AppError::NotFound(format!("pin {}", pin_id)));
        }
        tx.commit().await?;

        self.release_files(existing.iter().filter_map(|p| p.stored_path().map(str::to_string)))
            .await;
        tracing::info!("Deleted pin {} with {} photos", pin_id, deleted_photos);
        Ok(deleted_photos)
    }

    pub async fn load_region(&self) -> AppResult<Option<MapRegion>> {
        Ok(settings::load_region(&self.pool).await?)
    }

    pub async fn save_region(&self, region: &MapRegion) -> AppResult<()> {
        region.validate()?;
        Ok(settings::save_region(&self.pool, region).await?)
    }

    /// Delete image files that no remaining photo references. Runs after the
    /// owning rows are committed; failures are logged and skipped.
    async fn release_files<I>(&self, paths: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let unique: BTreeSet<String> = paths.into_iter().collect();
        if unique.is_empty() {
            return 0;
        }

        // A pending download writes to the same file name it will later record.
        let pending: BTreeSet<String> = match photos::pending_photos(&self.pool).await {
            Ok(pending) => pending.iter().map(Photo::file_name).collect(),
            Err(e) => {
                tracing::warn!("Failed to list pending photos, keeping files: {}", e);
                return 0;
            }
        };

        let mut removed = 0;
        for path in unique {
            let awaited = Path::new(&path)
                .file_name()
                .map(|name| pending.contains(name.to_string_lossy().as_ref()))
                .unwrap_or(false);
            if awaited {
                tracing::debug!("Image {} awaited by a pending download, keeping", path);
                continue;
            }

            match photos::count_path_references(&self.pool, &path).await {
                Ok(0) => match self.images.delete(&path).await {
                    Ok(()) => removed += 1,
                    Err(e) => tracing::warn!("Failed to delete image {}: {}", path, e),
                },
                Ok(_) => tracing::debug!("Image {} still referenced, keeping", path),
                Err(e) => tracing::warn!("Failed to check references for {}: {}", path, e),
            }
        }
        removed
    }
}
