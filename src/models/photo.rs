use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stored in `image_path` when the download failed.
pub const IMAGE_ERROR_MARKER: &str = "error";

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub pin_id: String,
    pub url: String,
    /// `None` while downloading, [`IMAGE_ERROR_MARKER`] after a failure,
    /// otherwise the local file path.
    pub image_path: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageState {
    Pending,
    Failed,
    Stored(String),
}

impl Photo {
    pub fn new(pin_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            pin_id: pin_id.into(),
            url: url.into(),
            image_path: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn image_state(&self) -> ImageState {
        match self.image_path.as_deref() {
            None => ImageState::Pending,
            Some(IMAGE_ERROR_MARKER) => ImageState::Failed,
            Some(path) => ImageState::Stored(path.to_string()),
        }
    }

    /// Local file path, if the image has been stored.
    pub fn stored_path(&self) -> Option<&str> {
        match self.image_path.as_deref() {
            Some(IMAGE_ERROR_MARKER) | None => None,
            Some(path) => Some(path),
        }
    }

    /// File name for the downloaded image: the last path segment of the URL.
    pub fn file_name(&self) -> String {
        file_name_for_url(&self.url).unwrap_or_else(|| format!("{}.jpg", self.id))
    }
}

/// Last non-empty path segment of a URL.
pub fn file_name_for_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(|s| s.to_string())
}
