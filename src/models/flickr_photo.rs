use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// Top level of a `flickr.photos.search` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchEnvelope {
    pub stat: String,
    pub photos: Option<FlickrPhotoPage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlickrPhotoPage {
    #[serde(default)]
    pub page: Option<u32>,
    pub pages: u32,
    #[serde(default)]
    pub perpage: Option<u32>,
    pub photo: Vec<FlickrPhoto>,
}

/// One search result. `url_m` is only present when `extras=url_m` was requested
/// and Flickr has a medium-size rendition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlickrPhoto {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url_m: Option<String>,
}

/// What the provider keeps from a successful search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub page: u32,
    pub pages: u32,
    pub urls: Vec<String>,
}

impl SearchPage {
    /// Decode a parsed response body. Missing `photos`, `pages` or `photo`
    /// fields are a malformed response.
    pub fn from_json(body: Value, requested_page: u32) -> AppResult<Self> {
        let envelope: SearchEnvelope = serde_json::from_value(body)
            .map_err(|e| AppError::MalformedResponse(format!("search response: {}", e)))?;

        let photos = envelope
            .photos
            .ok_or_else(|| AppError::MalformedResponse("search response has no photos".into()))?;

        let mut urls = Vec::with_capacity(photos.photo.len());
        for photo in photos.photo {
            match photo.url_m {
                Some(url) if !url.is_empty() => urls.push(url),
                _ => tracing::warn!("Skipping photo {} without a medium image URL", photo.id),
            }
        }

        Ok(Self {
            page: photos.page.unwrap_or(requested_page),
            pages: photos.pages,
            urls,
        })
    }
}
