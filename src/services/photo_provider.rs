use rand::Rng;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::config::FlickrConfig;
use crate::dispatch::{Completion, Dispatcher};
use crate::error::AppResult;
use crate::http_client::{HttpClient, QueryParams};
use crate::models::{Coordinate, Photo, Pin, SearchPage};
use crate::services::photo_library::{ImageRecord, PhotoLibrary};
use crate::storage::ImageStore;

pub const SEARCH_METHOD: &str = "flickr.photos.search";
pub const MEDIUM_PHOTO_EXTRA: &str = "url_m";
pub const DATA_FORMAT: &str = "json";
pub const NO_JSON_CALLBACK: &str = "1";
pub const SAFE_SEARCH: &str = "1";

/// What the UI should react to after a completion has been applied.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    PhotosAdded { pin_id: String, count: usize },
    SearchFailed {
        pin_id: String,
        message: String,
        /// Whether searching again may help.
        retryable: bool,
    },
    ImageStored { pin_id: String, photo_id: String },
    ImageFailed { pin_id: String, photo_id: String },
    /// A completion arrived for a pin or photo that was deleted meanwhile.
    Discarded,
}

impl UiEvent {
    pub fn pin_id(&self) -> Option<&str> {
        match self {
            UiEvent::PhotosAdded { pin_id, .. }
            | UiEvent::SearchFailed { pin_id, .. }
            | UiEvent::ImageStored { pin_id, .. }
            | UiEvent::ImageFailed { pin_id, .. } => Some(pin_id),
            UiEvent::Discarded => None,
        }
    }
}

/// Page to request: 1 when the pin has no usable page count, otherwise
/// uniformly random in `[1, page_count]`.
pub fn choose_page<R: Rng + ?Sized>(page_count: Option<i64>, rng: &mut R) -> u32 {
    match page_count {
        Some(count) if count >= 1 => {
            let upper = u32::try_from(count).unwrap_or(u32::MAX);
            rng.gen_range(1..=upper)
        }
        _ => 1,
    }
}

pub fn search_parameters(config: &FlickrConfig, coordinate: Coordinate, page: u32) -> QueryParams {
    let mut params = QueryParams::new();
    params.insert("method".into(), SEARCH_METHOD.into());
    params.insert("api_key".into(), config.api_key.clone());
    params.insert("format".into(), DATA_FORMAT.into());
    params.insert("nojsoncallback".into(), NO_JSON_CALLBACK.into());
    params.insert("safe_search".into(), SAFE_SEARCH.into());
    params.insert("extras".into(), MEDIUM_PHOTO_EXTRA.into());
    params.insert("bbox".into(), coordinate.bounding_box().to_query_value());
    params.insert("page".into(), page.to_string());
    params.insert("per_page".into(), config.per_page.to_string());
    params
}

/// Searches Flickr around a pin and downloads the results into the library.
///
/// The `fetch_*` methods do the whole flow from the caller's context; the
/// `begin_*` methods hand network work to the dispatcher and leave store
/// writes to [`PhotoProvider::apply`] on the UI queue. At most one search per
/// pin is in flight.
#[derive(Clone)]
pub struct PhotoProvider {
    http: HttpClient,
    flickr: FlickrConfig,
    library: PhotoLibrary,
    dispatcher: Dispatcher,
    searching: Arc<Mutex<HashSet<String>>>,
}

impl PhotoProvider {
    pub fn new(
        http: HttpClient,
        flickr: FlickrConfig,
        library: PhotoLibrary,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            http,
            flickr,
            library,
            dispatcher,
            searching: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn library(&self) -> &PhotoLibrary {
        &self.library
    }

    /// Run one search request. Touches no storage.
    pub async fn search(&self, coordinate: Coordinate, page: u32) -> AppResult<SearchPage> {
        search_page(&self.http, &self.flickr, coordinate, page).await
    }

    /// Search a page for the pin, store the page count and one photo per
    /// result, then start a download per photo. Nothing is stored on failure.
    pub async fn fetch_photos_for_pin(&self, pin: &Pin) -> AppResult<Vec<Photo>> {
        let page = choose_page(pin.page_count, &mut rand::thread_rng());
        tracing::info!("Fetching photos: pin={}, page={}", pin.id, page);

        let search = self.search(pin.coordinate(), page).await?;
        let created = self
            .library
            .record_search(&pin.id, &search)
            .await?
            .unwrap_or_default();

        for photo in &created {
            self.begin_fetch_image(photo);
        }
        Ok(created)
    }

    /// True while a worker search for the pin has not been applied yet.
    pub fn is_searching(&self, pin_id: &str) -> bool {
        self.searching
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(pin_id)
    }

    /// Start the search on a worker. Returns the requested page, or `None`
    /// when a search for the pin is already running.
    pub fn begin_fetch_for_pin(&self, pin: &Pin) -> Option<u32> {
        {
            let mut searching = self.searching.lock().unwrap_or_else(|e| e.into_inner());
            if !searching.insert(pin.id.clone()) {
                tracing::debug!("Search already running for pin {}", pin.id);
                return None;
            }
        }

        let page = choose_page(pin.page_count, &mut rand::thread_rng());
        tracing::info!("Starting photo search: pin={}, page={}", pin.id, page);

        let http = self.http.clone();
        let flickr = self.flickr.clone();
        let pin_id = pin.id.clone();
        let coordinate = pin.coordinate();
        self.dispatcher.spawn(async move {
            let result = search_page(&http, &flickr, coordinate, page).await;
            Completion::Search {
                pin_id,
                page,
                result,
            }
        });
        Some(page)
    }

    fn finish_search(&self, pin_id: &str) {
        self.searching
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(pin_id);
    }

    /// Download and record one photo's image. On failure the photo gets the
    /// error marker and the error is returned.
    pub async fn fetch_image(&self, photo: &Photo) -> AppResult<()> {
        let result = download_image(&self.http, self.library.images().as_ref(), photo).await;
        self.library.record_image(&photo.id, &result).await?;
        result.map(|_| ())
    }

    /// Start a download on a worker; its outcome is recorded by `apply`.
    pub fn begin_fetch_image(&self, photo: &Photo) {
        let http = self.http.clone();
        let images = self.library.images().clone();
        let photo = photo.clone();
        self.dispatcher.spawn(async move {
            let result = download_image(&http, images.as_ref(), &photo).await;
            Completion::Image {
                photo_id: photo.id,
                result,
            }
        });
    }

    /// Put a failed photo back to pending and download it again.
    pub async fn retry_image(&self, photo: &Photo) -> AppResult<()> {
        self.library.mark_pending(&photo.id).await?;
        self.begin_fetch_image(photo);
        Ok(())
    }

    /// Apply a worker completion to the store. Must run on the UI queue.
    pub async fn apply(&self, completion: Completion) -> AppResult<UiEvent> {
        match completion {
            Completion::Search {
                pin_id,
                page,
                result: Ok(search),
            } => {
                self.finish_search(&pin_id);
                let Some(created) = self.library.record_search(&pin_id, &search).await? else {
                    return Ok(UiEvent::Discarded);
                };
                tracing::debug!("Search page {} gave {} photos", page, created.len());
                for photo in &created {
                    self.begin_fetch_image(photo);
                }
                Ok(UiEvent::PhotosAdded {
                    pin_id,
                    count: created.len(),
                })
            }
            Completion::Search {
                pin_id,
                page,
                result: Err(e),
            } => {
                self.finish_search(&pin_id);
                if self.library.find_pin(&pin_id).await?.is_none() {
                    tracing::warn!("Search failed for deleted pin {}, discarding: {}", pin_id, e);
                    return Ok(UiEvent::Discarded);
                }
                tracing::warn!("Photo search failed: pin={}, page={}, error={}", pin_id, page, e);
                Ok(UiEvent::SearchFailed {
                    pin_id,
                    message: e.to_string(),
                    retryable: e.is_retryable(),
                })
            }
            Completion::Image { photo_id, result } => {
                match self.library.record_image(&photo_id, &result).await? {
                    ImageRecord::Stored(photo) => Ok(UiEvent::ImageStored {
                        pin_id: photo.pin_id,
                        photo_id,
                    }),
                    ImageRecord::Failed(photo) => Ok(UiEvent::ImageFailed {
                        pin_id: photo.pin_id,
                        photo_id,
                    }),
                    ImageRecord::Discarded => Ok(UiEvent::Discarded),
                }
            }
        }
    }
}

async fn search_page(
    http: &HttpClient,
    flickr: &FlickrConfig,
    coordinate: Coordinate,
    page: u32,
) -> AppResult<SearchPage> {
    let params = search_parameters(flickr, coordinate, page);
    let body = http.get(&params).await?;
    SearchPage::from_json(body, page)
}

async fn download_image(
    http: &HttpClient,
    images: &dyn ImageStore,
    photo: &Photo,
) -> AppResult<String> {
    let bytes = http.get_raw(&photo.url).await?;
    images.save(&photo.file_name(), &bytes).await
}
