use std::collections::BTreeSet;

use crate::db::{ChangeSet, PhotoFeed};
use crate::error::{AppError, AppResult};
use crate::models::{ImageState, MapRegion, Photo, Pin};
use crate::screens::alert::{Alert, RetryAction};
use crate::services::{PhotoProvider, UiEvent};

/// Size of the header map around the pin, in meters.
pub const PIN_REGION_METERS: f64 = 20_000.0;

pub const NEW_COLLECTION_TITLE: &str = "New Collection";
pub const DELETE_SELECTED_TITLE: &str = "Delete Selected Images";

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub photo: Photo,
    pub state: ImageState,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapOutcome {
    /// The failed download is being retried.
    Retrying,
    SelectionChanged { selected: bool },
    /// Still downloading; taps are not accepted.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryAction {
    NewCollection { discarded: usize, page: u32 },
    /// `changes` describes the removed cells against the previous grid.
    DeletedSelected { count: usize, changes: ChangeSet },
    /// A search for the pin is already loading.
    Busy,
}

/// Photo grid for one pin.
pub struct PhotoBrowser {
    provider: PhotoProvider,
    pin: Pin,
    feed: PhotoFeed,
    selected: BTreeSet<String>,
    alert: Option<Alert>,
}

impl PhotoBrowser {
    pub async fn open(provider: PhotoProvider, pin_id: &str) -> AppResult<Self> {
        let pin = provider.library().pin(pin_id).await?;
        let feed = PhotoFeed::load(provider.library().pool(), pin_id).await?;
        tracing::info!("Opened photos for pin {}: {} photos", pin_id, feed.photos().len());
        Ok(Self {
            provider,
            pin,
            feed,
            selected: BTreeSet::new(),
            alert: None,
        })
    }

    pub fn pin(&self) -> &Pin {
        &self.pin
    }

    pub fn region(&self) -> MapRegion {
        MapRegion::around(self.pin.coordinate(), PIN_REGION_METERS)
    }

    pub fn len(&self) -> usize {
        self.feed.photos().len()
    }

    pub fn is_empty(&self) -> bool {
        self.feed.photos().is_empty()
    }

    pub fn cells(&self) -> Vec<Cell> {
        self.feed
            .photos()
            .iter()
            .map(|photo| Cell {
                state: photo.image_state(),
                selected: self.selected.contains(&photo.id),
                photo: photo.clone(),
            })
            .collect()
    }

    pub fn selected_indexes(&self) -> Vec<usize> {
        self.feed
            .photos()
            .iter()
            .enumerate()
            .filter(|(_, photo)| self.selected.contains(&photo.id))
            .map(|(index, _)| index)
            .collect()
    }

    /// Drives the "no images" label.
    pub fn has_no_images(&self) -> bool {
        self.is_empty() && !self.is_fetching()
    }

    /// A search for this pin is running, whoever started it.
    pub fn is_fetching(&self) -> bool {
        self.provider.is_searching(&self.pin.id)
    }

    pub fn primary_action_enabled(&self) -> bool {
        !self.is_fetching()
    }

    pub fn primary_action_title(&self) -> &'static str {
        if self.selected.is_empty() {
            NEW_COLLECTION_TITLE
        } else {
            DELETE_SELECTED_TITLE
        }
    }

    pub async fn tap_cell(&mut self, index: usize) -> AppResult<TapOutcome> {
        let photo = self
            .feed
            .photos()
            .get(index)
            .cloned()
            .ok_or_else(|| AppError::InvalidInput(format!("no photo at index {}", index)))?;

        match photo.image_state() {
            ImageState::Failed => {
                self.provider.retry_image(&photo).await?;
                Ok(TapOutcome::Retrying)
            }
            ImageState::Pending => Ok(TapOutcome::Ignored),
            ImageState::Stored(_) => {
                let selected = if self.selected.remove(&photo.id) {
                    false
                } else {
                    self.selected.insert(photo.id.clone());
                    true
                };
                Ok(TapOutcome::SelectionChanged { selected })
            }
        }
    }

    /// "New Collection" with nothing selected, "Delete Selected Images" otherwise.
    pub async fn press_primary_action(&mut self) -> AppResult<PrimaryAction> {
        if !self.selected.is_empty() {
            let ids: Vec<String> = self.selected.iter().cloned().collect();
            let count = self.provider.library().delete_photos(&ids).await?;
            self.selected.clear();
            let changes = self.refresh().await?;
            return Ok(PrimaryAction::DeletedSelected { count, changes });
        }
        self.new_collection().await
    }

    /// Discard every photo of the pin and search a fresh page. `Busy`, with
    /// nothing discarded, while a search for the pin is still running.
    pub async fn new_collection(&mut self) -> AppResult<PrimaryAction> {
        if self.is_fetching() {
            return Ok(PrimaryAction::Busy);
        }

        let discarded = self
            .provider
            .library()
            .discard_photos_for_pin(&self.pin.id)
            .await?;
        self.selected.clear();

        // Page count may have changed since the browser opened.
        self.pin = self.provider.library().pin(&self.pin.id).await?;
        let Some(page) = self.provider.begin_fetch_for_pin(&self.pin) else {
            return Ok(PrimaryAction::Busy);
        };

        Ok(PrimaryAction::NewCollection { discarded, page })
    }

    /// Re-read the pin's photos and report grid changes since the last read.
    pub async fn refresh(&mut self) -> AppResult<ChangeSet> {
        let change_set = self.feed.refresh(self.provider.library().pool()).await?;
        let live: BTreeSet<&str> = self.feed.photos().iter().map(|p| p.id.as_str()).collect();
        self.selected.retain(|id| live.contains(id.as_str()));
        Ok(change_set)
    }

    /// React to an applied completion. Returns the grid changes when the
    /// event concerns this pin.
    pub async fn on_event(&mut self, event: &UiEvent) -> AppResult<Option<ChangeSet>> {
        if event.pin_id() != Some(self.pin.id.as_str()) {
            return Ok(None);
        }

        match event {
            UiEvent::PhotosAdded { .. } => {
                self.pin = self.provider.library().pin(&self.pin.id).await?;
            }
            UiEvent::SearchFailed {
                message, retryable, ..
            } => {
                self.alert = Some(Alert::failure(
                    message.clone(),
                    *retryable,
                    RetryAction::NewCollection {
                        pin_id: self.pin.id.clone(),
                    },
                ));
            }
            _ => {}
        }

        Ok(Some(self.refresh().await?))
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    pub fn take_alert(&mut self) -> Option<Alert> {
        self.alert.take()
    }

    pub async fn retry(&mut self, action: &RetryAction) -> AppResult<Option<PrimaryAction>> {
        match action {
            RetryAction::NewCollection { pin_id } if *pin_id == self.pin.id => {
                Ok(Some(self.new_collection().await?))
            }
            _ => Ok(None),
        }
    }
}
