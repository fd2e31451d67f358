use crate::error::AppResult;
use crate::models::{Coordinate, MapRegion, Pin};
use crate::screens::alert::{Alert, RetryAction};
use crate::services::{PhotoProvider, UiEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMode {
    Browsing,
    Deleting,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapAction {
    /// Navigate to the photo browser for this pin.
    ShowPhotos(Pin),
    Removed { pin_id: String, photos: usize },
}

/// A pin as drawn on the map. `pin_id` is `None` for the pin being dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub pin_id: Option<String>,
    pub coordinate: Coordinate,
}

/// Map screen controller: pin drops, pin taps in either mode, and the saved
/// viewport.
pub struct MapScreen {
    provider: PhotoProvider,
    mode: MapMode,
    pins: Vec<Pin>,
    draft: Option<Coordinate>,
    region: Option<MapRegion>,
    alert: Option<Alert>,
}

impl MapScreen {
    /// Load persisted pins and the last viewed region.
    pub async fn load(provider: PhotoProvider) -> AppResult<Self> {
        let pins = provider.library().pins().await?;
        let region = provider.library().load_region().await?;
        tracing::info!("Map loaded with {} pins", pins.len());
        Ok(Self {
            provider,
            mode: MapMode::Browsing,
            pins,
            draft: None,
            region,
            alert: None,
        })
    }

    pub fn mode(&self) -> MapMode {
        self.mode
    }

    pub fn toggle_editing(&mut self) -> MapMode {
        self.mode = match self.mode {
            MapMode::Browsing => MapMode::Deleting,
            MapMode::Deleting => MapMode::Browsing,
        };
        self.mode
    }

    pub fn edit_button_title(&self) -> &'static str {
        match self.mode {
            MapMode::Browsing => "Edit",
            MapMode::Deleting => "Done",
        }
    }

    /// Hint shown while in delete mode.
    pub fn delete_hint(&self) -> Option<&'static str> {
        match self.mode {
            MapMode::Browsing => None,
            MapMode::Deleting => Some("Tap Pins to Delete"),
        }
    }

    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    pub fn annotations(&self) -> Vec<Annotation> {
        let mut annotations: Vec<Annotation> = self
            .pins
            .iter()
            .map(|pin| Annotation {
                pin_id: Some(pin.id.clone()),
                coordinate: pin.coordinate(),
            })
            .collect();
        if let Some(coordinate) = self.draft {
            annotations.push(Annotation {
                pin_id: None,
                coordinate,
            });
        }
        annotations
    }

    /// Long press began: place a provisional pin. Ignored while deleting.
    pub fn begin_drop(&mut self, coordinate: Coordinate) -> bool {
        if self.mode == MapMode::Deleting {
            return false;
        }
        self.draft = Some(coordinate);
        true
    }

    /// Long press moved: follow the finger.
    pub fn move_drop(&mut self, coordinate: Coordinate) -> bool {
        match self.draft.as_mut() {
            Some(draft) => {
                *draft = coordinate;
                true
            }
            None => false,
        }
    }

    pub fn cancel_drop(&mut self) {
        self.draft = None;
    }

    /// Long press ended: persist the pin and start fetching its photos.
    pub async fn end_drop(&mut self) -> AppResult<Option<Pin>> {
        let Some(coordinate) = self.draft.take() else {
            return Ok(None);
        };

        let pin = self.provider.library().create_pin(coordinate).await?;
        self.provider.begin_fetch_for_pin(&pin);
        self.pins.push(pin.clone());
        Ok(Some(pin))
    }

    pub async fn tap_pin(&mut self, pin_id: &str) -> AppResult<MapAction> {
        match self.mode {
            MapMode::Browsing => {
                let pin = self.provider.library().pin(pin_id).await?;
                Ok(MapAction::ShowPhotos(pin))
            }
            MapMode::Deleting => {
                let photos = self.provider.library().delete_pin(pin_id).await?;
                self.pins.retain(|pin| pin.id != pin_id);
                Ok(MapAction::Removed {
                    pin_id: pin_id.to_string(),
                    photos,
                })
            }
        }
    }

    /// User moved or zoomed the map.
    pub async fn region_changed(&mut self, region: MapRegion) -> AppResult<()> {
        self.provider.library().save_region(&region).await?;
        self.region = Some(region);
        Ok(())
    }

    pub fn region(&self) -> Option<MapRegion> {
        self.region
    }

    pub async fn restore_region(&mut self) -> AppResult<Option<MapRegion>> {
        self.region = self.provider.library().load_region().await?;
        Ok(self.region)
    }

    /// React to an applied completion. Search failures for map pins raise an
    /// alert offering to search again.
    pub async fn on_event(&mut self, event: &UiEvent) -> AppResult<()> {
        match event {
            UiEvent::SearchFailed {
                pin_id,
                message,
                retryable,
            } => {
                self.alert = Some(Alert::failure(
                    message.clone(),
                    *retryable,
                    RetryAction::FetchPin {
                        pin_id: pin_id.clone(),
                    },
                ));
            }
            UiEvent::PhotosAdded { pin_id, .. } => {
                // Keep the cached page count current for the next fetch.
                let pin = self.provider.library().pin(pin_id).await?;
                if let Some(existing) = self.pins.iter_mut().find(|p| p.id == pin.id) {
                    *existing = pin;
                }
            }
            _ => {}
        }
        Ok(())
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    pub fn take_alert(&mut self) -> Option<Alert> {
        self.alert.take()
    }

    /// Run the alert's retry action.
    pub async fn retry(&mut self, action: &RetryAction) -> AppResult<()> {
        if let RetryAction::FetchPin { pin_id } = action {
            let pin = self.provider.library().pin(pin_id).await?;
            self.provider.begin_fetch_for_pin(&pin);
        }
        Ok(())
    }
}
