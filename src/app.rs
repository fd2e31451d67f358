use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, FlickrConfig};
use crate::db::{create_pool, run_migrations, ChangeSet};
use crate::dispatch::{self, UiQueue};
use crate::error::{AppError, AppResult};
use crate::http_client::HttpClient;
use crate::screens::{MapScreen, PhotoBrowser};
use crate::services::{PhotoLibrary, PhotoProvider, UiEvent};
use crate::storage::{ImageStore, LocalImageStore};

/// Application assembly: owns the store, the HTTP client, the UI queue and
/// the screens. Everything else receives its dependencies from here.
pub struct App {
    provider: PhotoProvider,
    queue: UiQueue,
    map: MapScreen,
    browser: Option<PhotoBrowser>,
}

impl App {
    pub async fn new(config: &Config) -> AppResult<Self> {
        tracing::info!("Opening database {}", config.database_url);
        let pool = create_pool(&config.database_url).await?;
        run_migrations(&pool).await?;

        let images = LocalImageStore::new(config.documents_dir.clone()).await?;
        let http = HttpClient::new(
            config.flickr.base_url.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )?;

        Self::assemble(pool, Arc::new(images), http, config.flickr.clone()).await
    }

    pub async fn assemble(
        pool: SqlitePool,
        images: Arc<dyn ImageStore>,
        http: HttpClient,
        flickr: FlickrConfig,
    ) -> AppResult<Self> {
        let (dispatcher, queue) = dispatch::channel();
        let library = PhotoLibrary::new(pool, images);
        let provider = PhotoProvider::new(http, flickr, library, dispatcher);
        let map = MapScreen::load(provider.clone()).await?;

        Ok(Self {
            provider,
            queue,
            map,
            browser: None,
        })
    }

    pub fn provider(&self) -> &PhotoProvider {
        &self.provider
    }

    pub fn library(&self) -> &PhotoLibrary {
        self.provider.library()
    }

    pub fn map(&self) -> &MapScreen {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut MapScreen {
        &mut self.map
    }

    pub async fn open_photos(&mut self, pin_id: &str) -> AppResult<&mut PhotoBrowser> {
        let browser = PhotoBrowser::open(self.provider.clone(), pin_id).await?;
        Ok(self.browser.insert(browser))
    }

    pub fn close_photos(&mut self) {
        self.browser = None;
    }

    pub fn browser(&self) -> Option<&PhotoBrowser> {
        self.browser.as_ref()
    }

    pub fn browser_mut(&mut self) -> AppResult<&mut PhotoBrowser> {
        self.browser
            .as_mut()
            .ok_or_else(|| AppError::Internal("photo browser is not open".to_string()))
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_idle()
    }

    /// Apply the next completion and route its event to the screens.
    /// `None` when no work is outstanding.
    pub async fn pump(&mut self) -> AppResult<Option<(UiEvent, Option<ChangeSet>)>> {
        let Some(completion) = self.queue.next().await else {
            return Ok(None);
        };
        let event = self.provider.apply(completion).await?;

        let change_set = match self.browser.as_mut() {
            Some(browser) => browser.on_event(&event).await?,
            None => None,
        };

        // A failed search the open browser already reported is not raised twice.
        let handled_by_browser = change_set.is_some();
        if !(handled_by_browser && matches!(event, UiEvent::SearchFailed { .. })) {
            self.map.on_event(&event).await?;
        }

        Ok(Some((event, change_set)))
    }

    /// Apply completions until no work is outstanding.
    pub async fn run_until_idle(&mut self) -> AppResult<Vec<UiEvent>> {
        let mut events = Vec::new();
        while let Some((event, _)) = self.pump().await? {
            events.push(event);
        }
        Ok(events)
    }
}
