//! Shared application state.

use chrono::Utc;
use std::sync::Arc;

use crate::chart::{render_charts, ChartImage, ChartRenderer};
use crate::config::Config;
use crate::demo::{synthetic_samples, synthetic_start, SYNTHETIC_SAMPLES, SYNTHETIC_STEP_DAYS};
use crate::link::AlbumLink;
use crate::locks::AlbumLocks;
use crate::refresh::RefreshJob;
use crate::scrape::{scrape_detached, AlbumScraper};
use crate::store::Store;
use crate::types::Album;
use crate::{Result, VkStatsError};

/// Everything the bot handlers and the scheduler need, built once in `main`.
pub struct AppContext {
    pub config: Config,
    store: Store,
    scraper: Arc<dyn AlbumScraper>,
    renderer: Arc<dyn ChartRenderer>,
    locks: AlbumLocks,
}

impl AppContext {
    pub fn new(
        config: Config,
        store: Store,
        scraper: Arc<dyn AlbumScraper>,
        renderer: Arc<dyn ChartRenderer>,
    ) -> Self {
        Self {
            config,
            store,
            scraper,
            renderer,
            locks: AlbumLocks::new(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Validate, scrape and start tracking an album.
    ///
    /// The duplicate check is repeated under the album lock so two users
    /// sending the same link at once cannot both insert it.
    pub async fn add_album(&self, url: &str) -> Result<Album> {
        let url = url.trim();
        let link = AlbumLink::parse(url).ok_or_else(|| VkStatsError::InvalidLink(url.to_string()))?;
        let external_id = link.external_id();

        if self.store.find_by_external_id(&external_id)?.is_some() {
            return Err(VkStatsError::DuplicateAlbum(external_id));
        }

        let _guard = self.locks.acquire(&external_id).await;
        if self.store.find_by_external_id(&external_id)?.is_some() {
            return Err(VkStatsError::DuplicateAlbum(external_id));
        }

        let info = scrape_detached(self.scraper.clone(), url.to_string()).await?;
        let album = self
            .store
            .insert_album(url, &link, &info, Utc::now().naive_utc())?;
        log::info!("Now tracking album {}: {album}", album.id);
        Ok(album)
    }

    pub fn albums(&self) -> Result<Vec<Album>> {
        self.store.albums()
    }

    pub fn album(&self, id: i64) -> Result<Album> {
        self.store
            .album(id)?
            .ok_or_else(|| VkStatsError::NotFound(format!("album {id}")))
    }

    /// Render the play-count history of an album.
    ///
    /// Drawing is CPU bound and runs on the blocking pool.
    pub async fn album_charts(&self, id: i64) -> Result<Vec<ChartImage>> {
        let samples = self.store.samples(id)?;
        let renderer = self.renderer.clone();
        tokio::task::spawn_blocking(move || render_charts(renderer.as_ref(), &samples))
            .await
            .map_err(|e| VkStatsError::Chart(format!("chart task failed: {e}")))?
    }

    pub fn refresh_job(&self) -> RefreshJob {
        RefreshJob::new(
            self.store.clone(),
            self.scraper.clone(),
            self.locks.clone(),
            self.config.stale_after(),
        )
    }

    /// Drop every album and sample.
    pub fn reset(&self) -> Result<()> {
        self.store.clear()
    }

    /// Add the synthetic 25-point history to the configured album.
    pub fn inject_synthetic_samples(&self) -> Result<usize> {
        let album_id = self.config.synthetic_album_id;
        if self.store.album(album_id)?.is_none() {
            log::warn!("Synthetic samples target album {album_id}, which does not exist yet");
        }

        let samples = synthetic_samples(
            &mut rand::thread_rng(),
            synthetic_start(),
            SYNTHETIC_SAMPLES,
            SYNTHETIC_STEP_DAYS,
        );
        let inserted = self.store.insert_samples(album_id, &samples)?;
        log::info!("Inserted {inserted} synthetic samples for album {album_id}");
        Ok(inserted)
    }
}
