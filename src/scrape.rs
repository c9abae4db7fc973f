//! Album page scraping.
//!
//! [`VkScraper`] combines a [`PageLoader`] with the [`VkParser`]: it picks the
//! markers and parse rules from the link kind, loads the page and extracts
//! an [`AlbumInfo`].

use async_trait::async_trait;
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;

use crate::link::{AlbumLink, LinkKind};
use crate::loader::{PageLoader, PageWait};
use crate::parsing::VkParser;
use crate::types::AlbumInfo;
use crate::{Result, VkStatsError};

/// Default deadline for a page and its markers.
pub const DEFAULT_SCRAPE_TIMEOUT: Duration = Duration::from_secs(30);

/// Something that can turn an album or playlist URL into its current data.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait AlbumScraper: Send + Sync {
    /// Scrape the album or playlist at `url`.
    ///
    /// Fails with [`VkStatsError::NotFound`] when the page never shows the
    /// album header and with [`VkStatsError::Scrape`] otherwise.
    async fn scrape(&self, url: &str) -> Result<AlbumInfo>;
}

/// Scraper for vk.com music pages.
pub struct VkScraper<L: PageLoader> {
    loader: L,
    parser: VkParser,
    timeout: Duration,
}

impl<L: PageLoader> VkScraper<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            parser: VkParser::new(),
            timeout: DEFAULT_SCRAPE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl<L: PageLoader> AlbumScraper for VkScraper<L> {
    async fn scrape(&self, url: &str) -> Result<AlbumInfo> {
        let link = AlbumLink::parse(url).ok_or_else(|| VkStatsError::InvalidLink(url.to_string()))?;

        let markers = match link.kind {
            LinkKind::Album => VkParser::album_markers(),
            LinkKind::Playlist => VkParser::playlist_markers(),
        };
        let wait = PageWait::new(markers, self.timeout);

        let html = self.loader.load(url, &wait).await.map_err(|e| {
            log::error!("Failed to load {} {url}: {e}", link.kind);
            match e {
                VkStatsError::NotFound(_) | VkStatsError::Scrape(_) => e,
                other => VkStatsError::Scrape(other.to_string()),
            }
        })?;

        let document = Html::parse_document(&html);
        let info = match link.kind {
            LinkKind::Album => self.parser.parse_album(&document),
            LinkKind::Playlist => self.parser.parse_playlist(&document),
        };
        log::info!("Scraped {} {url}: {info}", link.kind);
        Ok(info)
    }
}

/// Run a scrape on its own task so the caller's task is never blocked by it.
pub async fn scrape_detached(scraper: Arc<dyn AlbumScraper>, url: String) -> Result<AlbumInfo> {
    tokio::spawn(async move { scraper.scrape(&url).await })
        .await
        .map_err(|e| VkStatsError::Scrape(format!("scrape task failed: {e}")))?
}
