//! Periodic re-scraping of tracked albums.

use chrono::{Duration, NaiveDateTime, Utc};
use std::sync::Arc;

use crate::cancel::{sleep_with_cancel, CancellationState};
use crate::locks::AlbumLocks;
use crate::scrape::{scrape_detached, AlbumScraper};
use crate::store::Store;
use crate::types::Album;
use crate::Result;

/// Default minimum age of a checkpoint before an album is scraped again.
pub const DEFAULT_STALE_AFTER_DAYS: i64 = 5;

/// Outcome counts of one refresh pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub refreshed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Re-scrapes every album whose checkpoint is stale and appends a sample.
#[derive(Clone)]
pub struct RefreshJob {
    store: Store,
    scraper: Arc<dyn AlbumScraper>,
    locks: AlbumLocks,
    stale_after: Duration,
}

impl RefreshJob {
    pub fn new(
        store: Store,
        scraper: Arc<dyn AlbumScraper>,
        locks: AlbumLocks,
        stale_after: Duration,
    ) -> Self {
        Self {
            store,
            scraper,
            locks,
            stale_after,
        }
    }

    /// One pass over all albums, as of `now`.
    ///
    /// A failing album is logged and counted; it never stops the pass.
    pub async fn run_once(&self, now: NaiveDateTime) -> Result<RefreshReport> {
        let albums = self.store.albums()?;
        log::info!("Refreshing {} albums", albums.len());

        let mut report = RefreshReport::default();
        for album in albums {
            match self.refresh_album(&album, now).await {
                Ok(true) => report.refreshed += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    log::error!("Error updating album {} ({}): {e}", album.id, album.url);
                    report.failed += 1;
                }
            }
        }

        log::info!(
            "Refresh finished: {} refreshed, {} skipped, {} failed",
            report.refreshed,
            report.skipped,
            report.failed
        );
        Ok(report)
    }

    /// Returns whether a new sample was recorded.
    async fn refresh_album(&self, album: &Album, now: NaiveDateTime) -> Result<bool> {
        let _guard = self.locks.acquire(album.lock_key()).await;

        // The add flow or a previous pass may have moved the checkpoint while
        // we waited for the lock.
        let Some(current) = self.store.album(album.id)? else {
            log::debug!("Album {} was removed, skipping", album.id);
            return Ok(false);
        };
        if !current.checkpoint().is_due(now, self.stale_after) {
            log::info!("Skipping album {}: refreshed less than {} days ago", current.id, self.stale_after.num_days());
            return Ok(false);
        }

        let info = scrape_detached(self.scraper.clone(), current.url.clone()).await?;
        self.store.record_refresh(current.id, &info.plays, now)?;
        log::info!("Album {} now at {} plays", current.id, info.plays);
        Ok(true)
    }

    /// Run a pass now and then every `period` until `cancel` fires.
    pub async fn run_every(&self, period: std::time::Duration, cancel: CancellationState) {
        loop {
            if cancel.is_cancelled() {
                break;
            }

            let now = Utc::now().naive_utc();
            if let Err(e) = self.run_once(now).await {
                log::warn!("Refresh pass failed: {e}");
            }

            log::info!("Next refresh in {} hours", period.as_secs() / 3600);
            if sleep_with_cancel(cancel.subscribe(), period).await.is_err() {
                break;
            }
        }
        log::info!("Refresh scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::AlbumLink;
    use crate::scrape::MockAlbumScraper;
    use crate::types::AlbumInfo;
    use crate::VkStatsError;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    const FIRST: &str = "https://vk.com/music/playlist/-147845620_2949";
    const SECOND: &str = "https://vk.com/music/playlist/264577489_28";

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, d)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn info(plays: &str) -> AlbumInfo {
        AlbumInfo {
            plays: plays.to_string(),
            track_count: "3".to_string(),
            name: "Name".to_string(),
            nick: "Nick".to_string(),
            genre_year: "g".to_string(),
        }
    }

    fn store_with(urls: &[&str]) -> (Store, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&dir.path().join("stats.db")).unwrap();
        for url in urls {
            let link = AlbumLink::parse(url).unwrap();
            store.insert_album(url, &link, &info("100"), day(1)).unwrap();
        }
        (store, dir)
    }

    fn job(store: &Store, scraper: MockAlbumScraper) -> RefreshJob {
        RefreshJob::new(
            store.clone(),
            Arc::new(scraper),
            AlbumLocks::new(),
            Duration::days(DEFAULT_STALE_AFTER_DAYS),
        )
    }

    #[test_log::test(tokio::test)]
    async fn test_recent_checkpoint_is_skipped() {
        let (store, _dir) = store_with(&[FIRST]);
        store.restore_checkpoint(1, day(7)).unwrap();

        let mut scraper = MockAlbumScraper::new();
        scraper.expect_scrape().never();

        let report = job(&store, scraper).run_once(day(10)).await.unwrap();
        assert_eq!(report, RefreshReport { refreshed: 0, skipped: 1, failed: 0 });
        assert_eq!(store.sample_count(1).unwrap(), 0);
        assert_eq!(store.album(1).unwrap().unwrap().last_update, Some(day(7)));
    }

    #[test_log::test(tokio::test)]
    async fn test_stale_and_absent_checkpoints_refresh() {
        let (store, _dir) = store_with(&[FIRST, SECOND]);
        store.restore_checkpoint(1, day(4)).unwrap();

        let mut scraper = MockAlbumScraper::new();
        scraper
            .expect_scrape()
            .times(2)
            .returning(|_| Ok(info("1.5K")));

        let report = job(&store, scraper).run_once(day(10)).await.unwrap();
        assert_eq!(report.refreshed, 2);

        for id in [1, 2] {
            let album = store.album(id).unwrap().unwrap();
            assert_eq!(album.last_update, Some(day(10)));
            assert_eq!(album.counts, "1.5K");
            let samples = store.samples(id).unwrap();
            assert_eq!(samples.len(), 1);
            assert_eq!(samples[0].counts, "1.5K");
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_failure_does_not_stop_the_pass() {
        let (store, _dir) = store_with(&[FIRST, SECOND]);

        let mut scraper = MockAlbumScraper::new();
        scraper
            .expect_scrape()
            .withf(|url| url == FIRST)
            .returning(|url| Err(VkStatsError::NotFound(url.to_string())));
        scraper
            .expect_scrape()
            .withf(|url| url == SECOND)
            .returning(|_| Ok(info("42")));

        let report = job(&store, scraper).run_once(day(10)).await.unwrap();
        assert_eq!(report, RefreshReport { refreshed: 1, skipped: 0, failed: 1 });

        // No partial write for the failed album
        assert_eq!(store.album(1).unwrap().unwrap().last_update, None);
        assert_eq!(store.sample_count(1).unwrap(), 0);
        assert_eq!(store.sample_count(2).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_run_every_stops_when_cancelled() {
        let (store, _dir) = store_with(&[]);
        let mut scraper = MockAlbumScraper::new();
        scraper.expect_scrape().never();

        let job = job(&store, scraper);
        let cancel = CancellationState::new();
        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                job.run_every(std::time::Duration::from_secs(3600), cancel).await
            })
        };

        cancel.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
