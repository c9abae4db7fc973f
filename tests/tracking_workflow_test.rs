mod common;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use common::{fixture, fixture_client, fixture_scraper, ALBUM_URL, MISSING_URL, PLAYLIST_URL};
use std::fs;
use std::sync::Arc;
use vk_album_stats::chart::plan_chart_pages;
use vk_album_stats::checkpoint::import_legacy_checkpoints;
use vk_album_stats::{
    parse_plays, AlbumLink, AlbumLocks, AlbumScraper, RefreshJob, RefreshReport, Store,
    VkStatsError,
};

fn day(d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 12, d)
        .unwrap()
        .and_hms_opt(6, 0, 0)
        .unwrap()
}

async fn add(store: &Store, scraper: &dyn AlbumScraper, url: &str, at: NaiveDateTime) {
    let link = AlbumLink::parse(url).unwrap();
    let info = scraper.scrape(url).await.unwrap();
    store.insert_album(url, &link, &info, at).unwrap();
}

#[test_log::test(tokio::test)]
async fn test_refresh_builds_a_chartable_history() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&dir.path().join("vk_stats.db")).unwrap();
    let client = fixture_client();
    let scraper = Arc::new(fixture_scraper(&client));

    add(&store, scraper.as_ref(), ALBUM_URL, day(1)).await;
    add(&store, scraper.as_ref(), PLAYLIST_URL, day(1)).await;

    let job = RefreshJob::new(store.clone(), scraper.clone(), AlbumLocks::new(), Duration::days(5));

    // Never refreshed: both are due
    let report = job.run_once(day(1)).await.unwrap();
    assert_eq!(report, RefreshReport { refreshed: 2, skipped: 0, failed: 0 });

    // Two days later nothing is due
    let report = job.run_once(day(3)).await.unwrap();
    assert_eq!(report, RefreshReport { refreshed: 0, skipped: 2, failed: 0 });

    // The album grew in the meantime
    client.serve(ALBUM_URL, fixture("album_page.html").replace("1.2K", "1.9K"));
    let report = job.run_once(day(6)).await.unwrap();
    assert_eq!(report.refreshed, 2);

    let album = store.album(1).unwrap().unwrap();
    assert_eq!(album.counts, "1.9K");
    assert_eq!(album.last_update, Some(day(6)));

    let samples = store.samples(1).unwrap();
    let plays: Vec<u64> = samples.iter().map(|s| parse_plays(&s.counts)).collect();
    assert_eq!(plays, vec![1200, 1900]);

    let pages = plan_chart_pages(&samples).unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].points.len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_vanished_album_is_counted_as_failed() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&dir.path().join("vk_stats.db")).unwrap();
    let client = fixture_client();
    client.serve(MISSING_URL, fixture("playlist_page.html"));
    let scraper = Arc::new(fixture_scraper(&client));

    add(&store, scraper.as_ref(), MISSING_URL, day(1)).await;
    client.serve(MISSING_URL, fixture("missing_page.html"));

    let job = RefreshJob::new(store.clone(), scraper, AlbumLocks::new(), Duration::days(5));
    let report = job.run_once(day(10)).await.unwrap();
    assert_eq!(report.failed, 1);
    assert!(matches!(
        plan_chart_pages(&store.samples(1).unwrap()),
        Err(VkStatsError::InsufficientData { samples: 0 })
    ));
}

#[test_log::test(tokio::test)]
async fn test_legacy_checkpoints_gate_the_first_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&dir.path().join("vk_stats.db")).unwrap();
    let client = fixture_client();
    let scraper = Arc::new(fixture_scraper(&client));

    add(&store, scraper.as_ref(), ALBUM_URL, day(1)).await;
    add(&store, scraper.as_ref(), PLAYLIST_URL, day(1)).await;

    let legacy = dir.path().join("album_data.json");
    fs::write(
        &legacy,
        format!(
            r#"{{"1": {{"url": "{ALBUM_URL}", "last_update": "2024-12-08 06:00:00"}},
                "2": {{"url": "{PLAYLIST_URL}", "last_update": null}},
                "9": {{"url": "https://vk.com/music/playlist/1_1", "last_update": "2024-12-08 06:00:00"}}}}"#
        ),
    )
    .unwrap();

    assert_eq!(import_legacy_checkpoints(&legacy, &store).unwrap(), 1);
    assert!(!legacy.exists());
    assert!(dir.path().join("album_data.json.imported").exists());

    let job = RefreshJob::new(store.clone(), scraper, AlbumLocks::new(), Duration::days(5));
    let report = job.run_once(day(10)).await.unwrap();
    assert_eq!(report, RefreshReport { refreshed: 1, skipped: 1, failed: 0 });

    // A second import finds nothing
    assert_eq!(import_legacy_checkpoints(&legacy, &store).unwrap(), 0);
}
