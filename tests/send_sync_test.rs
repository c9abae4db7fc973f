use std::sync::Arc;
use vk_album_stats::{AlbumScraper, AppContext, HttpPageLoader, RefreshJob, Store, VkScraper};

/// The dispatcher shares the context between handler tasks.
#[test]
fn test_context_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<AppContext>();
    assert_send_sync::<Store>();
    assert_send_sync::<RefreshJob>();
    assert_send_sync::<VkScraper<HttpPageLoader>>();
    assert_send_sync::<Arc<dyn AlbumScraper>>();
}

/// Handler and scheduler futures are spawned onto the multi-threaded runtime.
#[tokio::test]
async fn test_futures_are_send() {
    fn assert_send<T: Send>(_: T) {}

    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&dir.path().join("send.db")).unwrap();
    let client = Box::new(http_client::native::NativeClient::new());
    let scraper: Arc<dyn AlbumScraper> = Arc::new(VkScraper::new(HttpPageLoader::new(client)));

    let scrape = scraper.scrape("https://vk.com/music/playlist/1_2");
    assert_send(scrape);

    let job = RefreshJob::new(
        store,
        scraper.clone(),
        vk_album_stats::AlbumLocks::new(),
        chrono::Duration::days(5),
    );
    let pass = job.run_once(chrono::Utc::now().naive_utc());
    assert_send(pass);
}
