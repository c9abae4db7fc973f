use clap::Parser;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use teloxide::Bot;
use vk_album_stats::cancel::CancellationState;
use vk_album_stats::checkpoint::import_legacy_checkpoints;
use vk_album_stats::{
    bot, AlbumScraper, AppContext, Args, Config, HttpPageLoader, PlottersRenderer, Result, Store,
    TestMode, VkScraper,
};

const IMMEDIATE_REFRESH_DELAY: Duration = Duration::from_secs(5);

fn build_scraper(config: &Config) -> Arc<dyn AlbumScraper> {
    #[cfg(feature = "browser")]
    if !config.http_loader {
        use vk_album_stats::loader::{BrowserPageLoader, BrowserSettings};

        let loader = BrowserPageLoader::new(BrowserSettings {
            chrome_executable: config.chrome.clone(),
            chrome_args: Vec::new(),
        });
        return Arc::new(VkScraper::new(loader).with_timeout(config.scrape_timeout));
    }

    if !config.http_loader {
        warn!("Built without the browser feature, falling back to plain HTTP page loading");
    }
    let loader = HttpPageLoader::new(Box::new(http_client::native::NativeClient::new()));
    Arc::new(VkScraper::new(loader).with_timeout(config.scrape_timeout))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = Config::from_args(args)?;
    info!(
        "Starting vk-album-stats with database {} in {} mode",
        config.database.display(),
        config.test_mode
    );

    let store = Store::open(&config.database)?;
    match import_legacy_checkpoints(&config.checkpoint_file, &store) {
        Ok(0) => {}
        Ok(n) => info!("Restored {n} refresh checkpoints"),
        Err(e) => warn!(
            "Could not import checkpoints from {}: {e}",
            config.checkpoint_file.display()
        ),
    }

    let scraper = build_scraper(&config);
    let bot = Bot::new(config.token.clone());
    let ctx = Arc::new(AppContext::new(
        config,
        store,
        scraper,
        Arc::new(PlottersRenderer::new()),
    ));

    let cancel = CancellationState::new();
    let scheduler = match ctx.config.test_mode {
        TestMode::Normal => {
            info!(
                "Refreshing album statistics every {} days",
                ctx.config.refresh_days
            );
            let job = ctx.refresh_job();
            let period = ctx.config.refresh_period();
            let cancel = cancel.clone();
            Some(tokio::spawn(async move { job.run_every(period, cancel).await }))
        }
        TestMode::Manual => {
            warn!("Test mode 1: the /test command is enabled");
            None
        }
        TestMode::Immediate => {
            info!("Test mode 2: refreshing all albums in 5 seconds");
            let job = ctx.refresh_job();
            Some(tokio::spawn(async move {
                tokio::time::sleep(IMMEDIATE_REFRESH_DELAY).await;
                let now = chrono::Utc::now().naive_utc();
                if let Err(e) = job.run_once(now).await {
                    log::error!("Refresh failed: {e}");
                }
            }))
        }
        TestMode::Synthetic => {
            warn!(
                "Test mode 3: adding synthetic statistics to album {}",
                ctx.config.synthetic_album_id
            );
            if let Err(e) = ctx.inject_synthetic_samples() {
                log::error!("Failed to add synthetic statistics: {e}");
            }
            None
        }
    };

    bot::run(bot, ctx).await;

    cancel.cancel();
    if let Some(handle) = scheduler {
        if tokio::time::timeout(Duration::from_secs(5), handle).await.is_err() {
            warn!("Refresh task did not stop in time");
        }
    }
    info!("Shut down");
    Ok(())
}
