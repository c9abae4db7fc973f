use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;

use super::{PageLoader, PageWait};
use crate::{Result, VkStatsError};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Launch options for the headless browser.
#[derive(Debug, Clone, Default)]
pub struct BrowserSettings {
    /// Chrome/Chromium binary; chromiumoxide searches the usual places if unset
    pub chrome_executable: Option<PathBuf>,
    /// Extra command-line arguments
    pub chrome_args: Vec<String>,
}

/// Renders pages in a headless Chromium over CDP.
///
/// Every load launches a fresh browser with a throwaway profile and shuts it
/// down again, whatever the outcome, so concurrent scrapes never share state.
#[derive(Debug, Clone, Default)]
pub struct BrowserPageLoader {
    settings: BrowserSettings,
}

impl BrowserPageLoader {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    async fn launch(&self, profile: &std::path::Path) -> Result<Browser> {
        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile)
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--lang=ru-RU");
        if let Some(ref path) = self.settings.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        for arg in &self.settings.chrome_args {
            builder = builder.arg(arg);
        }

        let config = builder
            .build()
            .map_err(|e| VkStatsError::Scrape(format!("browser config: {e}")))?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| VkStatsError::Scrape(format!("failed to launch browser: {e}")))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });
        Ok(browser)
    }
}

#[async_trait]
impl PageLoader for BrowserPageLoader {
    async fn load(&self, url: &str, wait: &PageWait) -> Result<String> {
        let profile = tempfile::tempdir()?;
        let mut browser = self.launch(profile.path()).await?;

        let result = render(&browser, url, wait).await;

        if let Err(e) = browser.close().await {
            log::debug!("Browser close failed: {e}");
        }
        if let Err(e) = browser.wait().await {
            log::debug!("Browser did not exit cleanly: {e}");
        }
        result
    }
}

async fn render(browser: &Browser, url: &str, wait: &PageWait) -> Result<String> {
    log::info!("Navigating to {url}");

    let page = tokio::time::timeout(wait.timeout, browser.new_page(url))
        .await
        .map_err(|_| VkStatsError::NotFound(format!("timed out loading {url}")))?
        .map_err(|e| VkStatsError::Scrape(e.to_string()))?;

    let result = match tokio::time::timeout(wait.timeout, wait_for_markers(&page, &wait.markers)).await {
        Ok(()) => page
            .content()
            .await
            .map_err(|e| VkStatsError::Scrape(e.to_string())),
        Err(_) => {
            log::warn!("Timed out waiting for {:?} on {url}", wait.markers);
            Err(VkStatsError::NotFound(url.to_string()))
        }
    };

    if let Err(e) = page.close().await {
        log::debug!("Page close failed: {e}");
    }
    result
}

async fn wait_for_markers(page: &Page, markers: &[&'static str]) {
    for marker in markers {
        while page.find_element(*marker).await.is_err() {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        log::debug!("Found {marker}");
    }
}
