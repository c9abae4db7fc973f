//! Page loading backends.
//!
//! A [`PageLoader`] turns a URL into the rendered HTML of the page once the
//! given markers are present. VK builds the music snippet with JavaScript,
//! so production uses [`BrowserPageLoader`]; [`HttpPageLoader`] serves pages
//! that arrive pre-rendered and is what the tests drive.

use crate::Result;
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;

#[cfg(feature = "browser")]
mod browser;
mod http;

#[cfg(feature = "browser")]
pub use browser::{BrowserPageLoader, BrowserSettings};
pub use http::HttpPageLoader;

/// What a loader must wait for before returning a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWait {
    /// CSS selectors that must all match
    pub markers: Vec<&'static str>,
    /// Deadline for the navigation and all markers together
    pub timeout: Duration,
}

impl PageWait {
    pub fn new(markers: Vec<&'static str>, timeout: Duration) -> Self {
        Self { markers, timeout }
    }
}

/// Fetches a page and waits for its markers.
///
/// Implementations fail with [`VkStatsError::NotFound`](crate::VkStatsError::NotFound)
/// when the markers do not show up before the deadline and with
/// [`VkStatsError::Scrape`](crate::VkStatsError::Scrape) for anything else.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait PageLoader: Send + Sync {
    async fn load(&self, url: &str, wait: &PageWait) -> Result<String>;
}

/// Selectors from `markers` that do not match anything in `html`.
pub fn missing_markers(html: &str, markers: &[&'static str]) -> Vec<&'static str> {
    let document = Html::parse_document(html);
    markers
        .iter()
        .copied()
        .filter(|marker| match Selector::parse(marker) {
            Ok(selector) => document.select(&selector).next().is_none(),
            Err(_) => true,
        })
        .collect()
}
