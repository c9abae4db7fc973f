pub mod bot;
pub mod cancel;
pub mod chart;
pub mod checkpoint;
pub mod config;
pub mod context;
pub mod demo;
pub mod error;
pub mod headers;
pub mod link;
pub mod loader;
pub mod locks;
pub mod parsing;
pub mod plays;
pub mod refresh;
pub mod scrape;
pub mod store;
pub mod types;

pub use chart::{ChartImage, ChartPage, ChartPoint, ChartRenderer, PlottersRenderer};
pub use checkpoint::Checkpoint;
pub use config::{Args, Config, TestMode};
pub use context::AppContext;
pub use error::VkStatsError;
pub use link::{extract_album_id, is_valid_album_url, AlbumLink, LinkKind};
pub use loader::{HttpPageLoader, PageLoader, PageWait};
pub use locks::AlbumLocks;
pub use parsing::VkParser;
pub use plays::parse_plays;
pub use refresh::{RefreshJob, RefreshReport};
pub use scrape::{AlbumScraper, VkScraper};
pub use store::Store;
pub use types::{Album, AlbumInfo, Sample};

// Re-export scraper types for testing
pub use scraper::Html;

pub type Result<T> = std::result::Result<T, VkStatsError>;
