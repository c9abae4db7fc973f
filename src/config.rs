use clap::Parser;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::{Result, VkStatsError};

/// How the bot populates and refreshes data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestMode {
    /// Scheduled refresh only.
    #[default]
    Normal,
    /// `/test` clears the store and replays the fixture links.
    Manual,
    /// One refresh pass 5 s after start, no schedule.
    Immediate,
    /// Inject synthetic samples for one album at start.
    Synthetic,
}

impl TestMode {
    pub fn level(self) -> u8 {
        match self {
            TestMode::Normal => 0,
            TestMode::Manual => 1,
            TestMode::Immediate => 2,
            TestMode::Synthetic => 3,
        }
    }
}

impl FromStr for TestMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "0" | "normal" => Ok(TestMode::Normal),
            "1" | "manual" => Ok(TestMode::Manual),
            "2" | "immediate" => Ok(TestMode::Immediate),
            "3" | "synthetic" => Ok(TestMode::Synthetic),
            other => Err(format!(
                "unknown test mode '{other}', expected 0-3 or normal/manual/immediate/synthetic"
            )),
        }
    }
}

impl fmt::Display for TestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestMode::Normal => "normal",
            TestMode::Manual => "manual",
            TestMode::Immediate => "immediate",
            TestMode::Synthetic => "synthetic",
        };
        write!(f, "{name} ({})", self.level())
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "vk-album-stats")]
#[command(about = "Telegram bot tracking listen counts of VK albums and playlists")]
pub struct Args {
    /// Telegram bot token
    #[arg(long, env = "VK_STATS_BOT_TOKEN", hide_env_values = true)]
    pub token: String,

    /// SQLite database path [default: <data dir>/vk-album-stats/vk_stats.db]
    #[arg(long, env = "VK_STATS_DATABASE")]
    pub database: Option<PathBuf>,

    /// Test mode: 0 normal, 1 manual /test, 2 one-shot refresh, 3 synthetic samples
    #[arg(long, env = "VK_STATS_TEST_MODE", default_value = "0")]
    pub test_mode: TestMode,

    /// Legacy JSON checkpoint file imported once at startup
    #[arg(long, env = "VK_STATS_CHECKPOINT_FILE", default_value = "album_data.json")]
    pub checkpoint_file: PathBuf,

    /// Days between refreshes of an album
    #[arg(long, default_value = "5")]
    pub refresh_days: u32,

    /// Seconds to wait for a page and its album header
    #[arg(long, default_value = "30")]
    pub scrape_timeout: u64,

    /// Album that receives synthetic samples in test mode 3
    #[arg(long, default_value = "1")]
    pub synthetic_album_id: i64,

    /// Chrome/Chromium executable for the headless browser
    #[arg(long, env = "CHROME")]
    pub chrome: Option<PathBuf>,

    /// Fetch pages with plain HTTP instead of the headless browser
    #[arg(long)]
    pub http_loader: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Validated runtime settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub database: PathBuf,
    pub test_mode: TestMode,
    pub checkpoint_file: PathBuf,
    pub refresh_days: u32,
    pub scrape_timeout: Duration,
    pub synthetic_album_id: i64,
    pub chrome: Option<PathBuf>,
    pub http_loader: bool,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self> {
        if args.token.trim().is_empty() {
            return Err(VkStatsError::Config("bot token must not be empty".to_string()));
        }
        if args.refresh_days == 0 {
            return Err(VkStatsError::Config("--refresh-days must be at least 1".to_string()));
        }
        if args.scrape_timeout == 0 {
            return Err(VkStatsError::Config("--scrape-timeout must be at least 1".to_string()));
        }

        Ok(Self {
            token: args.token.trim().to_string(),
            database: args.database.unwrap_or_else(default_database_path),
            test_mode: args.test_mode,
            checkpoint_file: args.checkpoint_file,
            refresh_days: args.refresh_days,
            scrape_timeout: Duration::from_secs(args.scrape_timeout),
            synthetic_album_id: args.synthetic_album_id,
            chrome: args.chrome,
            http_loader: args.http_loader,
        })
    }

    pub fn stale_after(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.refresh_days))
    }

    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(u64::from(self.refresh_days) * 24 * 60 * 60)
    }
}

/// `<data dir>/vk-album-stats/vk_stats.db`, or `vk_stats.db` in the working
/// directory when the platform has no data dir.
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("vk-album-stats").join("vk_stats.db"))
        .unwrap_or_else(|| PathBuf::from("vk_stats.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["vk-album-stats", "--token", "123:abc"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_test_mode_from_str() {
        assert_eq!("0".parse::<TestMode>().unwrap(), TestMode::Normal);
        assert_eq!("3".parse::<TestMode>().unwrap(), TestMode::Synthetic);
        assert_eq!("Manual".parse::<TestMode>().unwrap(), TestMode::Manual);
        assert!("4".parse::<TestMode>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_args(parse(&["--database", "/tmp/x.db"])).unwrap();
        assert_eq!(config.test_mode, TestMode::Normal);
        assert_eq!(config.refresh_days, 5);
        assert_eq!(config.stale_after(), chrono::Duration::days(5));
        assert_eq!(config.scrape_timeout, Duration::from_secs(30));
        assert_eq!(config.checkpoint_file, PathBuf::from("album_data.json"));
        assert_eq!(config.database, PathBuf::from("/tmp/x.db"));
        assert!(!config.http_loader);
    }

    #[test]
    fn test_rejects_zero_refresh_days() {
        let result = Config::from_args(parse(&["--refresh-days", "0"]));
        assert!(matches!(result, Err(VkStatsError::Config(_))));
    }

    #[test]
    fn test_test_mode_flag() {
        let args = parse(&["--test-mode", "2"]);
        assert_eq!(args.test_mode, TestMode::Immediate);
        assert_eq!(args.test_mode.to_string(), "immediate (2)");
    }
}
