use thiserror::Error;

/// Error types for album tracking operations.
///
/// The first five variants are the user-facing taxonomy the bot replies to;
/// the rest wrap failures of the collaborators (SQLite, the HTTP stack, the
/// chart backend, the filesystem).
///
/// # Error Handling Examples
///
/// ```rust
/// use vk_album_stats::VkStatsError;
///
/// fn reply_for(error: &VkStatsError) -> &'static str {
///     match error {
///         VkStatsError::InvalidLink(_) => "that does not look like a VK album link",
///         VkStatsError::DuplicateAlbum(_) => "already tracked",
///         VkStatsError::NotFound(_) => "no such album or playlist",
///         VkStatsError::InsufficientData { .. } => "not enough data yet",
///         _ => "something went wrong, try again",
///     }
/// }
///
/// assert_eq!(
///     reply_for(&VkStatsError::InsufficientData { samples: 1 }),
///     "not enough data yet"
/// );
/// ```
#[derive(Error, Debug)]
pub enum VkStatsError {
    /// The text is not a VK album or playlist URL.
    #[error("Invalid album link: {0}")]
    InvalidLink(String),

    /// An album with the same external id is already tracked.
    #[error("Album already tracked: {0}")]
    DuplicateAlbum(String),

    /// The page never showed the expected markers.
    ///
    /// Raised when loading the page or waiting for its selectors times out,
    /// which in practice means the album or playlist does not exist (or is
    /// not public).
    #[error("No such album or playlist: {0}")]
    NotFound(String),

    /// Any other scrape failure, carrying the original message.
    #[error("Failed to scrape page: {0}")]
    Scrape(String),

    /// Fewer than two samples are available for charting.
    #[error("Not enough samples to build a chart ({samples} available, 2 required)")]
    InsufficientData {
        /// Number of usable samples found
        samples: usize,
    },

    /// SQLite errors from the persistent store.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// HTTP/network related errors from the plain page loader.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Chart drawing or encoding failures.
    #[error("Chart rendering failed: {0}")]
    Chart(String),

    /// Invalid configuration detected at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed legacy checkpoint file.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File system I/O errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VkStatsError {
    /// Whether the error should be shown to the user verbatim instead of the
    /// generic "try again" reply.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            VkStatsError::InvalidLink(_)
                | VkStatsError::DuplicateAlbum(_)
                | VkStatsError::NotFound(_)
                | VkStatsError::InsufficientData { .. }
        )
    }
}
