//! Data types for tracked albums and their play-count history.
//!
//! This module contains the core data structures shared by the scraper, the
//! store, the refresh job and the chart renderer.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::checkpoint::Checkpoint;

/// Placeholder stored when a page does not show an optional field.
pub const NOT_SPECIFIED: &str = "not specified";

/// Genre/year text stored for playlists, which have no such field.
pub const PLAYLIST_GENRE_YEAR: &str = "not available for playlists";

/// Format of every timestamp the store writes (`2024-10-22 18:30:00`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ================================================================================================
// SCRAPED DATA
// ================================================================================================

/// Everything one scrape of an album or playlist page yields.
///
/// All fields are kept as the page shows them; play counts are normalized
/// only when charting (see [`parse_plays`](crate::parse_plays)).
///
/// # Examples
///
/// ```rust
/// use vk_album_stats::AlbumInfo;
///
/// let info = AlbumInfo {
///     plays: "1.2K".to_string(),
///     track_count: "12".to_string(),
///     name: "Kid A".to_string(),
///     nick: "Radiohead".to_string(),
///     genre_year: "Alternative · 2000".to_string(),
/// };
///
/// assert_eq!(info.to_string(), "Radiohead - Kid A (1.2K plays)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumInfo {
    /// Play count text, e.g. `"1.2K"`
    pub plays: String,
    /// Number of tracks, or [`NOT_SPECIFIED`]
    pub track_count: String,
    /// Album or playlist title
    pub name: String,
    /// Artist (album) or author (playlist) name
    pub nick: String,
    /// Genre and year line of the album header
    pub genre_year: String,
}

impl fmt::Display for AlbumInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} ({} plays)", self.nick, self.name, self.plays)
    }
}

// ================================================================================================
// STORED DATA
// ================================================================================================

/// A tracked album: the snapshot row of the `albums` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    /// Surrogate id assigned by the store
    pub id: i64,
    /// The link the album was added with
    pub url: String,
    /// Canonical `<owner>_<album>` id extracted from the link
    pub external_id: Option<String>,
    pub name: String,
    pub nick: String,
    pub genre_year: String,
    /// Latest known play count text
    pub counts: String,
    pub track_count: String,
    /// When the album was first added (`YYYY-MM-DD HH:MM:SS`)
    pub added: String,
    /// Last successful refresh, `None` if never refreshed
    pub last_update: Option<NaiveDateTime>,
}

impl Album {
    /// The refresh bookkeeping for this album.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            album_id: self.id,
            url: self.url.clone(),
            last_update: self.last_update,
        }
    }

    /// Key used to serialize scrapes of this album.
    ///
    /// Rows migrated from old databases may lack an external id; the URL is
    /// unique as well, so it stands in.
    pub fn lock_key(&self) -> &str {
        self.external_id.as_deref().unwrap_or(&self.url)
    }
}

impl fmt::Display for Album {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.nick)
    }
}

/// One point-in-time observation of an album's play count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub album_id: i64,
    /// Play count text exactly as scraped
    pub counts: String,
    /// Timestamp text as stored (`YYYY-MM-DD HH:MM:SS`)
    pub date: String,
}

/// Format a timestamp the way the store writes it.
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp; `None` for malformed or empty text.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_round_trip() {
        let text = "2024-10-22 18:30:00";
        let parsed = parse_timestamp(text).unwrap();
        assert_eq!(format_timestamp(parsed), text);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_lock_key_falls_back_to_url() {
        let album = Album {
            id: 1,
            url: "https://vk.com/music/playlist/1_2".to_string(),
            external_id: None,
            name: "Mix".to_string(),
            nick: "someone".to_string(),
            genre_year: PLAYLIST_GENRE_YEAR.to_string(),
            counts: "10".to_string(),
            track_count: "2".to_string(),
            added: "2024-10-22 18:30:00".to_string(),
            last_update: None,
        };
        assert_eq!(album.lock_key(), album.url);
        assert_eq!(album.to_string(), "Mix - someone");
        assert_eq!(album.checkpoint().last_update, None);
    }
}
