//! VK album and playlist link grammar.
//!
//! Validation and id extraction share one pattern, so a URL either parses
//! into an [`AlbumLink`] (valid, with an id) or it does not parse at all.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^https?://(?:m\.)?vk\.com/music/(album|playlist)/(-?\d+)_(\d+(?:_[A-Za-z0-9]+)?)(?:[?#/]|$)",
        )
        .expect("link pattern is valid")
    })
}

/// Whether a link points at an album or a user playlist.
///
/// The two page kinds use different markup, so the scraper branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Album,
    Playlist,
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkKind::Album => f.write_str("album"),
            LinkKind::Playlist => f.write_str("playlist"),
        }
    }
}

/// A parsed VK music link.
///
/// For `https://vk.com/music/album/-2000600197_20600197_805b14b56dae3b32e9`
/// the owner is `-2000600197` and the album id is
/// `20600197_805b14b56dae3b32e9`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlbumLink {
    pub kind: LinkKind,
    /// Owner segment, negative for communities
    pub owner_id: String,
    /// Second path segment, including the access-hash suffix if present
    pub album_id: String,
}

impl AlbumLink {
    /// Parse a URL against the link grammar.
    ///
    /// Albums must belong to a community (negative owner id); playlists may
    /// belong to either a user or a community.
    pub fn parse(url: &str) -> Option<Self> {
        let captures = link_pattern().captures(url.trim())?;
        let kind = match captures.get(1)?.as_str() {
            "album" => LinkKind::Album,
            _ => LinkKind::Playlist,
        };
        let owner_id = captures.get(2)?.as_str();
        if kind == LinkKind::Album && !owner_id.starts_with('-') {
            return None;
        }

        Some(Self {
            kind,
            owner_id: owner_id.to_string(),
            album_id: captures.get(3)?.as_str().to_string(),
        })
    }

    /// Stable identifier used for duplicate detection and locking.
    pub fn external_id(&self) -> String {
        format!("{}_{}", self.owner_id, self.album_id)
    }
}

/// Whether `url` is a well-formed VK album or playlist link.
pub fn is_valid_album_url(url: &str) -> bool {
    AlbumLink::parse(url).is_some()
}

/// Extract the album id (second path segment) from a VK link.
pub fn extract_album_id(url: &str) -> Option<String> {
    AlbumLink::parse(url).map(|link| link.album_id)
}
