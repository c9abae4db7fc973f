//! HTML parsing for VK album and playlist pages.
//!
//! All knowledge of VK's markup lives here: the selectors the loaders wait
//! for and the rules that turn the header snippet into an [`AlbumInfo`].
//! The functions are pure and work on an already loaded document.

use crate::types::{AlbumInfo, NOT_SPECIFIED, PLAYLIST_GENRE_YEAR};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

const INFO: &str = ".AudioPlaylistSnippet__info";
const TITLE: &str = ".AudioPlaylistSnippet__title--main";
const ARTIST_LINK: &str = ".AudioPlaylistSnippet__author a[href^=\"/artist/\"]";
const AUTHOR_LINK: &str = ".AudioPlaylistSnippet__author a";

/// The word that separates the play count from the rest of an info block,
/// up to the next whitespace.
///
/// VK serves Russian by default; the stem covers every plural form.
fn listens_delimiter() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(?:прослушиван|listens|plays)\S*").expect("delimiter pattern is valid")
    })
}

/// Parser for the header snippet of VK music pages.
///
/// Stateless; the loaders only learn from it which markers to wait for.
#[derive(Debug, Clone, Default)]
pub struct VkParser;

impl VkParser {
    pub fn new() -> Self {
        Self
    }

    /// Elements that must be present before an album page is complete.
    pub fn album_markers() -> Vec<&'static str> {
        vec![INFO, TITLE, ARTIST_LINK]
    }

    /// Elements that must be present before a playlist page is complete.
    pub fn playlist_markers() -> Vec<&'static str> {
        vec![INFO]
    }

    /// Parse an official album page.
    ///
    /// The first info block reads like `1.2K прослушиваний · 12 аудиозаписей`;
    /// when there is no delimiter the whole block is the play count and the
    /// album is a single. The second info block holds genre and year.
    pub fn parse_album(&self, document: &Html) -> AlbumInfo {
        let info_selector = Selector::parse(INFO).unwrap();
        let blocks: Vec<ElementRef> = document.select(&info_selector).collect();

        let first = blocks.first().map(element_text).unwrap_or_default();
        let (plays, track_count) = match split_at_delimiter(&first) {
            Some((plays, rest)) => {
                let track_count = first_digit_run(rest).unwrap_or_else(|| NOT_SPECIFIED.to_string());
                (plays.to_string(), track_count)
            }
            None => (first.clone(), "1".to_string()),
        };
        let plays = if plays.is_empty() { "0".to_string() } else { plays };

        let genre_year = blocks
            .get(1)
            .map(element_text)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| NOT_SPECIFIED.to_string());

        log::debug!("Album header: plays={plays:?} tracks={track_count:?}");

        AlbumInfo {
            plays,
            track_count,
            name: self.title(document),
            nick: first_text(document, ARTIST_LINK),
            genre_year,
        }
    }

    /// Parse a user or community playlist page.
    ///
    /// The first info block carries the track count, which VK splits across
    /// several nodes, so its digits are collected from the raw markup. The
    /// second block carries the play count.
    pub fn parse_playlist(&self, document: &Html) -> AlbumInfo {
        let info_selector = Selector::parse(INFO).unwrap();
        let blocks: Vec<ElementRef> = document.select(&info_selector).collect();

        let track_count = blocks
            .first()
            .map(|block| block.inner_html().chars().filter(char::is_ascii_digit).collect::<String>())
            .filter(|digits| !digits.is_empty())
            .unwrap_or_else(|| NOT_SPECIFIED.to_string());

        let plays = blocks
            .get(1)
            .map(element_text)
            .map(|text| match split_at_delimiter(&text) {
                Some((plays, _)) => plays.to_string(),
                None => text,
            })
            .filter(|plays| !plays.is_empty())
            .unwrap_or_else(|| "0".to_string());

        log::debug!("Playlist header: plays={plays:?} tracks={track_count:?}");

        AlbumInfo {
            plays,
            track_count,
            name: self.title(document),
            nick: first_text(document, AUTHOR_LINK),
            genre_year: PLAYLIST_GENRE_YEAR.to_string(),
        }
    }

    fn title(&self, document: &Html) -> String {
        first_text(document, TITLE)
    }
}

/// Visible text of an element with whitespace runs collapsed.
fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_text(document: &Html, css: &str) -> String {
    let selector = Selector::parse(css).unwrap();
    document
        .select(&selector)
        .next()
        .map(|element| element_text(&element))
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| NOT_SPECIFIED.to_string())
}

/// Split `text` at the first listens delimiter: trimmed prefix and the text
/// after the delimiter word.
fn split_at_delimiter(text: &str) -> Option<(&str, &str)> {
    let delimiter = listens_delimiter().find(text)?;
    Some((text[..delimiter.start()].trim(), &text[delimiter.end()..]))
}

fn first_digit_run(text: &str) -> Option<String> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..].chars().take_while(char::is_ascii_digit).collect();
    Some(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album_page(info: &[&str]) -> Html {
        let blocks: String = info
            .iter()
            .map(|text| format!(r#"<div class="AudioPlaylistSnippet__info">{text}</div>"#))
            .collect();
        Html::parse_document(&format!(
            r#"<html><body><div class="AudioPlaylistSnippet">
                <h1 class="AudioPlaylistSnippet__title--main">Kid A</h1>
                <div class="AudioPlaylistSnippet__author"><a href="/artist/radiohead">Radiohead</a></div>
                {blocks}
            </div></body></html>"#
        ))
    }

    #[test]
    fn test_album_with_track_count() {
        let doc = album_page(&["1.2K прослушиваний · 12 аудиозаписей", "Альтернатива · 2000"]);
        let info = VkParser::new().parse_album(&doc);
        assert_eq!(info.plays, "1.2K");
        assert_eq!(info.track_count, "12");
        assert_eq!(info.name, "Kid A");
        assert_eq!(info.nick, "Radiohead");
        assert_eq!(info.genre_year, "Альтернатива · 2000");
    }

    #[test]
    fn test_single_without_delimiter() {
        let doc = album_page(&["845"]);
        let info = VkParser::new().parse_album(&doc);
        assert_eq!(info.plays, "845");
        assert_eq!(info.track_count, "1");
        assert_eq!(info.genre_year, NOT_SPECIFIED);
    }

    #[test]
    fn test_playlist_split_track_count() {
        let doc = Html::parse_document(
            r#"<div class="AudioPlaylistSnippet__title--main">Road trip</div>
               <div class="AudioPlaylistSnippet__author"><a href="/id264577489">Ivan</a></div>
               <div class="AudioPlaylistSnippet__info"><span>1</span><span>24</span> аудиозаписи</div>
               <div class="AudioPlaylistSnippet__info">3,4K прослушиваний</div>"#,
        );
        let info = VkParser::new().parse_playlist(&doc);
        assert_eq!(info.track_count, "124");
        assert_eq!(info.plays, "3,4K");
        assert_eq!(info.nick, "Ivan");
        assert_eq!(info.genre_year, PLAYLIST_GENRE_YEAR);
    }

    #[test]
    fn test_playlist_without_play_block() {
        let doc = Html::parse_document(
            r#"<div class="AudioPlaylistSnippet__info">7 tracks</div>"#,
        );
        let info = VkParser::new().parse_playlist(&doc);
        assert_eq!(info.plays, "0");
        assert_eq!(info.track_count, "7");
        assert_eq!(info.name, NOT_SPECIFIED);
        assert_eq!(info.nick, NOT_SPECIFIED);
    }

    #[test]
    fn test_split_at_delimiter() {
        assert_eq!(
            split_at_delimiter("15K прослушиваний 3 аудиозаписи"),
            Some(("15K", " 3 аудиозаписи"))
        );
        assert_eq!(split_at_delimiter("2.1M listens · 9 tracks"), Some(("2.1M", " · 9 tracks")));
        assert_eq!(split_at_delimiter("Рок · 2019"), None);
        assert_eq!(split_at_delimiter("3K PLAYS 4 tracks"), Some(("3K", " 4 tracks")));
    }

    #[test]
    fn test_split_keeps_offsets_of_the_original_text() {
        // Both characters change byte length when lowercased.
        assert_eq!(
            split_at_delimiter("1.2\u{212A} Listens 10 tracks"),
            Some(("1.2\u{212A}", " 10 tracks"))
        );
        assert_eq!(
            split_at_delimiter("İİİ 5K прослушиваний · 7 аудиозаписей"),
            Some(("İİİ 5K", " · 7 аудиозаписей"))
        );
    }
}
