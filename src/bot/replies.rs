//! Reply texts and keyboards.
//!
//! Texts with album data are HTML; every value taken from a scraped page is
//! escaped.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::html::escape;

use super::callback::CallbackAction;
use crate::demo::FIXTURE_URLS;
use crate::link::is_valid_album_url;
use crate::types::Album;

pub const THINKING: &str = "⌛ Thinking, please wait...";
pub const LOADING: &str = "⌛ Loading album data, please wait...";
pub const DUPLICATE_ALBUM: &str =
    "🤫 This album is already being tracked.\n\nℹ️ Use /analyze to see its statistics.";
pub const ALBUM_NOT_FOUND: &str = "❌ That album or playlist does not exist.";
pub const SCRAPE_FAILED: &str = "❌ Something went wrong while fetching the album, please try again.\n\n📃 The album may not exist or may have been removed.";
pub const NO_ALBUMS: &str = "🧺 No albums have been added yet.";
pub const CHOOSE_ALBUM: &str = "🔀 Choose an album to see its details";
pub const ALBUM_INFO_MISSING: &str = "❌ Album information not found.";
pub const INSUFFICIENT_DATA: &str =
    "❗ Not enough data for a chart yet. At least two samples from different days are needed.";
pub const TEST_MODE_DISABLED: &str = "🚫 /test is only available in test mode 1.";
pub const INTERNAL_ERROR: &str = "❌ Internal error, please try again later.";

pub fn greeting() -> String {
    "👋 Hi!\n\n🔗 Send me a link to a VK album or playlist and I will start collecting its listen statistics!".to_string()
}

pub fn invalid_link() -> String {
    let examples = [FIXTURE_URLS[2], FIXTURE_URLS[0]].join("\n");
    format!(
        "❌ That is not a valid album link.\n\nℹ️ Links look like this:\n{examples}\n\n👉 Click the album title to open its own page, then copy the link from the address bar."
    )
}

/// Status shown while a well-formed link is being scraped. Malformed links
/// are rejected right away and keep [`THINKING`].
pub fn scrape_status(url: &str) -> Option<&'static str> {
    is_valid_album_url(url.trim()).then_some(LOADING)
}

pub fn album_added(album: &Album) -> String {
    format!(
        "☑️ <b>Album added to the tracker.</b>\n\n📃 <b>Album information</b>\n\n\
         🔢 Listens: <b>{}</b>\n🎵 Tracks: <b>{}</b>\n📓 Album: <b>{}</b>\n\
         😶 Artist: <b>{}</b>\n🌍 Genre and year: <b>{}</b>",
        escape(&album.counts),
        escape(&album.track_count),
        escape(&album.name),
        escape(&album.nick),
        escape(&album.genre_year),
    )
}

pub fn album_details(album: &Album) -> String {
    format!(
        "📃 <b>Album information:</b>\n\n🖥️ ID: <b>{}</b>\n🔢 Listens: <b>{}</b>\n\
         🎵 Tracks: <b>{}</b>\n📓 Album: <b>{}</b>\n😶 Artist: <b>{}</b>\n\
         🌍 Genre and year: <b>{}</b>\n📅 Added: <b>{}</b>",
        album.id,
        escape(&album.counts),
        escape(&album.track_count),
        escape(&album.name),
        escape(&album.nick),
        escape(&album.genre_year),
        escape(&album.added),
    )
}

/// One button per album, one album per row.
pub fn album_list_keyboard(albums: &[Album]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(albums.iter().map(|album| {
        vec![InlineKeyboardButton::callback(
            album.to_string(),
            CallbackAction::ShowAlbum(album.id).to_string(),
        )]
    }))
}

pub fn album_details_keyboard(album_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback(
            "📊 Statistics",
            CallbackAction::ShowStats(album_id).to_string(),
        ),
        InlineKeyboardButton::callback("🔙 Back", CallbackAction::BackToList.to_string()),
    ]])
}
