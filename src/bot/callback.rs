use std::fmt;

/// Payload of an inline keyboard button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// `album_<id>`: show the album card
    ShowAlbum(i64),
    /// `stats_<id>`: send the charts
    ShowStats(i64),
    /// `back_to_analyze`: show the album list again
    BackToList,
}

impl CallbackAction {
    pub fn parse(data: &str) -> Option<Self> {
        if data == "back_to_analyze" {
            return Some(CallbackAction::BackToList);
        }
        if let Some(id) = data.strip_prefix("album_") {
            return id.parse().ok().map(CallbackAction::ShowAlbum);
        }
        if let Some(id) = data.strip_prefix("stats_") {
            return id.parse().ok().map(CallbackAction::ShowStats);
        }
        None
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackAction::ShowAlbum(id) => write!(f, "album_{id}"),
            CallbackAction::ShowStats(id) => write!(f, "stats_{id}"),
            CallbackAction::BackToList => f.write_str("back_to_analyze"),
        }
    }
}
