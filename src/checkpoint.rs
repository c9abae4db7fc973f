//! Refresh bookkeeping.
//!
//! The checkpoint of an album is the timestamp of its last successful
//! refresh. It lives in the album row and is written in the same transaction
//! as the sample it accounts for. Older deployments kept it in a JSON side
//! file; [`import_legacy_checkpoints`] folds such a file into the store once.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::store::Store;
use crate::types::parse_timestamp;
use crate::Result;

/// Last-refresh state of one album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub album_id: i64,
    pub url: String,
    /// `None` means the album was never refreshed.
    pub last_update: Option<NaiveDateTime>,
}

impl Checkpoint {
    /// Whether the album should be re-scraped at `now`.
    pub fn is_due(&self, now: NaiveDateTime, stale_after: Duration) -> bool {
        match self.last_update {
            Some(last_update) => now - last_update >= stale_after,
            None => true,
        }
    }
}

/// One entry of the legacy checkpoint file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyCheckpoint {
    pub url: String,
    #[serde(default)]
    pub last_update: Option<String>,
}

/// Read a legacy checkpoint file: album id (as a string) to entry.
pub fn load_legacy_checkpoints(path: &Path) -> Result<BTreeMap<String, LegacyCheckpoint>> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Import a legacy checkpoint file into the store.
///
/// Entries whose album no longer exists, or whose timestamp is missing or
/// malformed, are skipped. The store keeps whichever timestamp is newer. On
/// success the file is renamed to `<file>.imported` so it is not read again.
///
/// Returns the number of albums whose checkpoint was updated; `Ok(0)` when
/// there is no file.
pub fn import_legacy_checkpoints(path: &Path, store: &Store) -> Result<usize> {
    if !path.exists() {
        return Ok(0);
    }

    let entries = load_legacy_checkpoints(path)?;
    let mut imported = 0;

    for (album_id, entry) in &entries {
        let Ok(album_id) = album_id.parse::<i64>() else {
            log::warn!("Skipping checkpoint with non-numeric album id {album_id:?}");
            continue;
        };
        let Some(last_update) = entry.last_update.as_deref().and_then(parse_timestamp) else {
            log::debug!("Album {album_id} has no usable last_update, skipping");
            continue;
        };

        if store.restore_checkpoint(album_id, last_update)? {
            imported += 1;
        }
    }

    fs::rename(path, imported_path(path))?;
    log::info!(
        "Imported {imported} of {} legacy checkpoints from {}",
        entries.len(),
        path.display()
    );
    Ok(imported)
}

fn imported_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".imported");
    PathBuf::from(name)
}
