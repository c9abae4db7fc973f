//! SQLite persistence for tracked albums and their play-count samples.
//!
//! Every operation opens its own connection and runs in one transaction, so
//! the bot handlers and the refresh job can use the store concurrently; the
//! busy timeout makes a writer wait for another instead of failing.

use chrono::NaiveDateTime;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::link::AlbumLink;
use crate::types::{format_timestamp, parse_timestamp, Album, AlbumInfo, Sample};
use crate::{Result, VkStatsError};

const ALBUM_COLUMNS: &str =
    "id, url, external_id, name, nick, genre_year, counts, track_count, date, last_update";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the album database.
///
/// Cheap to clone: it only holds the database path.
#[derive(Debug, Clone)]
pub struct Store {
    db_path: PathBuf,
}

impl Store {
    /// Open (creating if needed) the database at `db_path` and bring its
    /// schema up to date.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let store = Self {
            db_path: db_path.to_path_buf(),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS albums (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT UNIQUE,
                name TEXT,
                nick TEXT,
                genre_year TEXT,
                counts TEXT,
                track_count TEXT,
                date TEXT
            );

            CREATE TABLE IF NOT EXISTS stats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                aid INTEGER,
                counts TEXT,
                date TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (aid) REFERENCES albums(id)
            );
            "#,
        )?;

        // Databases written by the first version of the bot lack these.
        let columns = table_columns(&conn, "albums")?;
        if !columns.iter().any(|c| c == "external_id") {
            log::info!("Adding external_id column to albums");
            conn.execute_batch("ALTER TABLE albums ADD COLUMN external_id TEXT;")?;
        }
        if !columns.iter().any(|c| c == "last_update") {
            log::info!("Adding last_update column to albums");
            conn.execute_batch("ALTER TABLE albums ADD COLUMN last_update TEXT;")?;
        }
        backfill_external_ids(&conn)?;

        conn.execute_batch(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_albums_external_id ON albums(external_id);
            CREATE INDEX IF NOT EXISTS idx_stats_aid_date ON stats(aid, date);
            "#,
        )?;
        Ok(())
    }

    /// Insert a newly scraped album.
    ///
    /// Fails with [`VkStatsError::DuplicateAlbum`] if the URL or its external
    /// id is already tracked.
    pub fn insert_album(
        &self,
        url: &str,
        link: &AlbumLink,
        info: &AlbumInfo,
        added: NaiveDateTime,
    ) -> Result<Album> {
        let conn = self.connect()?;
        let external_id = link.external_id();
        let added = format_timestamp(added);

        let inserted = conn.execute(
            "INSERT INTO albums (url, external_id, name, nick, genre_year, counts, track_count, date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                url,
                external_id,
                info.name,
                info.nick,
                info.genre_year,
                info.plays,
                info.track_count,
                added
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                return Err(VkStatsError::DuplicateAlbum(external_id));
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Album {
            id: conn.last_insert_rowid(),
            url: url.to_string(),
            external_id: Some(external_id),
            name: info.name.clone(),
            nick: info.nick.clone(),
            genre_year: info.genre_year.clone(),
            counts: info.plays.clone(),
            track_count: info.track_count.clone(),
            added,
            last_update: None,
        })
    }

    /// All tracked albums, ordered by id.
    pub fn albums(&self) -> Result<Vec<Album>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!("SELECT {ALBUM_COLUMNS} FROM albums ORDER BY id"))?;
        let albums = stmt
            .query_map([], row_to_album)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(albums)
    }

    pub fn album(&self, id: i64) -> Result<Option<Album>> {
        let conn = self.connect()?;
        let album = conn
            .query_row(
                &format!("SELECT {ALBUM_COLUMNS} FROM albums WHERE id = ?1"),
                params![id],
                row_to_album,
            )
            .optional()?;
        Ok(album)
    }

    pub fn find_by_external_id(&self, external_id: &str) -> Result<Option<Album>> {
        let conn = self.connect()?;
        let album = conn
            .query_row(
                &format!("SELECT {ALBUM_COLUMNS} FROM albums WHERE external_id = ?1"),
                params![external_id],
                row_to_album,
            )
            .optional()?;
        Ok(album)
    }

    /// The time series of an album, oldest first.
    pub fn samples(&self, album_id: i64) -> Result<Vec<Sample>> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT aid, counts, date FROM stats WHERE aid = ?1 ORDER BY date, id")?;
        let samples = stmt
            .query_map(params![album_id], |row| {
                Ok(Sample {
                    album_id: row.get(0)?,
                    counts: text_column(row, 1)?,
                    date: text_column(row, 2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(samples)
    }

    pub fn sample_count(&self, album_id: i64) -> Result<usize> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM stats WHERE aid = ?1",
            params![album_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Append a sample and move the album's checkpoint to `at`, atomically.
    ///
    /// The snapshot play count of the album row is updated as well, so
    /// `/analyze` shows the latest figure.
    pub fn record_refresh(&self, album_id: i64, counts: &str, at: NaiveDateTime) -> Result<Sample> {
        let mut conn = self.connect()?;
        let stamp = format_timestamp(at);

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO stats (aid, counts, date) VALUES (?1, ?2, ?3)",
            params![album_id, counts, stamp],
        )?;
        let updated = tx.execute(
            "UPDATE albums SET counts = ?1, last_update = ?2 WHERE id = ?3",
            params![counts, stamp, album_id],
        )?;
        if updated == 0 {
            return Err(VkStatsError::Database(rusqlite::Error::QueryReturnedNoRows));
        }
        tx.commit()?;

        Ok(Sample {
            album_id,
            counts: counts.to_string(),
            date: stamp,
        })
    }

    /// Bulk-insert samples with explicit timestamps (synthetic test data).
    pub fn insert_samples(&self, album_id: i64, samples: &[(String, NaiveDateTime)]) -> Result<usize> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT INTO stats (aid, counts, date) VALUES (?1, ?2, ?3)")?;
            for (counts, at) in samples {
                stmt.execute(params![album_id, counts, format_timestamp(*at)])?;
            }
        }
        tx.commit()?;
        Ok(samples.len())
    }

    /// Set an album's checkpoint to `at` unless it already holds a newer one.
    ///
    /// Returns whether the row changed.
    pub fn restore_checkpoint(&self, album_id: i64, at: NaiveDateTime) -> Result<bool> {
        let conn = self.connect()?;
        let changed = conn.execute(
            "UPDATE albums SET last_update = ?1
             WHERE id = ?2 AND (last_update IS NULL OR last_update < ?1)",
            params![format_timestamp(at), album_id],
        )?;
        Ok(changed > 0)
    }

    /// Remove every album and sample and restart id numbering.
    pub fn clear(&self) -> Result<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute_batch(
            r#"
            DELETE FROM stats;
            DELETE FROM albums;
            DELETE FROM sqlite_sequence WHERE name IN ('albums', 'stats');
            "#,
        )?;
        tx.commit()?;
        log::info!("Cleared album database {}", self.db_path.display());
        Ok(())
    }
}

fn row_to_album(row: &Row) -> rusqlite::Result<Album> {
    let last_update: Option<String> = row.get(9)?;
    Ok(Album {
        id: row.get(0)?,
        url: text_column(row, 1)?,
        external_id: row.get(2)?,
        name: text_column(row, 3)?,
        nick: text_column(row, 4)?,
        genre_year: text_column(row, 5)?,
        counts: text_column(row, 6)?,
        track_count: text_column(row, 7)?,
        added: text_column(row, 8)?,
        last_update: last_update.as_deref().and_then(parse_timestamp),
    })
}

/// Read a loosely typed column as text; older rows may hold integers.
fn text_column(row: &Row, index: usize) -> rusqlite::Result<String> {
    Ok(match row.get_ref(index)? {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    })
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

fn backfill_external_ids(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare("SELECT id, url FROM albums WHERE external_id IS NULL")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Option<String>>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for (id, url) in rows {
        let Some(external_id) = url.as_deref().and_then(AlbumLink::parse).map(|l| l.external_id())
        else {
            log::warn!("Album {id} has an unrecognised url {url:?}, leaving external_id empty");
            continue;
        };

        let taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM albums WHERE external_id = ?1)",
            params![external_id],
            |row| row.get(0),
        )?;
        if taken {
            log::warn!("Album {id} duplicates external id {external_id}, leaving it empty");
            continue;
        }

        conn.execute(
            "UPDATE albums SET external_id = ?1 WHERE id = ?2",
            params![external_id, id],
        )?;
    }
    Ok(())
}
