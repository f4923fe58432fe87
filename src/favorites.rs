//! The personal exhibition: a small persisted list of favourite artworks.
//!
//! The whole list is stored as one JSON array under a single key and is
//! rewritten on every change.  Favourites are a convenience, so nothing in
//! here ever returns an error to the caller: a corrupt blob is discarded and
//! a failed write is logged.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde_json::Value;

use crate::source::Artwork;

/// Key under which the exhibition is stored.
pub const FAVORITES_KEY: &str = "favorites";

/// A saved artwork has exactly the shape of a feed record.
pub type FavoriteEntry = Artwork;

/// Whole-value key/value persistence.
pub trait BlobStore: Send {
    fn read(&self, key: &str) -> io::Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl BlobStore for FileBlobStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        // Write-then-rename so a crash mid-write leaves the old blob intact.
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, self.path(key))
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Ordered set of favourites keyed by tagged id.
pub struct FavoritesStore {
    entries: Vec<FavoriteEntry>,
    store: Box<dyn BlobStore>,
}

impl FavoritesStore {
    /// Read the persisted exhibition once.
    ///
    /// A missing blob starts empty.  An unreadable blob, invalid JSON, or any
    /// JSON value other than an array of entries is logged and discarded.
    pub fn load(store: Box<dyn BlobStore>) -> Self {
        let entries = match store.read(FAVORITES_KEY) {
            Ok(Some(raw)) => match parse_entries(&raw) {
                Some(entries) => entries,
                None => {
                    log::warn!("[favorites] stored exhibition is corrupt; starting empty");
                    if let Err(e) = store.remove(FAVORITES_KEY) {
                        log::warn!("[favorites] could not discard corrupt blob: {e}");
                    }
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("[favorites] could not read exhibition: {e}; starting empty");
                Vec::new()
            }
        };
        log::info!("[favorites] loaded {} entries", entries.len());
        Self { entries, store }
    }

    /// Entries in the order they were added.
    pub fn entries(&self) -> &[FavoriteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Append `record` unless an entry with the same id exists.
    /// Returns whether the exhibition changed.
    pub fn add(&mut self, record: FavoriteEntry) -> bool {
        if self.contains(&record.id) {
            return false;
        }
        self.entries.push(record);
        self.persist();
        true
    }

    /// Remove the entry with `id`.  Returns whether the exhibition changed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        if self.entries.len() == before {
            return false;
        }
        self.persist();
        true
    }

    /// Add if absent, remove if present.  Returns `true` when the record is
    /// a favourite afterwards.
    pub fn toggle(&mut self, record: &Artwork) -> bool {
        if self.remove(&record.id) {
            false
        } else {
            self.add(record.clone())
        }
    }

    fn persist(&self) {
        let json = match serde_json::to_string(&self.entries) {
            Ok(json) => json,
            Err(e) => {
                log::error!("[favorites] could not serialise exhibition: {e}");
                return;
            }
        };
        for attempt in 1..=2 {
            match self.store.write(FAVORITES_KEY, &json) {
                Ok(()) => return,
                Err(e) => log::warn!("[favorites] write attempt {attempt} failed: {e}"),
            }
        }
    }
}

fn parse_entries(raw: &str) -> Option<Vec<FavoriteEntry>> {
    let value: Value = serde_json::from_str(raw).ok()?;
    if !value.is_array() {
        return None;
    }
    serde_json::from_value(value).ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
