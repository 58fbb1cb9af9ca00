use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use hk_core::{ListError, ShoppingEntry, StampZone, StorageError, split_items};
use tracing::{debug, info};
use ulid::Ulid;

use crate::store::RecordStore;

/// Shopping-list use cases on top of a [`RecordStore`].
///
/// Every mutation is a load-modify-save cycle held under an `flock` on a
/// `.lock` file next to the document, so concurrent requests (or a CLI call
/// racing the server) cannot lose each other's updates.
#[derive(Debug)]
pub struct ListService {
    store: RecordStore,
    zone: StampZone,
    lock_path: PathBuf,
}

impl ListService {
    /// `zone` is the zone new entries are stamped in.
    pub fn new(store: RecordStore, zone: StampZone) -> Self {
        let lock_path = lock_path_for(store.path());
        Self {
            store,
            zone,
            lock_path,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Parse `raw` into one or more entries from `source` and persist them.
    pub fn add(&self, raw: &str, source: &str) -> Result<Vec<ShoppingEntry>, ListError> {
        self.add_at(raw, source, Utc::now())
    }

    /// [`add`](Self::add) with an explicit capture instant.
    pub fn add_at(
        &self,
        raw: &str,
        source: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<ShoppingEntry>, ListError> {
        if raw.trim().is_empty() || source.trim().is_empty() {
            return Err(ListError::MissingField);
        }

        let parsed = split_items(raw);
        if parsed.is_empty() {
            return Err(ListError::MissingField);
        }

        let created_at = self.zone.stamp(now);
        let created: Vec<ShoppingEntry> = parsed
            .into_iter()
            .map(|item| ShoppingEntry::new(item.text, item.flagged, source, created_at))
            .collect();

        self.with_write_lock(|| {
            let mut entries = self.store.load()?;
            entries.extend(created.iter().cloned());
            // One save for the whole batch.
            self.store.save(&entries)
        })?;

        info!(
            source = %source,
            count = created.len(),
            flagged = created.iter().filter(|e| e.flagged).count(),
            "added shopping entries"
        );
        Ok(created)
    }

    /// Remove the entry with `id`. Unknown ids are a no-op.
    ///
    /// Returns whether an entry was removed.
    pub fn delete(&self, id: &str) -> Result<bool, ListError> {
        let Ok(id) = Ulid::from_string(id.trim()) else {
            debug!(id = %id, "ignoring delete for malformed entry id");
            return Ok(false);
        };

        let removed = self.with_write_lock(|| {
            let mut entries = self.store.load()?;
            let before = entries.len();
            entries.retain(|entry| entry.id != id);
            if entries.len() == before {
                return Ok(false);
            }
            self.store.save(&entries)?;
            Ok(true)
        })?;

        if removed {
            info!(id = %id, "deleted shopping entry");
        } else {
            debug!(id = %id, "delete of unknown entry id");
        }
        Ok(removed)
    }

    /// Drop every entry.
    pub fn clear_all(&self) -> Result<(), ListError> {
        self.with_write_lock(|| self.store.save(&[]))?;
        info!("cleared shopping list");
        Ok(())
    }

    /// All entries, newest first. Entries sharing a timestamp keep insertion order.
    pub fn list_sorted(&self) -> Result<Vec<ShoppingEntry>, ListError> {
        let mut entries = self.store.load()?;
        // `sort_by` is stable.
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    /// Acquire the write lock, execute `f`, then release.
    fn with_write_lock<T>(
        &self,
        f: impl FnOnce() -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        if let Some(parent) = self.lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let lock_file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|e| StorageError::io(&self.lock_path, e))?;
        let mut lock = fd_lock::RwLock::new(lock_file);
        let _guard = lock
            .write()
            .map_err(|e| StorageError::io(&self.lock_path, e))?;

        f()
    }
}

fn lock_path_for(document: &Path) -> PathBuf {
    let mut buf: OsString = document.as_os_str().to_owned();
    buf.push(".lock");
    PathBuf::from(buf)
}
