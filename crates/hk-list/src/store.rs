use std::io::Write;
use std::path::{Path, PathBuf};

use hk_core::{ShoppingEntry, StorageError};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
struct ItemsDocument {
    #[serde(default)]
    items: Vec<ShoppingEntry>,
}

#[derive(Serialize)]
struct ItemsDocumentRef<'a> {
    items: &'a [ShoppingEntry],
}

/// Whole-document storage of the shopping list.
///
/// Readers always see either the previous or the next complete document:
/// saves go to a temp file in the same directory which is then renamed over
/// the target.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all entries in insertion order. A missing document is an empty list.
    pub fn load(&self) -> Result<Vec<ShoppingEntry>, StorageError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };
        let document: ItemsDocument = serde_json::from_str(&content)
            .map_err(|e| StorageError::malformed(&self.path, e))?;
        Ok(document.items)
    }

    /// Replace the whole document with `entries`.
    pub fn save(&self, entries: &[ShoppingEntry]) -> Result<(), StorageError> {
        let mut data = serde_json::to_vec_pretty(&ItemsDocumentRef { items: entries })?;
        data.push(b'\n');
        atomic_write(&self.path, &data)
    }
}

/// Write data to a file atomically using temp-file + rename.
fn atomic_write(target: &Path, data: &[u8]) -> Result<(), StorageError> {
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| StorageError::io(parent, e))?;
    tmp.write_all(data)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| StorageError::io(tmp.path(), e))?;
    tmp.persist(target)
        .map_err(|e| StorageError::io(target, e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use tempfile::tempdir;

    fn entry(text: &str, flagged: bool, minute: u32) -> ShoppingEntry {
        let ts = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2025, 2, 1, 10, minute, 0)
            .unwrap();
        ShoppingEntry::new(text, flagged, "kitchen-tablet", ts)
    }

    #[test]
    fn test_load_missing_document_is_empty() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("items.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_preserves_entries() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("items.json"));
        let entries = vec![entry("milk", false, 1), entry("eggs", true, 2)];

        store.save(&entries).unwrap();
        assert_eq!(store.load().unwrap(), entries);
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("deep").join("nested").join("items.json"));
        store.save(&[entry("bread", false, 0)]).unwrap();
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_document_shape() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("items.json"));
        store.save(&[entry("milk", false, 5)]).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let items = value["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["item"], "milk");
        assert_eq!(items[0]["timestamp"], "2025-02-01T10:05:00+01:00");
        // Pretty-printed with two-space indentation.
        assert!(raw.contains("\n  \"items\""), "{raw}");
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("items.json"));
        store.save(&[entry("a", false, 0)]).unwrap();
        store.save(&[]).unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("items.json")]);
    }

    #[test]
    fn test_load_malformed_document_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("items.json");
        std::fs::write(&path, "{\"items\": [ {\"id\": 3 } ]}").unwrap();

        let err = RecordStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StorageError::Malformed { .. }), "{err}");
    }

    #[test]
    fn test_load_offsetless_timestamp_is_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("items.json");
        let legacy = r#"{"items": [{"id": "01JQ8Z5K6T3V9X2B4C7D8E9F0G", "item": "milk", "flagged": false,
            "timestamp": "2025-03-30 09:15:00", "source": "alexa"}]}"#;
        std::fs::write(&path, legacy).unwrap();

        let err = RecordStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StorageError::Malformed { .. }), "{err}");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), legacy);
    }

    #[test]
    fn test_load_document_without_items_key_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("items.json");
        std::fs::write(&path, "{}").unwrap();
        assert!(RecordStore::new(&path).load().unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_save_into_unwritable_dir_fails_with_io() {
        let store = RecordStore::new("/dev/null/homekeep/items.json");
        let err = store.save(&[]).unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }), "{err}");
    }
}
