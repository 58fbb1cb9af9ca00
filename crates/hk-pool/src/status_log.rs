use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use hk_core::{StatusSnapshot, StorageError};
use tracing::warn;

/// Append-only JSON Lines log of pool status snapshots.
///
/// The poller is the only writer; each record goes out in a single
/// `write_all` on an append-mode handle. Readers skip lines that do not parse
/// (a torn trailing line included) with a warning instead of failing.
#[derive(Debug, Clone)]
pub struct StatusLog {
    path: PathBuf,
}

impl StatusLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Append one snapshot as a line.
    pub fn append(&self, snapshot: &StatusSnapshot) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let mut line = serde_json::to_vec(snapshot)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StorageError::io(&self.path, e))?;
        file.write_all(&line)
            .and_then(|()| file.flush())
            .map_err(|e| StorageError::io(&self.path, e))?;
        Ok(())
    }

    /// All snapshots, oldest first. A missing log is empty.
    pub fn read_all(&self) -> Result<Vec<StatusSnapshot>, StorageError> {
        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };

        let mut snapshots = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| StorageError::io(&self.path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<StatusSnapshot>(&line) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(error) => {
                    warn!(
                        path = %self.path.display(),
                        line_number = idx + 1,
                        %error,
                        "skipping malformed pool log line"
                    );
                }
            }
        }
        Ok(snapshots)
    }

    /// The last `limit` snapshots, oldest first.
    pub fn read_recent(&self, limit: usize) -> Result<Vec<StatusSnapshot>, StorageError> {
        let mut all = self.read_all()?;
        let skip = all.len().saturating_sub(limit);
        Ok(all.split_off(skip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use serde_json::json;
    use tempfile::tempdir;

    fn snapshot(temp: f64, minute: u32) -> StatusSnapshot {
        let ts = FixedOffset::east_opt(7200)
            .unwrap()
            .with_ymd_and_hms(2025, 6, 1, 12, minute, 0)
            .unwrap();
        let payload = json!({"temp": temp, "pump": "on"}).as_object().cloned().unwrap();
        StatusSnapshot::new(payload, ts)
    }

    #[test]
    fn test_missing_log_reads_empty() {
        let dir = tempdir().unwrap();
        let log = StatusLog::new(dir.path().join("pool.jsonl"));
        assert!(!log.exists());
        assert!(log.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_append_then_read_in_order() {
        let dir = tempdir().unwrap();
        let log = StatusLog::new(dir.path().join("logs").join("pool.jsonl"));
        let first = snapshot(24.0, 0);
        let second = snapshot(24.5, 1);

        log.append(&first).unwrap();
        log.append(&second).unwrap();

        assert!(log.exists());
        assert_eq!(log.read_all().unwrap(), vec![first, second]);
    }

    #[test]
    fn test_one_line_per_record_with_logged_at() {
        let dir = tempdir().unwrap();
        let log = StatusLog::new(dir.path().join("pool.jsonl"));
        log.append(&snapshot(25.0, 3)).unwrap();
        log.append(&snapshot(25.5, 4)).unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(content.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["temp"], 25.0);
        assert_eq!(value["logged_at"], "2025-06-01T12:03:00+02:00");
    }

    #[test]
    fn test_append_never_rewrites_prior_records() {
        let dir = tempdir().unwrap();
        let log = StatusLog::new(dir.path().join("pool.jsonl"));
        log.append(&snapshot(20.0, 0)).unwrap();
        let before = std::fs::read(log.path()).unwrap();

        log.append(&snapshot(21.0, 1)).unwrap();
        let after = std::fs::read(log.path()).unwrap();
        assert!(after.starts_with(&before));
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = tempdir().unwrap();
        let log = StatusLog::new(dir.path().join("pool.jsonl"));
        log.append(&snapshot(20.0, 0)).unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(log.path()).unwrap();
            writeln!(file, "not json").unwrap();
            writeln!(file, "{{\"temp\": 1}}").unwrap();
            writeln!(file).unwrap();
        }
        log.append(&snapshot(22.0, 2)).unwrap();
        // Torn final record.
        {
            let mut file = OpenOptions::new().append(true).open(log.path()).unwrap();
            write!(file, "{{\"temp\": 23.0, \"logged_").unwrap();
        }

        let temps: Vec<_> = log
            .read_all()
            .unwrap()
            .iter()
            .map(|s| s.payload["temp"].as_f64().unwrap())
            .collect();
        assert_eq!(temps, vec![20.0, 22.0]);
    }

    #[test]
    fn test_read_recent_returns_tail() {
        let dir = tempdir().unwrap();
        let log = StatusLog::new(dir.path().join("pool.jsonl"));
        for minute in 0..5 {
            log.append(&snapshot(20.0 + f64::from(minute), minute)).unwrap();
        }

        let recent = log.read_recent(2).unwrap();
        let temps: Vec<_> = recent
            .iter()
            .map(|s| s.payload["temp"].as_f64().unwrap())
            .collect();
        assert_eq!(temps, vec![23.0, 24.0]);
        assert_eq!(log.read_recent(50).unwrap().len(), 5);
        assert!(log.read_recent(0).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_append_to_unwritable_path_fails() {
        let log = StatusLog::new("/dev/null/homekeep/pool.jsonl");
        assert!(matches!(
            log.append(&snapshot(20.0, 0)),
            Err(StorageError::Io { .. })
        ));
    }
}
