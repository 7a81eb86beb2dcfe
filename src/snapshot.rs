//! Snapshot persistence.
//!
//! The station map and the two derived query documents (station records,
//! pilot reports) are each persisted as a single JSON document. Writes go
//! through a temp file in the target directory followed by a rename, so a
//! concurrent reader never observes a half-written document.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::warn;

use crate::errors::AvwxError;

/// Atomically write a JSON document.
pub fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<(), AvwxError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir).map_err(|e| AvwxError::SnapshotWriteError {
        path: path.to_path_buf(),
        origin: e.to_string(),
    })?;
    serde_json::to_writer(tmp.as_file(), value)?;
    tmp.persist(path).map_err(|e| AvwxError::SnapshotWriteError {
        path: path.to_path_buf(),
        origin: e.to_string(),
    })?;
    Ok(())
}

/// Read a JSON document, reporting missing or structurally invalid files.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, AvwxError> {
    let bytes = fs::read(path).map_err(|e| AvwxError::SnapshotReadError {
        path: path.to_path_buf(),
        origin: e.to_string(),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| AvwxError::SnapshotReadError {
        path: path.to_path_buf(),
        origin: e.to_string(),
    })
}

/// Read a JSON document, absorbing failures into the empty value.
///
/// A missing snapshot is the expected first-run state and a corrupt one must
/// not take the process down; either way the caller continues with no prior
/// data and the condition is logged.
pub fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match read_document(path) {
        Ok(value) => value,
        Err(e) => {
            warn!("Starting with empty data set: {}", e);
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use tempfile::tempdir;

    use super::*;
    use crate::models::StationReport;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot.json");

        let mut reports = BTreeMap::new();
        reports.insert(
            "KUGN".to_string(),
            StationReport {
                location: "KUGN".to_string(),
                time: "2024-01-05T12:51:00Z".to_string(),
                metar: "KUGN 051251Z 18012G20KT".to_string(),
                taf: "KUGN 051130Z 0512/0612".to_string(),
                ..StationReport::default()
            },
        );

        write_document(&path, &reports).unwrap();
        let restored: BTreeMap<String, StationReport> = read_document(&path).unwrap();

        assert_eq!(restored, reports);
    }

    #[test]
    fn missing_document_reports_and_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("does-not-exist.json");

        let result: Result<BTreeMap<String, StationReport>, _> = read_document(&path);
        assert!(matches!(result, Err(AvwxError::SnapshotReadError { .. })));

        let restored: BTreeMap<String, StationReport> = load_or_default(&path);
        assert!(restored.is_empty());
    }

    #[test]
    fn corrupt_document_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        fs::write(&path, b"{ \"KUGN\": { \"Loc").unwrap();

        let restored: BTreeMap<String, StationReport> = load_or_default(&path);
        assert!(restored.is_empty());
    }

    #[test]
    fn write_to_unwritable_path_is_an_error() {
        let path = Path::new("/nonexistent-dir/snapshot.json");
        let reports: BTreeMap<String, StationReport> = BTreeMap::new();
        assert!(matches!(
            write_document(path, &reports),
            Err(AvwxError::SnapshotWriteError { .. })
        ));
    }
}
