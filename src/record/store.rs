use crate::record::AnalysisRecord;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::warn;

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("USERPROFILE").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_records_path() -> PathBuf {
    let dir = std::env::var_os("MAILSIFT_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| home_dir().join(".mailsift"));
    dir.join("records.json")
}

/// Durable home of the record collection: one JSON file holding the whole
/// collection as a single array. Persistence is best effort; every
/// operation degrades to "no saved records" or "write skipped" rather than
/// surfacing an error, and failures only reach the diagnostic log.
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn open_default() -> Self {
        Self::at(default_records_path())
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the full collection. A missing file, an unreadable file, and a
    /// corrupt blob all load as an empty collection.
    pub fn load_all(&self) -> Vec<AnalysisRecord> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                warn!("failed to read {}: {err}", self.path.display());
                return Vec::new();
            }
        };

        match serde_json::from_slice(&data) {
            Ok(records) => records,
            Err(err) => {
                warn!("failed to parse {}: {err}", self.path.display());
                Vec::new()
            }
        }
    }

    /// Replaces the persisted collection. A failed write leaves the previous
    /// blob in place; the caller's in-memory collection stays authoritative
    /// for the rest of the session.
    pub fn save_all(&self, records: &[AnalysisRecord]) {
        if let Err(err) = self.write_blob(records) {
            warn!("failed to persist {}: {err}", self.path.display());
        }
    }

    /// Removes the record with the given id, if present. Deleting an id that
    /// is not in the collection rewrites it unchanged.
    pub fn delete_by_id(&self, id: u64) {
        let records: Vec<AnalysisRecord> = self
            .load_all()
            .into_iter()
            .filter(|record| record.id != id)
            .collect();
        self.save_all(&records);
    }

    fn write_blob(&self, records: &[AnalysisRecord]) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        let bytes = serde_json::to_vec_pretty(records)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;
        let tmp_path = self.path.with_extension("json.tmp");

        fs::write(&tmp_path, bytes)?;
        match fs::rename(&tmp_path, &self.path) {
            Ok(()) => Ok(()),
            Err(rename_err) => {
                if self.path.exists() {
                    fs::remove_file(&self.path)?;
                    fs::rename(&tmp_path, &self.path)?;
                    Ok(())
                } else {
                    Err(rename_err)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RecordStore;
    use crate::record::AnalysisRecord;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_store(prefix: &str) -> RecordStore {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();
        let path: PathBuf = std::env::temp_dir().join(format!(
            "mailsift_record_store_{prefix}_{}_{}.json",
            std::process::id(),
            nanos
        ));
        RecordStore::at(path)
    }

    fn record(id: u64, original_text: &str) -> AnalysisRecord {
        AnalysisRecord {
            id,
            date: "2026-08-07T12:00:00Z".to_string(),
            title: format!("Record {id}"),
            classification: "Productive".to_string(),
            response: "Thanks, we are on it.".to_string(),
            original_text: original_text.to_string(),
        }
    }

    #[test]
    fn load_all_returns_empty_when_nothing_is_stored() {
        let store = temp_store("missing");
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn load_all_returns_empty_for_a_corrupt_blob() {
        let store = temp_store("corrupt");
        fs::write(&store.path, b"not json at all {{{").expect("fixture should write");

        assert!(store.load_all().is_empty());

        let _ = fs::remove_file(&store.path);
    }

    #[test]
    fn save_all_then_load_all_round_trips_the_collection() {
        let store = temp_store("round_trip");
        let records = vec![record(1, "first"), record(2, "second")];

        store.save_all(&records);
        assert_eq!(store.load_all(), records);

        let _ = fs::remove_file(&store.path);
    }

    #[test]
    fn save_all_replaces_the_previous_blob() {
        let store = temp_store("replace");
        store.save_all(&[record(1, "first"), record(2, "second")]);
        store.save_all(&[record(3, "third")]);

        let loaded = store.load_all();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, 3);

        let _ = fs::remove_file(&store.path);
    }

    #[test]
    fn delete_by_id_removes_only_the_matching_record() {
        let store = temp_store("delete");
        store.save_all(&[record(1, "keep"), record(2, "drop")]);

        store.delete_by_id(2);

        let loaded = store.load_all();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, 1);

        let _ = fs::remove_file(&store.path);
    }

    #[test]
    fn delete_by_id_is_idempotent_for_a_missing_id() {
        let store = temp_store("delete_missing");
        let records = vec![record(1, "keep"), record(2, "also keep")];
        store.save_all(&records);

        store.delete_by_id(99);
        store.delete_by_id(99);

        assert_eq!(store.load_all(), records);

        let _ = fs::remove_file(&store.path);
    }

    #[test]
    fn stored_blob_keeps_camel_case_field_names() {
        let store = temp_store("blob_shape");
        store.save_all(&[record(1, "sample")]);

        let blob = fs::read_to_string(&store.path).expect("blob should exist");
        assert!(blob.contains("\"originalText\""));

        let _ = fs::remove_file(&store.path);
    }
}
