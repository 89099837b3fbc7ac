//! Durable mapping from image pair identity to stored annotations.
//!
//! Every mutation rewrites the complete mapping. Writes go to a sibling
//! temporary file which is synced and then renamed over the target, and the
//! containing directory is synced after the rename, so a crash mid-write
//! leaves either the old file or the new one.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use web_time::Instant;

use crate::format::error::{CorruptStoreError, StoreError};
use crate::format::record::{PairRecord, StoreMapping};
use crate::model::PairIdentity;

/// What [`AnnotationStore::load`] found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No store file yet. Normal on first run.
    Missing,
    /// Store file read successfully.
    Loaded {
        /// Number of pair records read
        records: usize,
    },
    /// Store file was unreadable; the mapping starts empty.
    Recovered(CorruptStoreError),
}

/// Annotation store backed by a single JSON file.
#[derive(Debug)]
pub struct AnnotationStore {
    path: PathBuf,
    records: StoreMapping,
}

impl AnnotationStore {
    /// Create an empty store for `path` without touching the disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: StoreMapping::new(),
        }
    }

    /// Create a store for `path` and load it.
    pub fn open(path: impl Into<PathBuf>) -> Result<(Self, LoadOutcome), StoreError> {
        let mut store = Self::new(path);
        let outcome = store.load()?;
        Ok((store, outcome))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the in-memory mapping with the file contents.
    ///
    /// A missing file yields an empty mapping. A file that cannot be parsed
    /// also yields an empty mapping, reported through
    /// [`LoadOutcome::Recovered`]. Other I/O failures are returned as errors
    /// and leave the current mapping untouched.
    pub fn load(&mut self) -> Result<LoadOutcome, StoreError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("No annotation store at {:?}, starting empty", self.path);
                self.records.clear();
                return Ok(LoadOutcome::Missing);
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Ok(self.recover(format!("not valid UTF-8: {}", e)));
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        let records: StoreMapping = match serde_json::from_str(&json) {
            Ok(records) => records,
            Err(e) => return Ok(self.recover(e.to_string())),
        };

        for (key, record) in &records {
            if let Err(e) = record.validate() {
                return Ok(self.recover(format!("record '{}': {}", key, e)));
            }
        }

        log::info!(
            "Loaded {} annotated pairs from {:?}",
            records.len(),
            self.path
        );
        let count = records.len();
        self.records = records;
        Ok(LoadOutcome::Loaded { records: count })
    }

    /// Write the complete mapping to disk.
    pub fn save(&self) -> Result<(), StoreError> {
        let start = Instant::now();
        let json = serde_json::to_string_pretty(&self.records)?;
        write_atomically(&self.path, json.as_bytes())
            .map_err(|e| StoreError::io(&self.path, e))?;
        log::debug!(
            "Saved {} annotated pairs to {:?} in {:?}",
            self.records.len(),
            self.path,
            start.elapsed()
        );
        Ok(())
    }

    /// Store `record` for `identity` and save.
    ///
    /// Returns `false` without writing when the stored record is already
    /// identical. On a failed save the previous record is put back.
    pub fn upsert(
        &mut self,
        identity: &PairIdentity,
        record: PairRecord,
    ) -> Result<bool, StoreError> {
        if self.records.get(identity.key()) == Some(&record) {
            log::trace!("Record for {} unchanged, skipping save", identity);
            return Ok(false);
        }

        let key = identity.key().to_string();
        let previous = self.records.insert(key.clone(), record);
        if let Err(e) = self.save() {
            match previous {
                Some(previous) => self.records.insert(key, previous),
                None => self.records.remove(&key),
            };
            return Err(e);
        }
        Ok(true)
    }

    /// Delete the record for `identity` and save.
    ///
    /// Does nothing when no record exists. On a failed save the record is put
    /// back.
    pub fn remove(&mut self, identity: &PairIdentity) -> Result<Option<PairRecord>, StoreError> {
        let Some(previous) = self.records.remove(identity.key()) else {
            return Ok(None);
        };
        if let Err(e) = self.save() {
            self.records.insert(identity.key().to_string(), previous);
            return Err(e);
        }
        log::debug!("Removed record for {}", identity);
        Ok(Some(previous))
    }

    /// Stored record for `identity`, if any.
    pub fn get(&self, identity: &PairIdentity) -> Option<&PairRecord> {
        self.records.get(identity.key())
    }

    pub fn contains(&self, identity: &PairIdentity) -> bool {
        self.records.contains_key(identity.key())
    }

    /// All stored records.
    pub fn records(&self) -> &StoreMapping {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn recover(&mut self, reason: String) -> LoadOutcome {
        let err = CorruptStoreError {
            path: self.path.clone(),
            reason,
        };
        log::warn!("{}; starting with an empty store", err);
        self.records.clear();
        LoadOutcome::Recovered(err)
    }
}

/// Sibling path used while writing `path`.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("annotations"));
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let temp_path = temp_path_for(path);
    let written = fs::File::create(&temp_path).and_then(|mut file| {
        file.write_all(contents)?;
        file.sync_all()
    });

    if let Err(e) = written.and_then(|()| fs::rename(&temp_path, path)) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    sync_parent_dir(path)
}

/// Flush the directory entry created by the rename.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::File::open(parent)?.sync_all()
}

/// Directories cannot be opened for syncing here; the rename is durable once
/// it returns.
#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ImagePaths;

    fn record(points: &[[i32; 2]]) -> PairRecord {
        PairRecord {
            rgb_points: points.to_vec(),
            depth_points: points.iter().map(|[x, y]| [x + 36, y - 8]).collect(),
            image_paths: ImagePaths {
                rgb: "rgb/a.png".to_string(),
                depth: "depth/a.png".to_string(),
            },
        }
    }

    fn id(key: &str) -> PairIdentity {
        PairIdentity::from_key(key)
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let (store, outcome) = AnnotationStore::open(dir.path().join("annotations.json")).unwrap();
        assert_eq!(outcome, LoadOutcome::Missing);
        assert!(store.is_empty());
    }

    #[test]
    fn test_upsert_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotations.json");

        let mut store = AnnotationStore::new(&path);
        assert!(store.upsert(&id("a|a"), record(&[[1, 2], [3, 4]])).unwrap());
        assert!(store.upsert(&id("b|b"), record(&[[5, 6]])).unwrap());

        let (reloaded, outcome) = AnnotationStore::open(&path).unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded { records: 2 });
        assert_eq!(reloaded.get(&id("a|a")), Some(&record(&[[1, 2], [3, 4]])));
        assert_eq!(reloaded.get(&id("b|b")), Some(&record(&[[5, 6]])));
    }

    #[test]
    fn test_upsert_identical_record_skips_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotations.json");

        let mut store = AnnotationStore::new(&path);
        assert!(store.upsert(&id("a|a"), record(&[[1, 2]])).unwrap());
        fs::remove_file(&path).unwrap();

        assert!(!store.upsert(&id("a|a"), record(&[[1, 2]])).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_saved_file_is_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotations.json");

        let mut store = AnnotationStore::new(&path);
        store.upsert(&id("a|a"), record(&[[100, 100]])).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["a|a"]["rgb_points"], serde_json::json!([[100, 100]]));
        assert_eq!(value["a|a"]["depth_points"], serde_json::json!([[136, 92]]));
        assert_eq!(value["a|a"]["image_paths"]["rgb"], "rgb/a.png");
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_remove_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotations.json");

        let mut store = AnnotationStore::new(&path);
        store.upsert(&id("a|a"), record(&[[1, 2]])).unwrap();
        assert!(store.remove(&id("a|a")).unwrap().is_some());
        assert!(store.remove(&id("a|a")).unwrap().is_none());

        let (reloaded, _) = AnnotationStore::open(&path).unwrap();
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_corrupt_file_recovers_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotations.json");
        fs::write(&path, "{ this is not json").unwrap();

        let (mut store, outcome) = AnnotationStore::open(&path).unwrap();
        match outcome {
            LoadOutcome::Recovered(err) => assert_eq!(err.path, path),
            other => panic!("Expected Recovered, got {:?}", other),
        }
        assert!(store.is_empty());

        store.upsert(&id("a|a"), record(&[[7, 7]])).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let parsed: StoreMapping = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_wrong_shape_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotations.json");
        fs::write(&path, r#"{"a|a": {"rgb_points": "nope"}}"#).unwrap();

        let (_, outcome) = AnnotationStore::open(&path).unwrap();
        assert!(matches!(outcome, LoadOutcome::Recovered(_)));
    }

    #[test]
    fn test_mismatched_record_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotations.json");
        fs::write(
            &path,
            r#"{"a|a": {"rgb_points": [[1, 1], [2, 2]], "depth_points": [[1, 1]],
                "image_paths": {"rgb": "a", "depth": "a"}}}"#,
        )
        .unwrap();

        let (_, outcome) = AnnotationStore::open(&path).unwrap();
        match outcome {
            LoadOutcome::Recovered(err) => assert!(err.reason.contains("a|a")),
            other => panic!("Expected Recovered, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let mut store = AnnotationStore::new(blocker.join("annotations.json"));
        let err = store.upsert(&id("a|a"), record(&[[1, 2]])).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("annotations.json");

        let mut store = AnnotationStore::new(&path);
        store.upsert(&id("a|a"), record(&[[1, 2]])).unwrap();
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_sync_parent_dir_opens_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(sync_parent_dir(&dir.path().join("annotations.json")).is_ok());

        let missing = dir.path().join("gone").join("annotations.json");
        assert!(sync_parent_dir(&missing).is_err());
    }
}
