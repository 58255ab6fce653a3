use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::domain::{FeedState, StateMap};
use crate::errors::TailResult;
use crate::storage::traits::StateStore;

/// State kept in a single JSON document, replaced atomically on save.
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> TailResult<StateMap> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(StateMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(StateMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, states: &StateMap) -> TailResult<()> {
        // sorted so the file diffs cleanly between runs
        let sorted: BTreeMap<&String, &FeedState> = states.iter().collect();
        let content = serde_json::to_string_pretty(&sorted)?;

        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, content)?;
        if let Err(e) = std::fs::rename(&temp_path, &self.path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonStateStore::new(dir.path().join("absent.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let store = JsonStateStore::new(&path);

        let mut states = StateMap::new();
        states.insert(
            "https://example.com/feed".to_string(),
            FeedState {
                etag: None,
                last_modified: Some("Wed, 04 Jan 2012 11:30:00 GMT".to_string()),
                updated: Some(Utc.with_ymd_and_hms(2012, 1, 4, 11, 30, 0).unwrap()),
            },
        );

        store.save(&states).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(JsonStateStore::new(&path).load().unwrap(), states);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(JsonStateStore::new(&path).load().is_err());
    }
}
