//! Persistence of the operator's user id.
//!
//! The id is stored in a small JSON document so that it survives restarts:
//!
//! ```json
//! {"user_id": "operator-7"}
//! ```
//!
//! A missing file simply means no id has been set yet.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for user store operations.
#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("I/O error accessing user data at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("user data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load/save access to the persisted user id.
///
/// The production implementation is [`JsonUserStore`]; tests use
/// [`MemoryUserStore`].
pub trait UserStore: Send + Sync {
    /// Returns the stored id, or `None` if none has been saved.
    fn load(&self) -> Result<Option<String>, UserStoreError>;
    /// Persists `user_id`, replacing any previous value.
    fn save(&self, user_id: &str) -> Result<(), UserStoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UserData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
}

/// [`UserStore`] backed by a JSON file.
#[derive(Debug, Clone)]
pub struct JsonUserStore {
    path: PathBuf,
}

impl JsonUserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> UserStoreError {
        UserStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl UserStore for JsonUserStore {
    fn load(&self) -> Result<Option<String>, UserStoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let data: UserData = serde_json::from_str(&content)?;
                Ok(data.user_id.filter(|id| !id.is_empty()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_err(e)),
        }
    }

    fn save(&self, user_id: &str) -> Result<(), UserStoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| self.io_err(e))?;
        }

        let data = UserData {
            user_id: Some(user_id.to_string()),
        };
        let content = serde_json::to_string_pretty(&data)?;
        std::fs::write(&self.path, content).map_err(|e| self.io_err(e))
    }
}

/// In-memory [`UserStore`] for tests and for running without persistence.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    user_id: Mutex<Option<String>>,
    saves: Mutex<Vec<String>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `user_id`.
    pub fn with_user_id(user_id: &str) -> Self {
        Self {
            user_id: Mutex::new(Some(user_id.to_string())),
            saves: Mutex::new(Vec::new()),
        }
    }

    /// Every id passed to [`UserStore::save`], in call order.
    pub fn saved_ids(&self) -> Vec<String> {
        self.saves.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl UserStore for MemoryUserStore {
    fn load(&self) -> Result<Option<String>, UserStoreError> {
        Ok(self.user_id.lock().ok().and_then(|id| id.clone()))
    }

    fn save(&self, user_id: &str) -> Result<(), UserStoreError> {
        if let Ok(mut current) = self.user_id.lock() {
            *current = Some(user_id.to_string());
        }
        if let Ok(mut saves) = self.saves.lock() {
            saves.push(user_id.to_string());
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("transcribe_user_{}", uuid::Uuid::new_v4()))
            .join("user_data.json")
    }

    #[test]
    fn test_load_missing_file_returns_none() {
        let store = JsonUserStore::new(temp_path());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_then_load_round_trips_and_creates_parent_dir() {
        // Arrange
        let path = temp_path();
        let store = JsonUserStore::new(&path);

        // Act
        store.save("operator-7").unwrap();
        let loaded = JsonUserStore::new(&path).load().unwrap();

        // Assert
        assert_eq!(loaded.as_deref(), Some("operator-7"));
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["user_id"], "operator-7");

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_corrupt_file_is_a_json_error() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        let result = JsonUserStore::new(&path).load();

        assert!(matches!(result, Err(UserStoreError::Json(_))));
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_empty_user_id_loads_as_none() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"user_id": ""}"#).unwrap();

        assert_eq!(JsonUserStore::new(&path).load().unwrap(), None);
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_memory_store_records_saves() {
        let store = MemoryUserStore::with_user_id("first");

        store.save("second").unwrap();

        assert_eq!(store.load().unwrap().as_deref(), Some("second"));
        assert_eq!(store.saved_ids(), vec!["second".to_string()]);
    }
}
