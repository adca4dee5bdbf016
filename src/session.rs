//! File-backed [`SessionStore`]: a small JSON object on disk standing in for
//! browser local storage. Only the signed-in identity is kept, under
//! [`STORAGE_KEY`].

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::contract::SessionStore;
use crate::error::SessionError;

pub const STORAGE_KEY: &str = "driveOptimaUser";
pub const DEMO_USER: &str = "demo@driveoptima.ai";
const STORAGE_FILE: &str = "storage.json";

#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store at `<dir>/storage.json`.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        FileSessionStore {
            path: dir.as_ref().join(STORAGE_FILE),
        }
    }

    /// Store under `dir` if given, else the platform local data directory.
    pub fn open(dir: Option<&Path>) -> Result<Self, SessionError> {
        let dir = match dir {
            Some(d) => d.to_path_buf(),
            None => dirs::data_local_dir()
                .ok_or(SessionError::NoStorageDir)?
                .join("drive-optima"),
        };
        debug!(dir = %dir.display(), "Opening session storage");
        Ok(FileSessionStore::new(dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, SessionError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        serde_json::from_str(&raw).map_err(|e| SessionError::Corrupt {
            path: self.path.clone(),
            source: e,
        })
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<(), SessionError> {
        let io_err = |e: std::io::Error| SessionError::Io {
            path: self.path.clone(),
            source: e,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let raw = serde_json::to_string_pretty(map).map_err(|e| SessionError::Corrupt {
            path: self.path.clone(),
            source: e,
        })?;
        fs::write(&self.path, raw).map_err(io_err)
    }
}

impl SessionStore for FileSessionStore {
    fn load_user(&self) -> Result<Option<String>, SessionError> {
        let map = self.read_map()?;
        match map.get(STORAGE_KEY) {
            Some(Value::String(user)) if !user.is_empty() => Ok(Some(user.clone())),
            Some(other) => {
                warn!(value = %other, "Ignoring non-string session identity");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn save_user(&self, user: &str) -> Result<(), SessionError> {
        let mut map = self.read_map()?;
        map.insert(STORAGE_KEY.to_string(), Value::String(user.to_string()));
        self.write_map(&map)?;
        info!(user, path = %self.path.display(), "Persisted signed-in identity");
        Ok(())
    }

    fn clear_user(&self) -> Result<(), SessionError> {
        let mut map = self.read_map()?;
        if map.remove(STORAGE_KEY).is_some() {
            self.write_map(&map)?;
            info!(path = %self.path.display(), "Cleared signed-in identity");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_storage_has_no_user() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        assert_eq!(store.load_user().unwrap(), None);
    }

    #[test]
    fn save_then_clear() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested"));
        store.save_user(DEMO_USER).unwrap();
        assert_eq!(store.load_user().unwrap().as_deref(), Some(DEMO_USER));

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains(STORAGE_KEY));

        store.clear_user().unwrap();
        assert_eq!(store.load_user().unwrap(), None);
        // Clearing twice is fine.
        store.clear_user().unwrap();
    }

    #[test]
    fn unrelated_keys_survive() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        fs::write(store.path(), r#"{"theme": "dark"}"#).unwrap();
        store.save_user("a@b.c").unwrap();
        store.clear_user().unwrap();
        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("theme"));
    }

    #[test]
    fn corrupt_storage_is_reported() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        fs::write(store.path(), "not json").unwrap();
        assert!(matches!(
            store.load_user(),
            Err(SessionError::Corrupt { .. })
        ));
    }
}
