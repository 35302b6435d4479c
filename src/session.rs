//! Purpose: Hold the client's authentication state (token + user id).
//! Exports: `Session`, `SessionStorage`, `FileStorage`, `MemoryStorage`.
//! Role: Single source of truth for "am I logged in, and as whom".
//! Invariants: Every read hits the backing storage; there is no in-memory cache.
//! Invariants: `user_id` is only meaningful while a token is present.
//! Invariants: Reads tolerate either entry being absent independently.

use crate::error::{Error, ErrorKind};
use crate::session_paths::default_session_path;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub const TOKEN_KEY: &str = "access_token";
pub const USER_ID_KEY: &str = "user_id";

/// Storage port for session entries. Implementations are last-write-wins
/// with no locking across processes, matching browser localStorage semantics.
pub trait SessionStorage: Send + Sync {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str) -> Result<(), Error>;
    fn remove(&self, key: &str) -> Result<(), Error>;
}

/// Session entries kept as one JSON object in a file, re-read on every access.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Map<String, Value> {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return Map::new();
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    fn store(&self, map: &Map<String, Value>) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to create session directory")
                    .with_source(err)
            })?;
        }
        let body = serde_json::to_string(&Value::Object(map.clone())).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to encode session file")
                .with_source(err)
        })?;
        std::fs::write(&self.path, body).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to write session file")
                .with_source(err)
        })
    }
}

impl SessionStorage for FileStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.load()
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut map = self.load();
        map.insert(key.to_string(), Value::String(value.to_string()));
        self.store(&map)
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let mut map = self.load();
        if map.remove(key).is_none() {
            return Ok(());
        }
        self.store(&map)
    }
}

/// In-memory fake for tests.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .get(key)
            .cloned()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), Error> {
        self.entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        self.entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .remove(key);
        Ok(())
    }
}

/// Injectable session object: set at login, cleared at logout, 401, or withdrawal.
#[derive(Clone)]
pub struct Session {
    storage: Arc<dyn SessionStorage>,
}

impl Session {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    /// Session backed by the default on-disk file (`~/.dogear/session.json`).
    pub fn from_default_file() -> Self {
        Self::from_file(default_session_path())
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStorage::new(path)))
    }

    /// Session backed by memory only; used by tests and one-shot flows.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Write the token (and user id, when known). No token format validation.
    pub fn save(&self, token: &str, user_id: Option<&str>) -> Result<(), Error> {
        self.storage.write(TOKEN_KEY, token)?;
        if let Some(user_id) = user_id {
            self.storage.write(USER_ID_KEY, user_id)?;
        }
        Ok(())
    }

    pub fn token(&self) -> Option<String> {
        self.storage.read(TOKEN_KEY)
    }

    pub fn user_id(&self) -> Option<String> {
        self.storage.read(USER_ID_KEY)
    }

    /// Remove both entries. A concurrent read may observe either entry
    /// independently absent; both tolerate that.
    pub fn clear(&self) -> Result<(), Error> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USER_ID_KEY)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// True iff the stored user id equals the candidate, compared as strings.
    pub fn is_owner(&self, candidate_id: impl fmt::Display) -> bool {
        self.user_id()
            .is_some_and(|stored| stored == candidate_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{FileStorage, Session};

    #[test]
    fn save_then_read_back() {
        let session = Session::in_memory();
        session.save("abc", Some("7")).expect("save");
        assert_eq!(session.token().as_deref(), Some("abc"));
        assert_eq!(session.user_id().as_deref(), Some("7"));
        assert!(session.is_authenticated());
    }

    #[test]
    fn clear_removes_both_entries() {
        let session = Session::in_memory();
        session.save("abc", Some("7")).expect("save");
        session.clear().expect("clear");
        assert_eq!(session.token(), None);
        assert_eq!(session.user_id(), None);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn save_without_user_id_keeps_existing_entry() {
        let session = Session::in_memory();
        session.save("abc", Some("7")).expect("save");
        session.save("def", None).expect("save");
        assert_eq!(session.token().as_deref(), Some("def"));
        assert_eq!(session.user_id().as_deref(), Some("7"));
    }

    #[test]
    fn is_owner_compares_as_strings() {
        let session = Session::in_memory();
        session.save("abc", Some("7")).expect("save");
        assert!(session.is_owner(7));
        assert!(session.is_owner("7"));
        assert!(!session.is_owner(8));
    }

    #[test]
    fn is_owner_is_false_without_user_id() {
        let session = Session::in_memory();
        assert!(!session.is_owner(7));
    }

    #[test]
    fn file_storage_round_trips_and_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        let session = Session::from_file(&path);
        session.save("tok", Some("42")).expect("save");

        let reopened = Session::from_file(&path);
        assert_eq!(reopened.token().as_deref(), Some("tok"));
        assert_eq!(reopened.user_id().as_deref(), Some("42"));

        reopened.clear().expect("clear");
        assert_eq!(session.token(), None);
    }

    #[test]
    fn file_storage_tolerates_missing_and_garbage_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.json");
        let storage = FileStorage::new(&path);
        assert_eq!(super::SessionStorage::read(&storage, "access_token"), None);

        std::fs::write(&path, "not json").expect("write");
        assert_eq!(super::SessionStorage::read(&storage, "access_token"), None);
    }
}
