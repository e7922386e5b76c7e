use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use tracing::{debug, info};

/// Key under which the logged-in user's identifier is persisted.
pub const SESSION_KEY: &str = "userId";

/// Persistent string key/value map kept in a JSON file.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> anyhow::Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).with_context(|| format!("parse {}", self.path.display()))
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        let raw = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, raw).with_context(|| format!("write {}", self.path.display()))
    }

    pub fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    pub fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    pub fn remove(&self, key: &str) -> anyhow::Result<()> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// The authenticated user's context. Created at login, ended at logout,
/// read-only in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: String,
}

impl Session {
    pub fn start(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Session left behind by a previous run, if any.
    pub fn restore(storage: &LocalStorage) -> anyhow::Result<Option<Self>> {
        let restored = storage
            .get(SESSION_KEY)?
            .filter(|id| !id.is_empty())
            .map(Self::start);
        if let Some(s) = &restored {
            debug!(user_id = %s.user_id, "session restored");
        }
        Ok(restored)
    }

    pub fn persist(&self, storage: &LocalStorage) -> anyhow::Result<()> {
        storage.set(SESSION_KEY, &self.user_id)?;
        info!(user_id = %self.user_id, "session started");
        Ok(())
    }

    pub fn end(self, storage: &LocalStorage) -> anyhow::Result<()> {
        storage.remove(SESSION_KEY)?;
        info!(user_id = %self.user_id, "session ended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("nested").join("session.json"));
        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);
        assert!(Session::restore(&storage).unwrap().is_none());
    }

    #[test]
    fn persist_restore_end_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("session.json"));

        let session = Session::start("u1");
        session.persist(&storage).unwrap();

        let restored = Session::restore(&storage).unwrap().expect("session persisted");
        assert_eq!(restored.user_id(), "u1");

        restored.end(&storage).unwrap();
        assert!(Session::restore(&storage).unwrap().is_none());
    }

    #[test]
    fn other_keys_survive_session_end() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("session.json"));
        storage.set("theme", "dark").unwrap();

        Session::start("u1").persist(&storage).unwrap();
        Session::start("u1").end(&storage).unwrap();

        assert_eq!(storage.get("theme").unwrap().as_deref(), Some("dark"));
    }
}
