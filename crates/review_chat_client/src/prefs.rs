//! Durable key-value preferences (`~/.review-chat/prefs.yaml`).
//!
//! Read and write failures are logged and otherwise ignored: a broken
//! preferences file must never stop the chat view.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// String map persisted as a flat YAML document.
#[derive(Debug, Clone)]
pub struct PrefStore {
    path: PathBuf,
}

/// Returns the default preferences path: `~/.review-chat/prefs.yaml`.
pub fn default_prefs_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".review-chat").join("prefs.yaml"))
}

impl PrefStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    pub fn set(&self, key: &str, value: &str) {
        let mut entries = self.read_all();
        entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.write_all(&entries) {
            tracing::debug!(path = %self.path.display(), error = %e, "failed to write preferences");
        }
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "preferences not readable");
                return BTreeMap::new();
            }
        };
        serde_yaml::from_str::<Option<BTreeMap<String, String>>>(&contents)
            .unwrap_or_else(|e| {
                tracing::debug!(path = %self.path.display(), error = %e, "preferences not parseable");
                None
            })
            .unwrap_or_default()
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_yaml::to_string(entries)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.path, contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_in_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = PrefStore::open(dir.path().join("nested").join("prefs.yaml"));
        assert_eq!(store.get("theme"), None);

        store.set("theme", "light");
        store.set("other", "x");
        assert_eq!(store.get("theme").as_deref(), Some("light"));
        assert_eq!(store.get("other").as_deref(), Some("x"));
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.yaml");
        std::fs::write(&path, "- not\n- a map\n").unwrap();

        let store = PrefStore::open(&path);
        assert_eq!(store.get("theme"), None);
        store.set("theme", "dark");
        assert_eq!(store.get("theme").as_deref(), Some("dark"));
    }

    #[test]
    fn unwritable_location_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();

        // Parent is a regular file, so the write fails silently.
        let store = PrefStore::open(blocker.join("prefs.yaml"));
        store.set("theme", "light");
        assert_eq!(store.get("theme"), None);
    }
}
