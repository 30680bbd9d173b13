use super::KeyValueStore;
use crate::error::{RepertoireError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const STORE_FILENAME: &str = "store.json";

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store_path(&self) -> PathBuf {
        self.root.join(STORE_FILENAME)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(RepertoireError::Io)?;
        }
        Ok(())
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        let path = self.store_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(path).map_err(RepertoireError::Io)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        let entries = serde_json::from_str(&content).map_err(RepertoireError::Serialization)?;
        Ok(entries)
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        self.ensure_dir()?;
        let content =
            serde_json::to_string_pretty(entries).map_err(RepertoireError::Serialization)?;
        fs::write(self.store_path(), content).map_err(RepertoireError::Io)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value);
        self.save(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        let path = self.store_path();
        if path.exists() {
            fs::remove_file(path).map_err(RepertoireError::Io)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.load()?.into_keys().collect())
    }

    fn total_size(&self) -> Result<usize> {
        Ok(self
            .load()?
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_reads_as_empty() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path().join("nested"));
        assert_eq!(store.get("anything").unwrap(), None);
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn set_get_remove_roundtrip() {
        let temp = TempDir::new().unwrap();
        let mut store = FileStore::new(temp.path().to_path_buf());

        store.set("boardTheme", "green".into()).unwrap();
        store.set("darkMode", "true".into()).unwrap();
        assert_eq!(store.get("boardTheme").unwrap().as_deref(), Some("green"));

        // A second handle sees the same data
        let other = FileStore::new(temp.path().to_path_buf());
        assert_eq!(other.keys().unwrap(), vec!["boardTheme", "darkMode"]);

        store.remove("boardTheme").unwrap();
        assert_eq!(store.get("boardTheme").unwrap(), None);
        assert_eq!(store.total_size().unwrap(), "darkMode".len() + "true".len());
    }

    #[test]
    fn clear_removes_everything() {
        let temp = TempDir::new().unwrap();
        let mut store = FileStore::new(temp.path().to_path_buf());
        store.set("a", "1".into()).unwrap();
        store.clear().unwrap();
        assert!(store.keys().unwrap().is_empty());
        assert!(!temp.path().join(STORE_FILENAME).exists());
    }
}
