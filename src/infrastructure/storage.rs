// Persisted filter storage - named blobs in memory or on disk
use crate::application::filter_store::FilterStorage;
use anyhow::Context;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blobs: HashMap<String, String>,
}

impl FilterStorage for MemoryStorage {
    fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.blobs.get(key).cloned())
    }

    fn save(&mut self, key: &str, blob: &str) -> anyhow::Result<()> {
        self.blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per blob inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl FilterStorage for FileStorage {
    fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn save(&mut self, key: &str, blob: &str) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let path = self.path_for(key);
        std::fs::write(&path, blob).with_context(|| format!("Failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::filter_store::{FilterStore, NavigationPort, STORAGE_KEY};
    use crate::domain::filters::SelectionCategory;
    use crate::infrastructure::navigation::MemoryHistory;

    #[test]
    fn test_file_storage_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(storage.load(STORAGE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_filters_survive_reload() {
        let dir = tempfile::tempdir().unwrap();

        let mut first = FilterStore::new(MemoryHistory::new(""), FileStorage::new(dir.path()));
        first.hydrate();
        first.add_to_set(SelectionCategory::Brands, "Del Monte");
        first.add_to_set(SelectionCategory::Regions, "NCR");

        let mut second = FilterStore::new(MemoryHistory::new(""), FileStorage::new(dir.path()));
        second.hydrate();
        assert_eq!(second.state().selected_brands, vec!["Del Monte"]);
        assert_eq!(second.state().selected_regions, vec!["NCR"]);
        assert!(second.navigation().current_query().contains("brands=Del%20Monte"));
    }
}
