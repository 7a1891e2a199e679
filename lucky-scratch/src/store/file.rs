use super::LocalStore;
use crate::error::StoreError;
use anyhow::Context;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Local store persisted as one JSON object file. Every write rewrites the file through a
/// temporary sibling and a rename, so a reader never sees a half-written file.
pub struct FileLocalStore {
    path: PathBuf,
    items: RefCell<BTreeMap<String, String>>,
}

impl FileLocalStore {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let items = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading local store {}", path.display()))?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing local store {}", path.display()))?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            items: RefCell::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, items: &BTreeMap<String, String>) -> anyhow::Result<()> {
        let encoded = serde_json::to_string_pretty(items)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, encoded).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }

    fn update(&self, key: &str, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), StoreError> {
        let mut next = self.items.borrow().clone();
        apply(&mut next);
        self.flush(&next).map_err(|err| StoreError::LocalWrite {
            key: key.to_string(),
            reason: format!("{:#}", err),
        })?;
        *self.items.borrow_mut() = next;
        Ok(())
    }
}

impl LocalStore for FileLocalStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(key, |items| {
            items.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.update(key, |items| {
            items.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lucky-scratch-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join("local.json")
    }

    #[test]
    fn values_survive_reopen() {
        let path = scratch_path("reopen");
        let _ = fs::remove_file(&path);
        {
            let store = FileLocalStore::open(&path).unwrap();
            store.set_item("visitor-id", "user_1_abc").unwrap();
            store.set_item("gone", "x").unwrap();
            store.remove_item("gone").unwrap();
        }
        let store = FileLocalStore::open(&path).unwrap();
        assert_eq!(store.get_item("visitor-id").as_deref(), Some("user_1_abc"));
        assert_eq!(store.get_item("gone"), None);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn corrupt_file_is_reported() {
        let path = scratch_path("corrupt");
        fs::write(&path, "{not json").unwrap();
        let err = FileLocalStore::open(&path).err().unwrap();
        assert!(format!("{:#}", err).contains("parsing local store"));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn unwritable_location_is_a_local_write_error() {
        let path = std::env::temp_dir()
            .join(format!("lucky-scratch-missing-{}", std::process::id()))
            .join("nested")
            .join("local.json");
        let store = FileLocalStore::open(&path).unwrap();
        let err = store.set_item("k", "v").unwrap_err();
        assert!(matches!(err, StoreError::LocalWrite { .. }));
        assert_eq!(store.get_item("k"), None);
    }
}
