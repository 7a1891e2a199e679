use super::{ChangeCallback, LocalStore, RemoteStore};
use crate::error::StoreError;
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// In-process local store. Write failures can be switched on to mimic an exhausted quota.
#[derive(Default)]
pub struct MemoryLocalStore {
    items: RefCell<HashMap<String, String>>,
    reject_writes: Cell<bool>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.set(reject);
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl LocalStore for MemoryLocalStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.reject_writes.get() {
            return Err(StoreError::LocalWrite {
                key: key.to_string(),
                reason: "quota exceeded".into(),
            });
        }
        self.items.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

struct Listener {
    id: u64,
    path: String,
    callback: Rc<RefCell<ChangeCallback>>,
}

/// In-process remote store holding leaf values by path. Reads of an inner path assemble the
/// nested object from its descendants. A configured failure makes every call return it.
#[derive(Default)]
pub struct MemoryRemoteStore {
    leaves: RefCell<BTreeMap<String, Value>>,
    listeners: RefCell<Vec<Listener>>,
    failure: RefCell<Option<StoreError>>,
    next_key: Cell<u64>,
    next_listener: Cell<u64>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failure(&self, failure: Option<StoreError>) {
        *self.failure.borrow_mut() = failure;
    }

    /// Reads regardless of any configured failure.
    pub fn peek(&self, path: &str) -> Option<Value> {
        self.read(path)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn check(&self) -> Result<(), StoreError> {
        match self.failure.borrow().as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn read(&self, path: &str) -> Option<Value> {
        let path = normalize(path);
        let leaves = self.leaves.borrow();
        if let Some(value) = leaves.get(&path) {
            return Some(value.clone());
        }
        let prefix = format!("{}/", path);
        let mut root = Map::new();
        for (key, value) in leaves.range(prefix.clone()..) {
            let Some(rest) = key.strip_prefix(&prefix) else {
                break;
            };
            insert_nested(&mut root, rest.split('/').collect(), value.clone());
        }
        if root.is_empty() {
            None
        } else {
            Some(Value::Object(root))
        }
    }

    fn write(&self, path: &str, value: Option<Value>) {
        let path = normalize(path);
        {
            let mut leaves = self.leaves.borrow_mut();
            let prefix = format!("{}/", path);
            // Replacing a value also drops its descendants and any leaf above it.
            leaves.retain(|key, _| {
                key != &path && !key.starts_with(&prefix) && !path.starts_with(&format!("{}/", key))
            });
            match value {
                Some(Value::Null) | None => {}
                Some(value) => {
                    leaves.insert(path.clone(), value);
                }
            }
        }
        self.notify(&path);
    }

    fn notify(&self, changed: &str) {
        let targets: Vec<(String, Rc<RefCell<ChangeCallback>>)> = self
            .listeners
            .borrow()
            .iter()
            .filter(|l| overlaps(&l.path, changed))
            .map(|l| (l.path.clone(), Rc::clone(&l.callback)))
            .collect();
        for (path, callback) in targets {
            let value = self.read(&path);
            // A listener that writes back into the store is not re-entered.
            if let Ok(mut callback) = callback.try_borrow_mut() {
                (*callback)(value);
            }
        }
    }
}

impl RemoteStore for MemoryRemoteStore {
    fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        self.check()?;
        Ok(self.read(path))
    }

    fn set(&self, path: &str, value: Option<Value>) -> Result<(), StoreError> {
        self.check()?;
        self.write(path, value);
        Ok(())
    }

    fn push(&self, collection: &str, value: Value) -> Result<String, StoreError> {
        self.check()?;
        let seq = self.next_key.get() + 1;
        self.next_key.set(seq);
        let key = format!("-{:016x}", seq);
        self.write(&format!("{}/{}", normalize(collection), key), Some(value));
        Ok(key)
    }

    fn subscribe(&self, path: &str, on_change: ChangeCallback) -> Result<u64, StoreError> {
        self.check()?;
        let id = self.next_listener.get() + 1;
        self.next_listener.set(id);
        let path = normalize(path);
        let callback = Rc::new(RefCell::new(on_change));
        self.listeners.borrow_mut().push(Listener {
            id,
            path: path.clone(),
            callback: Rc::clone(&callback),
        });
        let current = self.read(&path);
        if let Ok(mut callback) = callback.try_borrow_mut() {
            (*callback)(current);
        }
        Ok(id)
    }

    fn unsubscribe(&self, id: u64) {
        self.listeners.borrow_mut().retain(|l| l.id != id);
    }
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

fn overlaps(a: &str, b: &str) -> bool {
    a == b || a.starts_with(&format!("{}/", b)) || b.starts_with(&format!("{}/", a))
}

fn insert_nested(map: &mut Map<String, Value>, segments: Vec<&str>, value: Value) {
    match segments.split_first() {
        None => {}
        Some((head, [])) => {
            map.insert(head.to_string(), value);
        }
        Some((head, rest)) => {
            let child = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(inner) = child {
                insert_nested(inner, rest.to_vec(), value);
            }
        }
    }
}
