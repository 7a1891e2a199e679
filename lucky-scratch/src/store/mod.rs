use crate::error::StoreError;
use crate::types::{LeaderboardEntry, PlayRecord, VisitorId};
use serde_json::Value;
use std::rc::Rc;

mod backend;
mod file;
mod memory;

pub use backend::{FallbackBackend, LocalBackend, RemoteBackend};
pub use file::FileLocalStore;
pub use memory::{MemoryLocalStore, MemoryRemoteStore};

// Keyed-store seams. The remote store's transport and auth live outside this crate; anything
// that can answer get/set/push/subscribe over JSON values can back the game.

pub type ChangeCallback = Box<dyn FnMut(Option<Value>)>;
pub type EntriesCallback = Box<dyn FnMut(Vec<LeaderboardEntry>)>;

/// Shared, multi-writer keyed store addressed by slash-separated paths.
pub trait RemoteStore {
    fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;
    /// Atomically replaces the value at `path`; `None` deletes it.
    fn set(&self, path: &str, value: Option<Value>) -> Result<(), StoreError>;
    /// Stores `value` under a fresh, chronologically ordered child key of `collection`.
    fn push(&self, collection: &str, value: Value) -> Result<String, StoreError>;
    fn subscribe(&self, path: &str, on_change: ChangeCallback) -> Result<u64, StoreError>;
    fn unsubscribe(&self, id: u64);
}

/// Client-local string store. Reads never fail; a missing or unreadable key is `None`.
pub trait LocalStore {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}

/// Domain-level persistence used by the play-record and leaderboard stores.
pub trait PersistenceBackend {
    fn name(&self) -> &'static str;
    fn load_record(&self, visitor: &VisitorId) -> Result<Option<PlayRecord>, StoreError>;
    fn store_record(&self, visitor: &VisitorId, record: &PlayRecord) -> Result<(), StoreError>;
    fn append_entry(&self, entry: &LeaderboardEntry) -> Result<(), StoreError>;
    fn load_entries(&self) -> Result<Vec<LeaderboardEntry>, StoreError>;
    fn clear_entries(&self) -> Result<(), StoreError>;

    /// Live updates of the full entry list. Only push-capable backends return a handle.
    fn watch_entries(&self, _on_change: EntriesCallback) -> Option<Subscription> {
        None
    }
}

/// Live subscription on a remote store. Dropping it unsubscribes.
pub struct Subscription {
    remote: Rc<dyn RemoteStore>,
    id: Option<u64>,
}

impl Subscription {
    pub fn new(remote: Rc<dyn RemoteStore>, id: u64) -> Self {
        Self {
            remote,
            id: Some(id),
        }
    }

    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(id) = self.id.take() {
            self.remote.unsubscribe(id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
