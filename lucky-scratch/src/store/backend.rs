use super::{EntriesCallback, LocalStore, PersistenceBackend, RemoteStore, Subscription};
use crate::constants::{LEADERBOARD_KEY, LEADERBOARD_PATH, MAX_LEADERBOARD_ENTRIES, PLAYED_USERS_PATH, PLAY_RECORD_KEY};
use crate::error::StoreError;
use crate::types::{LeaderboardEntry, PlayRecord, VisitorId};
use serde_json::Value;
use std::rc::Rc;
use tracing::{debug, error, warn};

/// Browser-style local persistence: one record key and one newest-first entry list.
pub struct LocalBackend {
    store: Rc<dyn LocalStore>,
}

impl LocalBackend {
    pub fn new(store: Rc<dyn LocalStore>) -> Self {
        Self { store }
    }

    fn write_json<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(value).map_err(|err| StoreError::LocalWrite {
            key: key.to_string(),
            reason: err.to_string(),
        })?;
        self.store.set_item(key, &encoded)
    }
}

impl PersistenceBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    // The local store is already scoped to one client, so the visitor id is not part of the key.
    fn load_record(&self, _visitor: &VisitorId) -> Result<Option<PlayRecord>, StoreError> {
        let Some(raw) = self.store.get_item(PLAY_RECORD_KEY) else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                warn!(key = PLAY_RECORD_KEY, %err, "ignoring unreadable local play record");
                Ok(None)
            }
        }
    }

    fn store_record(&self, _visitor: &VisitorId, record: &PlayRecord) -> Result<(), StoreError> {
        self.write_json(PLAY_RECORD_KEY, record)
    }

    fn append_entry(&self, entry: &LeaderboardEntry) -> Result<(), StoreError> {
        let mut entries = self.load_entries()?;
        entries.insert(0, entry.clone());
        entries.truncate(MAX_LEADERBOARD_ENTRIES);
        self.write_json(LEADERBOARD_KEY, &entries)
    }

    fn load_entries(&self) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let Some(raw) = self.store.get_item(LEADERBOARD_KEY) else {
            return Ok(Vec::new());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(key = LEADERBOARD_KEY, %err, "ignoring unreadable local leaderboard");
            Vec::new()
        }))
    }

    fn clear_entries(&self) -> Result<(), StoreError> {
        self.store.remove_item(LEADERBOARD_KEY)
    }
}

/// Shared remote persistence. An absent handle means the remote is not configured and every
/// call fails with `StoreError::Unconfigured`.
pub struct RemoteBackend {
    remote: Option<Rc<dyn RemoteStore>>,
}

impl RemoteBackend {
    pub fn new(remote: Option<Rc<dyn RemoteStore>>) -> Self {
        Self { remote }
    }

    fn handle(&self) -> Result<&Rc<dyn RemoteStore>, StoreError> {
        self.remote.as_ref().ok_or(StoreError::Unconfigured)
    }

    /// Keeps only the most recent entries by timestamp. Best effort: the insert that triggered
    /// it has already landed, so failures are logged and dropped.
    fn prune(&self, remote: &Rc<dyn RemoteStore>) {
        let entries = match remote.get(LEADERBOARD_PATH) {
            Ok(value) => decode_entries(value),
            Err(err) => {
                warn!(%err, "skipping leaderboard prune");
                return;
            }
        };
        if entries.len() <= MAX_LEADERBOARD_ENTRIES {
            return;
        }
        let mut by_recency = entries;
        by_recency.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        for stale in by_recency.iter().skip(MAX_LEADERBOARD_ENTRIES) {
            let Some(id) = stale.id.as_deref() else {
                continue;
            };
            if let Err(err) = remote.set(&format!("{}/{}", LEADERBOARD_PATH, id), None) {
                warn!(%err, id, "failed to prune leaderboard entry");
                return;
            }
        }
        debug!(removed = by_recency.len() - MAX_LEADERBOARD_ENTRIES, "pruned leaderboard");
    }
}

fn record_path(visitor: &VisitorId) -> String {
    format!("{}/{}", PLAYED_USERS_PATH, visitor)
}

fn malformed(path: &str, err: serde_json::Error) -> StoreError {
    StoreError::Malformed {
        path: path.to_string(),
        reason: err.to_string(),
    }
}

/// Turns a remote collection object into entries carrying their push keys.
pub(crate) fn decode_entries(value: Option<Value>) -> Vec<LeaderboardEntry> {
    let Some(Value::Object(children)) = value else {
        return Vec::new();
    };
    children
        .into_iter()
        .filter_map(|(id, raw)| match serde_json::from_value::<LeaderboardEntry>(raw) {
            Ok(mut entry) => {
                entry.id = Some(id);
                Some(entry)
            }
            Err(err) => {
                warn!(%id, %err, "skipping malformed leaderboard entry");
                None
            }
        })
        .collect()
}

impl PersistenceBackend for RemoteBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn load_record(&self, visitor: &VisitorId) -> Result<Option<PlayRecord>, StoreError> {
        let path = record_path(visitor);
        match self.handle()?.get(&path)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|err| malformed(&path, err)),
            None => Ok(None),
        }
    }

    fn store_record(&self, visitor: &VisitorId, record: &PlayRecord) -> Result<(), StoreError> {
        let path = record_path(visitor);
        let value = serde_json::to_value(record).map_err(|err| malformed(&path, err))?;
        self.handle()?.set(&path, Some(value))
    }

    fn append_entry(&self, entry: &LeaderboardEntry) -> Result<(), StoreError> {
        let remote = self.handle()?;
        let value = serde_json::to_value(entry).map_err(|err| malformed(LEADERBOARD_PATH, err))?;
        let key = remote.push(LEADERBOARD_PATH, value)?;
        debug!(%key, amount = entry.amount, "leaderboard entry stored remotely");
        self.prune(remote);
        Ok(())
    }

    fn load_entries(&self) -> Result<Vec<LeaderboardEntry>, StoreError> {
        Ok(decode_entries(self.handle()?.get(LEADERBOARD_PATH)?))
    }

    fn clear_entries(&self) -> Result<(), StoreError> {
        self.handle()?.set(LEADERBOARD_PATH, None)
    }

    fn watch_entries(&self, mut on_change: EntriesCallback) -> Option<Subscription> {
        let remote = self.remote.as_ref()?;
        match remote.subscribe(
            LEADERBOARD_PATH,
            Box::new(move |value| on_change(decode_entries(value))),
        ) {
            Ok(id) => Some(Subscription::new(Rc::clone(remote), id)),
            Err(err) => {
                error!(%err, "failed to subscribe to leaderboard");
                None
            }
        }
    }
}

/// Tries `primary`, and on any failure logs the demotion and answers from `secondary`.
pub struct FallbackBackend<P, S> {
    primary: P,
    secondary: S,
}

impl<P: PersistenceBackend, S: PersistenceBackend> FallbackBackend<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }

    fn demote<T>(
        &self,
        op: &'static str,
        primary: Result<T, StoreError>,
        secondary: impl FnOnce(&S) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        match primary {
            Ok(value) => Ok(value),
            Err(err) => {
                log_demotion(op, self.primary.name(), self.secondary.name(), &err);
                secondary(&self.secondary)
            }
        }
    }
}

fn log_demotion(op: &'static str, from: &'static str, to: &'static str, err: &StoreError) {
    match err {
        StoreError::Unconfigured => debug!(op, from, to, "backend not configured, falling back"),
        StoreError::PermissionDenied { path } => warn!(
            op,
            from,
            to,
            %path,
            "permission denied; check the store access rules, falling back"
        ),
        other => warn!(op, from, to, err = %other, "backend failed, falling back"),
    }
}

impl<P: PersistenceBackend, S: PersistenceBackend> PersistenceBackend for FallbackBackend<P, S> {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn load_record(&self, visitor: &VisitorId) -> Result<Option<PlayRecord>, StoreError> {
        self.demote("load_record", self.primary.load_record(visitor), |s| s.load_record(visitor))
    }

    fn store_record(&self, visitor: &VisitorId, record: &PlayRecord) -> Result<(), StoreError> {
        self.demote("store_record", self.primary.store_record(visitor, record), |s| {
            s.store_record(visitor, record)
        })
    }

    fn append_entry(&self, entry: &LeaderboardEntry) -> Result<(), StoreError> {
        self.demote("append_entry", self.primary.append_entry(entry), |s| s.append_entry(entry))
    }

    fn load_entries(&self) -> Result<Vec<LeaderboardEntry>, StoreError> {
        self.demote("load_entries", self.primary.load_entries(), |s| s.load_entries())
    }

    fn clear_entries(&self) -> Result<(), StoreError> {
        self.demote("clear_entries", self.primary.clear_entries(), |s| s.clear_entries())
    }

    fn watch_entries(&self, on_change: EntriesCallback) -> Option<Subscription> {
        self.primary.watch_entries(on_change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryLocalStore, MemoryRemoteStore};
    use serde_json::json;

    fn entry(name: &str, amount: u64, timestamp: u64) -> LeaderboardEntry {
        LeaderboardEntry {
            name: name.into(),
            role: "dev".into(),
            amount,
            role_emoji: "🧑‍💻".into(),
            timestamp,
            quiz_failed: false,
            id: None,
        }
    }

    #[test]
    fn local_list_is_newest_first_and_bounded() {
        let backend = LocalBackend::new(Rc::new(MemoryLocalStore::new()));
        for ts in 0..(MAX_LEADERBOARD_ENTRIES as u64 + 5) {
            backend.append_entry(&entry("p", 10, ts)).unwrap();
        }
        let entries = backend.load_entries().unwrap();
        assert_eq!(entries.len(), MAX_LEADERBOARD_ENTRIES);
        assert_eq!(entries[0].timestamp, MAX_LEADERBOARD_ENTRIES as u64 + 4);
        assert_eq!(entries.last().unwrap().timestamp, 5);
    }

    #[test]
    fn remote_prunes_to_most_recent() {
        let remote = Rc::new(MemoryRemoteStore::new());
        // Oldest entry is pushed last so pruning has to look at timestamps, not keys.
        for ts in 1..=(MAX_LEADERBOARD_ENTRIES as u64) {
            remote
                .push(LEADERBOARD_PATH, serde_json::to_value(entry("p", 1, ts + 10)).unwrap())
                .unwrap();
        }
        let handle: Rc<dyn RemoteStore> = remote.clone();
        let backend = RemoteBackend::new(Some(handle));
        backend.append_entry(&entry("old", 1, 1)).unwrap();
        let entries = backend.load_entries().unwrap();
        assert_eq!(entries.len(), MAX_LEADERBOARD_ENTRIES);
        assert!(entries.iter().all(|e| e.name != "old"));
        assert!(entries.iter().all(|e| e.id.is_some()));
    }

    #[test]
    fn unconfigured_remote_reports_itself() {
        let backend = RemoteBackend::new(None);
        let visitor = VisitorId::new("v");
        assert_eq!(backend.load_record(&visitor), Err(StoreError::Unconfigured));
        assert!(backend.watch_entries(Box::new(|_| {})).is_none());
    }

    #[test]
    fn malformed_remote_entries_are_skipped() {
        let remote = Rc::new(MemoryRemoteStore::new());
        remote.set("leaderboard/a", Some(json!({"bogus": true}))).unwrap();
        remote
            .set("leaderboard/b", Some(serde_json::to_value(entry("ok", 5, 5)).unwrap()))
            .unwrap();
        let handle: Rc<dyn RemoteStore> = remote;
        let entries = RemoteBackend::new(Some(handle)).load_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id.as_deref(), Some("b"));
    }

    #[test]
    fn fallback_answers_from_secondary_on_failure() {
        let remote = Rc::new(MemoryRemoteStore::new());
        remote.set_failure(Some(StoreError::Unavailable("offline".into())));
        let local = Rc::new(MemoryLocalStore::new());
        let handle: Rc<dyn RemoteStore> = remote.clone();
        let backend = FallbackBackend::new(
            RemoteBackend::new(Some(handle)),
            LocalBackend::new(local.clone()),
        );
        backend.append_entry(&entry("an", 50, 1)).unwrap();
        assert_eq!(backend.load_entries().unwrap().len(), 1);
        assert!(local.get_item(LEADERBOARD_KEY).is_some());
        assert_eq!(remote.peek(LEADERBOARD_PATH), None);
    }
}
