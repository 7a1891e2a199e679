use crate::catalog::emoji_for_role;
use crate::constants::LIVE_TOP_ENTRIES;
use crate::session::Session;
use crate::store::{PersistenceBackend, Subscription};
use crate::types::LeaderboardEntry;
use std::cmp::Ordering;
use tracing::{error, info};

/// Shared winners list. Appends are fire-and-forget; reads fall back to the local list.
pub struct LeaderboardStore<'a> {
    session: &'a Session,
}

impl<'a> LeaderboardStore<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    pub fn new_entry(&self, name: &str, role: &str, amount: u64, quiz_failed: bool) -> LeaderboardEntry {
        LeaderboardEntry {
            name: name.to_string(),
            role: role.to_string(),
            amount,
            role_emoji: emoji_for_role(role).to_string(),
            timestamp: self.session.now_ms(),
            quiz_failed,
            id: None,
        }
    }

    pub fn append(&self, entry: &LeaderboardEntry) {
        match self.session.backend().append_entry(entry) {
            Ok(()) => info!(name = %entry.name, amount = entry.amount, "leaderboard entry added"),
            Err(err) => error!(%err, "leaderboard entry lost"),
        }
    }

    pub fn entries(&self) -> Vec<LeaderboardEntry> {
        self.session.backend().load_entries().unwrap_or_else(|err| {
            error!(%err, "leaderboard unreadable from every store");
            Vec::new()
        })
    }

    pub fn top_entries(&self, limit: usize) -> Vec<LeaderboardEntry> {
        rank_entries(self.entries(), limit)
    }

    /// Pushes the live top entries to `on_change` on every remote change. `None` when no
    /// push-capable store is connected.
    pub fn subscribe(
        &self,
        mut on_change: impl FnMut(Vec<LeaderboardEntry>) + 'static,
    ) -> Option<Subscription> {
        self.session
            .backend()
            .watch_entries(Box::new(move |entries| {
                on_change(rank_live(entries, LIVE_TOP_ENTRIES))
            }))
    }

    /// Administrative reset of the whole list.
    pub fn clear(&self) {
        match self.session.backend().clear_entries() {
            Ok(()) => info!("leaderboard cleared"),
            Err(err) => error!(%err, "leaderboard could not be cleared"),
        }
    }
}

/// Failed quizzes last, then larger amounts, then newer plays.
pub fn compare_entries(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    a.quiz_failed
        .cmp(&b.quiz_failed)
        .then_with(|| b.amount.cmp(&a.amount))
        .then_with(|| b.timestamp.cmp(&a.timestamp))
}

pub fn rank_entries(mut entries: Vec<LeaderboardEntry>, limit: usize) -> Vec<LeaderboardEntry> {
    entries.sort_by(compare_entries);
    entries.truncate(limit);
    entries
}

// The live feed only orders by amount and recency.
fn rank_live(mut entries: Vec<LeaderboardEntry>, limit: usize) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| b.timestamp.cmp(&a.timestamp)));
    entries.truncate(limit);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::{MemoryLocalStore, MemoryRemoteStore, RemoteStore};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn entry(amount: u64, quiz_failed: bool, timestamp: u64) -> LeaderboardEntry {
        LeaderboardEntry {
            name: format!("p{}", timestamp),
            role: "Dev".into(),
            amount,
            role_emoji: "🧑‍💻".into(),
            timestamp,
            quiz_failed,
            id: None,
        }
    }

    #[test]
    fn failed_quizzes_rank_last() {
        let ranked = rank_entries(
            vec![entry(100, false, 1), entry(500, true, 2), entry(500, false, 3)],
            3,
        );
        let order: Vec<u64> = ranked.iter().map(|e| e.timestamp).collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[test]
    fn ties_prefer_newer_and_limit_applies() {
        let ranked = rank_entries(
            vec![entry(50, false, 1), entry(50, false, 9), entry(10, false, 5)],
            2,
        );
        let order: Vec<u64> = ranked.iter().map(|e| e.timestamp).collect();
        assert_eq!(order, vec![9, 1]);
    }

    #[test]
    fn local_only_session_has_no_live_feed() {
        let session = Session::local_only(Rc::new(MemoryLocalStore::new()));
        let board = LeaderboardStore::new(&session);
        assert!(board.subscribe(|_| {}).is_none());
        board.append(&board.new_entry("An", "Dev", 50_000, false));
        let top = board.top_entries(10);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].role_emoji, "🧑‍💻");
        board.clear();
        assert!(board.entries().is_empty());
    }

    #[test]
    fn live_feed_pushes_top_ten_until_dropped() {
        let remote = Rc::new(MemoryRemoteStore::new());
        let handle: Rc<dyn RemoteStore> = remote.clone();
        let session = Session::with_remote(Rc::new(MemoryLocalStore::new()), handle);
        let board = LeaderboardStore::new(&session);
        let pushes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&pushes);
        let subscription = board
            .subscribe(move |top| sink.borrow_mut().push(top))
            .unwrap();
        for i in 0..12u64 {
            board.append(&entry(i * 1_000, i % 2 == 0, i));
        }
        {
            let pushes = pushes.borrow();
            // Initial value plus one per append.
            assert_eq!(pushes.len(), 13);
            let last = pushes.last().unwrap();
            assert_eq!(last.len(), LIVE_TOP_ENTRIES);
            assert_eq!(last[0].amount, 11_000);
            assert_eq!(last[1].amount, 10_000);
        }
        drop(subscription);
        assert_eq!(remote.listener_count(), 0);
        board.append(&entry(1, false, 99));
        assert_eq!(pushes.borrow().len(), 13);
    }

    #[test]
    fn unreachable_remote_appends_locally() {
        let remote = Rc::new(MemoryRemoteStore::new());
        remote.set_failure(Some(StoreError::Unavailable("timeout".into())));
        let handle: Rc<dyn RemoteStore> = remote.clone();
        let session = Session::with_remote(Rc::new(MemoryLocalStore::new()), handle);
        let board = LeaderboardStore::new(&session);
        board.append(&entry(20_000, false, 1));
        remote.set_failure(None);
        assert!(board.entries().is_empty());
        remote.set_failure(Some(StoreError::Unavailable("timeout".into())));
        assert_eq!(board.entries().len(), 1);
    }
}
