use crate::config::RemoteConfig;
use crate::constants::VISITOR_ID_KEY;
use crate::error::StoreError;
use crate::leaderboard::LeaderboardStore;
use crate::reward::RewardTable;
use crate::rng::{session_rng, visitor_token};
use crate::store::{FallbackBackend, LocalBackend, LocalStore, RemoteBackend, RemoteStore};
use crate::types::{LeaderboardEntry, VisitorId};
use rand_pcg::Pcg64Mcg;
use std::cell::{OnceCell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info};

pub type Connector = Box<dyn Fn(&RemoteConfig) -> Result<Rc<dyn RemoteStore>, StoreError>>;
pub type Clock = Box<dyn Fn() -> u64>;

/// Work scheduled to run after the current step, outside the visitor-facing flow.
#[derive(Clone, Debug, PartialEq)]
pub enum PendingTask {
    AppendLeaderboard(LeaderboardEntry),
}

/// Per-client context shared by every store operation. The visitor id and the remote handle are
/// created by the first caller that needs them and cached for the life of the session.
pub struct Session {
    local: Rc<dyn LocalStore>,
    config: RemoteConfig,
    connect: Connector,
    remote: OnceCell<Option<Rc<dyn RemoteStore>>>,
    visitor: OnceCell<VisitorId>,
    rng: RefCell<Pcg64Mcg>,
    clock: Clock,
    rewards: RewardTable,
    pending: RefCell<VecDeque<PendingTask>>,
}

fn system_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

impl Session {
    pub fn new(local: Rc<dyn LocalStore>, config: RemoteConfig, connect: Connector) -> Self {
        Self {
            local,
            config,
            connect,
            remote: OnceCell::new(),
            visitor: OnceCell::new(),
            rng: RefCell::new(session_rng(None)),
            clock: Box::new(system_now_ms),
            rewards: RewardTable::standard(),
            pending: RefCell::new(VecDeque::new()),
        }
    }

    pub fn local_only(local: Rc<dyn LocalStore>) -> Self {
        Self::new(local, RemoteConfig::default(), Box::new(|_| Err(StoreError::Unconfigured)))
    }

    /// Session over an already connected remote store; configuration checks are skipped.
    pub fn with_remote(local: Rc<dyn LocalStore>, remote: Rc<dyn RemoteStore>) -> Self {
        Self {
            remote: OnceCell::from(Some(remote)),
            ..Self::local_only(local)
        }
    }

    pub fn with_seed(self, seed: u64) -> Self {
        *self.rng.borrow_mut() = session_rng(Some(seed));
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> u64 + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_reward_table(mut self, rewards: RewardTable) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn now_ms(&self) -> u64 {
        (self.clock)()
    }

    pub fn rewards(&self) -> &RewardTable {
        &self.rewards
    }

    pub fn with_rng<T>(&self, f: impl FnOnce(&mut Pcg64Mcg) -> T) -> T {
        f(&mut self.rng.borrow_mut())
    }

    pub fn local(&self) -> &Rc<dyn LocalStore> {
        &self.local
    }

    pub fn remote(&self) -> Option<Rc<dyn RemoteStore>> {
        self.remote
            .get_or_init(|| {
                if !self.config.is_configured() {
                    info!("remote store not configured, using local store");
                    return None;
                }
                match (self.connect)(&self.config) {
                    Ok(handle) => {
                        debug!("remote store connected");
                        Some(handle)
                    }
                    Err(err) => {
                        error!(%err, "remote store connection failed, using local store");
                        None
                    }
                }
            })
            .clone()
    }

    pub fn backend(&self) -> FallbackBackend<RemoteBackend, LocalBackend> {
        FallbackBackend::new(RemoteBackend::new(self.remote()), self.local_backend())
    }

    pub fn local_backend(&self) -> LocalBackend {
        LocalBackend::new(Rc::clone(&self.local))
    }

    /// Durable per-client identity, read from the local store or minted on first use.
    pub fn visitor_id(&self) -> VisitorId {
        self.visitor
            .get_or_init(|| {
                if let Some(existing) = self.local.get_item(VISITOR_ID_KEY).filter(|v| !v.is_empty()) {
                    return VisitorId::new(existing);
                }
                let now = self.now_ms();
                let token = self.with_rng(|rng| visitor_token(rng, now));
                if let Err(err) = self.local.set_item(VISITOR_ID_KEY, &token) {
                    error!(%err, "could not persist visitor id; it will not survive a restart");
                }
                info!(visitor = %token, "created visitor id");
                VisitorId::new(token)
            })
            .clone()
    }

    pub fn defer(&self, task: PendingTask) {
        self.pending.borrow_mut().push_back(task);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Drains deferred work in submission order. Returns how many tasks ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(task) = next else {
                break;
            };
            match task {
                PendingTask::AppendLeaderboard(entry) => LeaderboardStore::new(self).append(&entry),
            }
            ran += 1;
        }
        ran
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryLocalStore, MemoryRemoteStore};
    use std::cell::Cell;

    #[test]
    fn visitor_id_is_created_once_and_persisted() {
        let local = Rc::new(MemoryLocalStore::new());
        let session = Session::local_only(local.clone()).with_seed(1).with_clock(|| 42);
        let first = session.visitor_id();
        assert!(first.as_str().starts_with("user_42_"));
        assert_eq!(session.visitor_id(), first);
        assert_eq!(local.get_item(VISITOR_ID_KEY).as_deref(), Some(first.as_str()));

        let again = Session::local_only(local).with_seed(2);
        assert_eq!(again.visitor_id(), first);
    }

    #[test]
    fn visitor_id_survives_unwritable_local_store() {
        let local = Rc::new(MemoryLocalStore::new());
        local.reject_writes(true);
        let session = Session::local_only(local).with_seed(3);
        let id = session.visitor_id();
        assert_eq!(session.visitor_id(), id);
    }

    #[test]
    fn remote_connects_lazily_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let session = Session::new(
            Rc::new(MemoryLocalStore::new()),
            RemoteConfig::new("key", "https://db.example"),
            Box::new(move |_| {
                counter.set(counter.get() + 1);
                let remote: Rc<dyn RemoteStore> = Rc::new(MemoryRemoteStore::new());
                Ok(remote)
            }),
        );
        assert_eq!(calls.get(), 0);
        assert!(session.remote().is_some());
        assert!(session.remote().is_some());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn unconfigured_or_failing_remote_is_absent() {
        let session = Session::local_only(Rc::new(MemoryLocalStore::new()));
        assert!(session.remote().is_none());

        let failing = Session::new(
            Rc::new(MemoryLocalStore::new()),
            RemoteConfig::new("key", "https://db.example"),
            Box::new(|_| Err(StoreError::Unavailable("dns".into()))),
        );
        assert!(failing.remote().is_none());
    }
}
