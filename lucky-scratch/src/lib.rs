//! Lucky Scratch: the core of a festive scratch-card game.
//!
//! A visitor enters a name and role, answers a trivia question, scratches a card to reveal a
//! weighted-random reward and is recorded so they cannot play twice. Every finished play also
//! lands on a shared leaderboard. Persistence prefers a remote keyed store and falls back to a
//! client-local one without surfacing the difference to the caller.

pub mod catalog;
pub mod command;
pub mod config;
pub mod constants;
pub mod error;
pub mod game;
pub mod leaderboard;
pub mod play_record;
pub mod reward;
pub mod rng;
pub mod scratch;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod trivia;
pub mod types;


pub use config::RemoteConfig;
pub use error::{GameError, StoreError};
pub use game::{Game, Screen};
pub use leaderboard::LeaderboardStore;
pub use play_record::{PlayOutcome, PlayRecordStore};
pub use reward::{format_amount, RewardTable, RewardTier};
pub use scratch::{DeviceRect, Point, ScratchSurface};
pub use session::{PendingTask, Session};
pub use snapshot::{GameSnapshot, ScreenKind};
pub use trivia::{AnswerOutcome, GateState, TriviaGate};
pub use types::*;
