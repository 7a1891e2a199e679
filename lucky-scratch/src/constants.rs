// Tuning, layout and storage-key constants. Kept in one place so the stores, the surface and
// the game flow share them without duplication.
pub const GAME_NAME: &str = "Lucky Scratch";

// Reward table, in VND. Order matters for the weighted walk.
pub const REWARD_TIERS: [(u64, f64); 6] = [
    (0, 5.0),
    (10_000, 10.0),
    (20_000, 15.0),
    (50_000, 20.0),
    (100_000, 15.0),
    (200_000, 5.0),
];
pub const JACKPOT_THRESHOLD: u64 = 200_000;

pub const MAX_QUIZ_ATTEMPTS: u8 = 5;
pub const BONUS_ROLE_TAG: &str = "dev";

pub const SURFACE_WIDTH: usize = 300;
pub const SURFACE_HEIGHT: usize = 200;
pub const BRUSH_RADIUS: f64 = 20.0;
pub const REVEAL_THRESHOLD: f64 = 0.6;

pub const MAX_LEADERBOARD_ENTRIES: usize = 100;
pub const LIVE_TOP_ENTRIES: usize = 10;
pub const DEFAULT_ROLE_EMOJI: &str = "🧧";

// Local keyed store.
pub const PLAY_RECORD_KEY: &str = "play-record";
pub const LEADERBOARD_KEY: &str = "play-leaderboard";
pub const VISITOR_ID_KEY: &str = "visitor-id";

// Remote keyed store.
pub const PLAYED_USERS_PATH: &str = "playedUsers";
pub const LEADERBOARD_PATH: &str = "leaderboard";

pub const API_KEY_VAR: &str = "LUCKY_SCRATCH_API_KEY";
pub const DATABASE_URL_VAR: &str = "LUCKY_SCRATCH_DATABASE_URL";
