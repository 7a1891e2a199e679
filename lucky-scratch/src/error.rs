use thiserror::Error;

/// Failures raised by a keyed store. Everything here except a local write failure is
/// recoverable by demoting to the local fallback.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("remote store is not configured")]
    Unconfigured,
    #[error("remote store unavailable: {0}")]
    Unavailable(String),
    #[error("permission denied at {path}")]
    PermissionDenied { path: String },
    #[error("local store write failed for {key}: {reason}")]
    LocalWrite { key: String, reason: String },
    #[error("malformed value at {path}: {reason}")]
    Malformed { path: String, reason: String },
}

impl StoreError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, StoreError::PermissionDenied { .. })
    }
}

/// Failures surfaced to the caller of a game or store operation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("no prior play recorded for this visitor")]
    NoPriorPlay,
    #[error("payout has already been sent")]
    PayoutAlreadySent,
    #[error("invalid payout account: {0}")]
    InvalidAccount(String),
    #[error("invalid reward table: {0}")]
    InvalidRewardTable(String),
    #[error("trivia gate already finished")]
    GateClosed,
    #[error("{action} is not allowed on the {screen} screen")]
    WrongScreen {
        action: &'static str,
        screen: &'static str,
    },
    #[error("name must not be blank")]
    BlankName,
}
