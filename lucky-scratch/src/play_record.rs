use crate::error::GameError;
use crate::session::Session;
use crate::store::PersistenceBackend;
use crate::types::{PayoutAccount, PlayRecord, VisitorId};
use tracing::{error, info};

/// What a finished play produced, before it is merged into the stored record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayOutcome {
    pub amount_won: u64,
    pub name: String,
    pub role: String,
    pub quiz_failed: bool,
}

impl PlayOutcome {
    fn from_record(record: &PlayRecord) -> Self {
        Self {
            amount_won: record.amount_won,
            name: record.name.clone(),
            role: record.role.clone(),
            quiz_failed: record.quiz_failed,
        }
    }
}

/// Per-visitor play status. Reads and writes prefer the remote store and silently fall back to
/// the local one; only payout preconditions are reported to the caller.
pub struct PlayRecordStore<'a> {
    session: &'a Session,
}

impl<'a> PlayRecordStore<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    pub fn get(&self, visitor: &VisitorId) -> Option<PlayRecord> {
        match self.session.backend().load_record(visitor) {
            Ok(record) => record,
            Err(err) => {
                error!(%visitor, %err, "play record unreadable from every store");
                None
            }
        }
    }

    /// Local-only check for the first render. Can miss a play stored only remotely, never
    /// reports one that did not happen on this client.
    pub fn has_played_fast(&self, visitor: &VisitorId) -> bool {
        self.session
            .local_backend()
            .load_record(visitor)
            .ok()
            .flatten()
            .map_or(false, |record| record.has_played)
    }

    /// Finalizes the visitor's play. An earlier finalized outcome always wins over `outcome`;
    /// payout details already stored are kept unless a new account is given before payout.
    pub fn save(
        &self,
        visitor: &VisitorId,
        outcome: PlayOutcome,
        payout_account: Option<PayoutAccount>,
    ) -> PlayRecord {
        let existing = self.get(visitor);
        self.write_merged(visitor, existing.as_ref(), outcome, payout_account)
    }

    /// Saves a freshly revealed play. The flag is true only when this call finalized the play;
    /// false means an earlier finalized outcome was already stored and has been kept.
    pub fn finalize(&self, visitor: &VisitorId, outcome: PlayOutcome) -> (PlayRecord, bool) {
        let existing = self.get(visitor);
        let first = !existing.as_ref().map_or(false, |r| r.has_played);
        if !first {
            info!(%visitor, "play already finalized, keeping the stored outcome");
        }
        (self.write_merged(visitor, existing.as_ref(), outcome, None), first)
    }

    fn write_merged(
        &self,
        visitor: &VisitorId,
        existing: Option<&PlayRecord>,
        outcome: PlayOutcome,
        payout_account: Option<PayoutAccount>,
    ) -> PlayRecord {
        let record = merge_record(existing, outcome, payout_account, self.session.now_ms());
        match self.session.backend().store_record(visitor, &record) {
            Ok(()) => info!(%visitor, amount = record.amount_won, quiz_failed = record.quiz_failed, "play record saved"),
            Err(err) => error!(%visitor, %err, "play record could not be saved anywhere"),
        }
        record
    }

    pub fn save_payout_account(
        &self,
        visitor: &VisitorId,
        account: PayoutAccount,
    ) -> Result<PlayRecord, GameError> {
        let account = account.normalized()?;
        let existing = self.get(visitor).ok_or(GameError::NoPriorPlay)?;
        if existing.payout_sent {
            return Err(GameError::PayoutAlreadySent);
        }
        Ok(self.save(visitor, PlayOutcome::from_record(&existing), Some(account)))
    }

    /// Administrative: flags the payout as sent. Repeat calls keep the first timestamp.
    pub fn mark_payout_sent(&self, visitor: &VisitorId) -> Result<PlayRecord, GameError> {
        let mut record = self.get(visitor).ok_or(GameError::NoPriorPlay)?;
        if !record.payout_sent {
            record.payout_sent = true;
            record.payout_sent_at = Some(self.session.now_ms());
            if let Err(err) = self.session.backend().store_record(visitor, &record) {
                error!(%visitor, %err, "payout flag could not be saved anywhere");
            }
        }
        Ok(record)
    }
}

fn merge_record(
    existing: Option<&PlayRecord>,
    outcome: PlayOutcome,
    payout_account: Option<PayoutAccount>,
    now: u64,
) -> PlayRecord {
    let outcome = match existing.filter(|r| r.has_played) {
        Some(previous) => PlayOutcome::from_record(previous),
        None => outcome,
    };
    let previous_account = existing.and_then(|r| r.payout_account.clone());
    let payout_sent = existing.map_or(false, |r| r.payout_sent);
    let payout_account = if payout_sent {
        previous_account
    } else {
        payout_account.or(previous_account)
    };
    PlayRecord {
        has_played: true,
        amount_won: outcome.amount_won,
        name: outcome.name,
        role: outcome.role,
        timestamp: now,
        quiz_failed: outcome.quiz_failed,
        payout_account,
        payout_sent,
        payout_sent_at: existing.and_then(|r| r.payout_sent_at),
    }
}
