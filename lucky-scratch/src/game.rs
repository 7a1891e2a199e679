use crate::catalog::greeting_for_role;
use crate::command::{ClientCommand, ServerReply};
use crate::constants::LIVE_TOP_ENTRIES;
use crate::error::GameError;
use crate::leaderboard::LeaderboardStore;
use crate::play_record::{PlayOutcome, PlayRecordStore};
use crate::reward::format_amount;
use crate::scratch::{DeviceRect, Point, ScratchSurface};
use crate::session::{PendingTask, Session};
use crate::snapshot::{GameSnapshot, QuestionView, ScreenKind};
use crate::trivia::{AnswerOutcome, TriviaGate};
use crate::types::{LeaderboardEntry, PayoutAccount, PlayRecord, VisitorId};
use tracing::{debug, info, warn};

// Screen flow for one visitor: landing, optional trivia, the scratch card, then the result.
// A visitor with a recorded play is sent straight to the already-played screen. The leaderboard
// shown alongside is a cached copy so pointer handling never waits on a store.

#[derive(Clone, Debug)]
pub enum Screen {
    Landing,
    Quiz {
        gate: TriviaGate,
    },
    Scratch {
        amount: u64,
        quiz_failed: bool,
        surface: ScratchSurface,
    },
    Result {
        record: PlayRecord,
        greeting: String,
        jackpot: bool,
    },
    AlreadyPlayed {
        record: PlayRecord,
    },
}

impl Screen {
    pub fn kind(&self) -> ScreenKind {
        match self {
            Screen::Landing => ScreenKind::Landing,
            Screen::Quiz { .. } => ScreenKind::Quiz,
            Screen::Scratch { .. } => ScreenKind::Scratch,
            Screen::Result { .. } => ScreenKind::Result,
            Screen::AlreadyPlayed { .. } => ScreenKind::AlreadyPlayed,
        }
    }
}

pub struct Game<'a> {
    session: &'a Session,
    visitor: VisitorId,
    quiz_enabled: bool,
    name: String,
    role: String,
    screen: Screen,
    leaderboard: Vec<LeaderboardEntry>,
}

impl<'a> Game<'a> {
    /// Opens the game. The fast local check decides whether to confirm a previous play before
    /// showing the landing screen.
    pub fn new(session: &'a Session) -> Self {
        let visitor = session.visitor_id();
        let mut game = Self {
            session,
            visitor,
            quiz_enabled: true,
            name: String::new(),
            role: String::new(),
            screen: Screen::Landing,
            leaderboard: Vec::new(),
        };
        let records = PlayRecordStore::new(session);
        if records.has_played_fast(&game.visitor) {
            if let Some(record) = records.get(&game.visitor).filter(|r| r.has_played) {
                game.show_already_played(record);
            }
        }
        game.refresh_leaderboard();
        game
    }

    /// Skips the trivia gate: the card is dealt as soon as the visitor starts.
    pub fn without_quiz(mut self) -> Self {
        self.quiz_enabled = false;
        self
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn visitor(&self) -> &VisitorId {
        &self.visitor
    }

    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    /// Reloads the cached top entries from the store.
    pub fn refresh_leaderboard(&mut self) {
        self.leaderboard = LeaderboardStore::new(self.session).top_entries(LIVE_TOP_ENTRIES);
    }

    /// Replaces the cached top entries with a list pushed by a live subscription.
    pub fn apply_leaderboard(&mut self, entries: Vec<LeaderboardEntry>) {
        self.leaderboard = entries;
        self.leaderboard.truncate(LIVE_TOP_ENTRIES);
    }

    pub fn start(&mut self, name: &str, role: &str) -> Result<ScreenKind, GameError> {
        self.expect_screen("start", ScreenKind::Landing)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::BlankName);
        }
        if let Some(record) = PlayRecordStore::new(self.session)
            .get(&self.visitor)
            .filter(|r| r.has_played)
        {
            info!(visitor = %self.visitor, "visitor already played");
            self.show_already_played(record);
            self.refresh_leaderboard();
            return Ok(self.screen.kind());
        }
        self.name = name.to_string();
        self.role = role.trim().to_string();
        if self.quiz_enabled {
            let gate = self.session.with_rng(|rng| TriviaGate::start(&self.role, rng));
            self.screen = Screen::Quiz { gate };
        } else {
            self.deal_card(false);
        }
        Ok(self.screen.kind())
    }

    pub fn answer(&mut self, index: usize) -> Result<AnswerOutcome, GameError> {
        self.expect_screen("answer", ScreenKind::Quiz)?;
        let session = self.session;
        let outcome = match &mut self.screen {
            Screen::Quiz { gate } => session.with_rng(|rng| gate.answer(index, rng))?,
            _ => return Err(GameError::GateClosed),
        };
        match outcome {
            AnswerOutcome::Correct => self.deal_card(false),
            AnswerOutcome::Exhausted => {
                warn!(visitor = %self.visitor, "trivia attempts exhausted");
                self.deal_card(true)
            }
            AnswerOutcome::Retry { attempts_remaining } => {
                debug!(attempts_remaining, "wrong answer, new question drawn")
            }
        }
        Ok(outcome)
    }

    /// Pointer pressed on the card, in device coordinates. Returns true when this reveals it.
    pub fn pointer_down(&mut self, rect: &DeviceRect, client: Point) -> Result<bool, GameError> {
        self.scratch_with("pointer_down", rect, client, ScratchSurface::begin)
    }

    pub fn pointer_move(&mut self, rect: &DeviceRect, client: Point) -> Result<bool, GameError> {
        self.scratch_with("pointer_move", rect, client, ScratchSurface::move_to)
    }

    pub fn pointer_up(&mut self) {
        if let Screen::Scratch { surface, .. } = &mut self.screen {
            surface.end();
        }
    }

    pub fn save_payout_account(&mut self, account: PayoutAccount) -> Result<PlayRecord, GameError> {
        match self.screen.kind() {
            ScreenKind::Result | ScreenKind::AlreadyPlayed => {}
            _ => return Err(self.wrong_screen("save_payout_account")),
        }
        let updated = PlayRecordStore::new(self.session).save_payout_account(&self.visitor, account)?;
        match &mut self.screen {
            Screen::Result { record, .. } | Screen::AlreadyPlayed { record } => *record = updated.clone(),
            _ => {}
        }
        Ok(updated)
    }

    pub fn handle(&mut self, command: ClientCommand) -> ServerReply {
        let result = match command {
            ClientCommand::GetSnapshot => {
                self.refresh_leaderboard();
                Ok(())
            }
            ClientCommand::Start { name, role } => self.start(&name, &role).map(|_| ()),
            ClientCommand::Answer { index } => self.answer(index).map(|_| ()),
            ClientCommand::PointerDown { rect, point } => self.pointer_down(&rect, point).map(|_| ()),
            ClientCommand::PointerMove { rect, point } => self.pointer_move(&rect, point).map(|_| ()),
            ClientCommand::PointerUp => {
                self.pointer_up();
                Ok(())
            }
            ClientCommand::SavePayoutAccount(account) => self.save_payout_account(account).map(|_| ()),
        };
        match result {
            Ok(()) => ServerReply::Snapshot(self.snapshot()),
            Err(err) => ServerReply::Error(err.to_string()),
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut snapshot = GameSnapshot {
            screen: self.screen.kind(),
            name: self.name.clone(),
            role: self.role.clone(),
            question: None,
            attempts_remaining: None,
            amount: None,
            formatted_amount: None,
            cleared_fraction: None,
            jackpot: false,
            quiz_failed: false,
            greeting: None,
            record: None,
            leaderboard: self.leaderboard.clone(),
        };
        match &self.screen {
            Screen::Landing => {}
            Screen::Quiz { gate } => {
                snapshot.question = gate.current_question().map(QuestionView::from);
                snapshot.attempts_remaining = Some(gate.attempts_remaining());
            }
            Screen::Scratch {
                amount,
                quiz_failed,
                surface,
            } => {
                snapshot.amount = Some(*amount);
                snapshot.formatted_amount = Some(format_amount(*amount));
                snapshot.cleared_fraction = Some(surface.cleared_fraction());
                snapshot.jackpot = self.session.rewards().is_jackpot(*amount);
                snapshot.quiz_failed = *quiz_failed;
            }
            Screen::Result {
                record,
                greeting,
                jackpot,
            } => {
                snapshot.amount = Some(record.amount_won);
                snapshot.formatted_amount = Some(format_amount(record.amount_won));
                snapshot.jackpot = *jackpot;
                snapshot.quiz_failed = record.quiz_failed;
                snapshot.greeting = Some(greeting.clone());
                snapshot.record = Some(record.clone());
            }
            Screen::AlreadyPlayed { record } => {
                snapshot.amount = Some(record.amount_won);
                snapshot.formatted_amount = Some(format_amount(record.amount_won));
                snapshot.quiz_failed = record.quiz_failed;
                snapshot.record = Some(record.clone());
            }
        }
        snapshot
    }

    fn deal_card(&mut self, quiz_failed: bool) {
        let amount = self.session.with_rng(|rng| self.session.rewards().draw(rng));
        debug!(amount, quiz_failed, "card dealt");
        self.screen = Screen::Scratch {
            amount,
            quiz_failed,
            surface: ScratchSurface::new(),
        };
    }

    fn scratch_with(
        &mut self,
        action: &'static str,
        rect: &DeviceRect,
        client: Point,
        stroke: fn(&mut ScratchSurface, Point) -> bool,
    ) -> Result<bool, GameError> {
        self.expect_screen(action, ScreenKind::Scratch)?;
        let revealed = match &mut self.screen {
            Screen::Scratch { surface, .. } => match rect.to_surface(client, surface) {
                Some(point) => stroke(surface, point),
                None => false,
            },
            _ => false,
        };
        if revealed {
            self.finish();
        }
        Ok(revealed)
    }

    /// Records the play, then queues the leaderboard append behind it.
    fn finish(&mut self) {
        let Screen::Scratch {
            amount, quiz_failed, ..
        } = self.screen
        else {
            return;
        };
        let outcome = PlayOutcome {
            amount_won: amount,
            name: self.name.clone(),
            role: self.role.clone(),
            quiz_failed,
        };
        let (record, first) = PlayRecordStore::new(self.session).finalize(&self.visitor, outcome);
        // A play finalized elsewhere already has its leaderboard entry.
        if first {
            let entry = LeaderboardStore::new(self.session).new_entry(
                &record.name,
                &record.role,
                record.amount_won,
                record.quiz_failed,
            );
            self.session.defer(PendingTask::AppendLeaderboard(entry));
        }
        let greeting = self
            .session
            .with_rng(|rng| greeting_for_role(&record.role, rng))
            .to_string();
        let jackpot = self.session.rewards().is_jackpot(record.amount_won);
        info!(visitor = %self.visitor, amount = record.amount_won, jackpot, "card revealed");
        self.screen = Screen::Result {
            record,
            greeting,
            jackpot,
        };
        self.refresh_leaderboard();
    }

    fn show_already_played(&mut self, record: PlayRecord) {
        self.name = record.name.clone();
        self.role = record.role.clone();
        self.screen = Screen::AlreadyPlayed { record };
    }

    fn expect_screen(&self, action: &'static str, expected: ScreenKind) -> Result<(), GameError> {
        if self.screen.kind() == expected {
            Ok(())
        } else {
            Err(self.wrong_screen(action))
        }
    }

    fn wrong_screen(&self, action: &'static str) -> GameError {
        GameError::WrongScreen {
            action,
            screen: self.screen.kind().label(),
        }
    }
}
