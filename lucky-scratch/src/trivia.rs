use crate::catalog::{base_questions, bonus_questions};
use crate::constants::MAX_QUIZ_ATTEMPTS;
use crate::error::GameError;
use crate::types::Question;
use rand::Rng;
use serde::{Deserialize, Serialize};

// Trivia gate in front of the scratch card. A wrong answer costs an attempt and redraws; running
// out still lets the visitor scratch, but the play is tagged as a failed quiz.

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum GateState {
    AwaitingAnswer,
    Correct,
    Exhausted,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    Retry { attempts_remaining: u8 },
    Exhausted,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TriviaGate {
    role: String,
    question: Option<Question>,
    attempts_remaining: u8,
    state: GateState,
}

impl TriviaGate {
    pub fn start<R: Rng + ?Sized>(role: &str, rng: &mut R) -> Self {
        Self::with_attempts(role, MAX_QUIZ_ATTEMPTS, rng)
    }

    /// Gate with a custom attempt budget. At least one attempt is always granted, so a budget of
    /// zero behaves like one.
    pub fn with_attempts<R: Rng + ?Sized>(role: &str, attempts: u8, rng: &mut R) -> Self {
        Self {
            role: role.to_string(),
            question: Some(draw_question(role, rng)),
            attempts_remaining: attempts.max(1),
            state: GateState::AwaitingAnswer,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn attempts_remaining(&self) -> u8 {
        self.attempts_remaining
    }

    /// The question waiting for an answer. `None` once the gate is finished.
    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            GateState::AwaitingAnswer => self.question.as_ref(),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state != GateState::AwaitingAnswer
    }

    pub fn quiz_failed(&self) -> bool {
        self.state == GateState::Exhausted
    }

    pub fn answer<R: Rng + ?Sized>(
        &mut self,
        chosen_index: usize,
        rng: &mut R,
    ) -> Result<AnswerOutcome, GameError> {
        let question = self.current_question().ok_or(GameError::GateClosed)?;
        if check_answer(question, chosen_index) {
            self.state = GateState::Correct;
            return Ok(AnswerOutcome::Correct);
        }
        self.attempts_remaining = self.attempts_remaining.saturating_sub(1);
        if self.attempts_remaining == 0 {
            self.state = GateState::Exhausted;
            return Ok(AnswerOutcome::Exhausted);
        }
        self.question = Some(draw_question(&self.role, rng));
        Ok(AnswerOutcome::Retry {
            attempts_remaining: self.attempts_remaining,
        })
    }
}

/// Uniform draw over the base pool, widened with the role's bonus pool when it has one.
pub fn draw_question<R: Rng + ?Sized>(role: &str, rng: &mut R) -> Question {
    let base = base_questions();
    let bonus = bonus_questions(role);
    let idx = rng.gen_range(0..base.len() + bonus.len());
    if idx < base.len() {
        base[idx].clone()
    } else {
        bonus[idx - base.len()].clone()
    }
}

pub fn check_answer(question: &Question, chosen_index: usize) -> bool {
    question.correct_index == chosen_index
}
