use crate::types::{LeaderboardEntry, PlayRecord, Question};
use serde::{Deserialize, Serialize};

// Lightweight container for UI sync. Carries the current screen, what it needs to render and
// the current top of the leaderboard.

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum ScreenKind {
    Landing,
    Quiz,
    Scratch,
    Result,
    AlreadyPlayed,
}

impl ScreenKind {
    pub fn label(&self) -> &'static str {
        match self {
            ScreenKind::Landing => "landing",
            ScreenKind::Quiz => "quiz",
            ScreenKind::Scratch => "scratch",
            ScreenKind::Result => "result",
            ScreenKind::AlreadyPlayed => "already played",
        }
    }
}

/// A question as shown to the visitor, without its answer.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct QuestionView {
    pub prompt: String,
    pub options: Vec<String>,
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        Self {
            prompt: question.prompt.clone(),
            options: question.options.clone(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub screen: ScreenKind,
    pub name: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts_remaining: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleared_fraction: Option<f64>,
    pub jackpot: bool,
    pub quiz_failed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<PlayRecord>,
    pub leaderboard: Vec<LeaderboardEntry>,
}
