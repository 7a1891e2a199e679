use crate::error::GameError;
use serde::{Deserialize, Serialize};
use std::fmt;

// Shared data types persisted by the stores and exchanged with the front end. Field names
// follow the stored JSON layout (camelCase); older stored names are accepted as aliases.

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct VisitorId(String);

impl VisitorId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VisitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum PayoutKind {
    #[serde(rename = "mobile-wallet", alias = "momo")]
    MobileWallet,
    #[serde(rename = "bank")]
    Bank,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PayoutAccount {
    #[serde(alias = "type")]
    pub kind: PayoutKind,
    pub account_number: String,
    pub account_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
}

impl PayoutAccount {
    pub fn mobile_wallet(account_number: &str, account_name: &str) -> Result<Self, GameError> {
        Self {
            kind: PayoutKind::MobileWallet,
            account_number: account_number.to_string(),
            account_name: account_name.to_string(),
            bank_name: None,
        }
        .normalized()
    }

    pub fn bank(account_number: &str, account_name: &str, bank_name: &str) -> Result<Self, GameError> {
        Self {
            kind: PayoutKind::Bank,
            account_number: account_number.to_string(),
            account_name: account_name.to_string(),
            bank_name: Some(bank_name.to_string()),
        }
        .normalized()
    }

    /// Trims every field and checks the account is usable for a transfer. Wallet accounts are
    /// phone numbers: 10 or 11 digits once whitespace is removed.
    pub fn normalized(self) -> Result<Self, GameError> {
        let account_number = self.account_number.trim().to_string();
        let account_name = self.account_name.trim().to_string();
        if account_number.is_empty() {
            return Err(GameError::InvalidAccount("account number is blank".into()));
        }
        if account_name.is_empty() {
            return Err(GameError::InvalidAccount("account name is blank".into()));
        }
        let bank_name = match self.kind {
            PayoutKind::Bank => {
                let bank = self
                    .bank_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|b| !b.is_empty())
                    .ok_or_else(|| GameError::InvalidAccount("bank name is blank".into()))?;
                Some(bank.to_string())
            }
            PayoutKind::MobileWallet => {
                let digits: String = account_number.chars().filter(|c| !c.is_whitespace()).collect();
                let valid = (10..=11).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit());
                if !valid {
                    return Err(GameError::InvalidAccount(
                        "wallet number must be 10-11 digits".into(),
                    ));
                }
                None
            }
        };
        Ok(Self {
            kind: self.kind,
            account_number,
            account_name,
            bank_name,
        })
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayRecord {
    pub has_played: bool,
    pub amount_won: u64,
    pub name: String,
    pub role: String,
    pub timestamp: u64,
    pub quiz_failed: bool,
    #[serde(skip_serializing_if = "Option::is_none", alias = "bankAccount")]
    pub payout_account: Option<PayoutAccount>,
    #[serde(alias = "paymentSent")]
    pub payout_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none", alias = "paymentSentAt")]
    pub payout_sent_at: Option<u64>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub name: String,
    pub role: String,
    pub amount: u64,
    #[serde(default, alias = "emoji")]
    pub role_emoji: String,
    pub timestamp: u64,
    #[serde(default)]
    pub quiz_failed: bool,
    // Push key assigned by the remote store; never part of the stored body.
    #[serde(default, skip_serializing)]
    pub id: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}
