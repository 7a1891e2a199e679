use crate::constants::{JACKPOT_THRESHOLD, REWARD_TIERS};
use crate::error::GameError;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct RewardTier {
    pub amount: u64,
    pub weight: f64,
}

/// Weighted reward table. Fixed for the life of a session.
#[derive(Clone, Debug, PartialEq)]
pub struct RewardTable {
    tiers: Vec<RewardTier>,
    jackpot_threshold: u64,
}

impl RewardTable {
    pub fn new(tiers: Vec<RewardTier>, jackpot_threshold: u64) -> Result<Self, GameError> {
        if tiers.is_empty() {
            return Err(GameError::InvalidRewardTable("no tiers".into()));
        }
        if let Some(bad) = tiers.iter().find(|t| !t.weight.is_finite() || t.weight <= 0.0) {
            return Err(GameError::InvalidRewardTable(format!(
                "tier {} has weight {}",
                bad.amount, bad.weight
            )));
        }
        Ok(Self {
            tiers,
            jackpot_threshold,
        })
    }

    pub fn standard() -> Self {
        Self {
            tiers: REWARD_TIERS
                .iter()
                .map(|&(amount, weight)| RewardTier { amount, weight })
                .collect(),
            jackpot_threshold: JACKPOT_THRESHOLD,
        }
    }

    pub fn tiers(&self) -> &[RewardTier] {
        &self.tiers
    }

    pub fn total_weight(&self) -> f64 {
        self.tiers.iter().map(|t| t.weight).sum()
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        let mut remainder = rng.gen::<f64>() * self.total_weight();
        for tier in &self.tiers {
            remainder -= tier.weight;
            if remainder <= 0.0 {
                return tier.amount;
            }
        }
        // Only reachable through floating-point drift at the top of the range.
        self.tiers[0].amount
    }

    pub fn is_jackpot(&self, amount: u64) -> bool {
        amount >= self.jackpot_threshold
    }
}

impl Default for RewardTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Renders an amount the way the card prints it: dot-grouped thousands and the currency.
pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("{} VNĐ", grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::pcg_from_seed;
    use std::collections::HashMap;

    #[test]
    fn draw_frequencies_follow_weights() {
        let table = RewardTable::standard();
        let mut rng = pcg_from_seed(2024);
        let trials = 20_000;
        let mut counts: HashMap<u64, u32> = HashMap::new();
        for _ in 0..trials {
            *counts.entry(table.draw(&mut rng)).or_default() += 1;
        }
        let total = table.total_weight();
        for tier in table.tiers() {
            let expected = tier.weight / total;
            let observed = f64::from(counts.get(&tier.amount).copied().unwrap_or(0)) / trials as f64;
            assert!(
                (observed - expected).abs() < 0.02,
                "amount {} observed {:.4} expected {:.4}",
                tier.amount,
                observed,
                expected
            );
        }
    }

    #[test]
    fn draw_only_returns_table_amounts() {
        let table = RewardTable::new(
            vec![
                RewardTier { amount: 1, weight: 0.5 },
                RewardTier { amount: 2, weight: 1.5 },
            ],
            2,
        )
        .unwrap();
        let mut rng = pcg_from_seed(3);
        for _ in 0..1_000 {
            let amount = table.draw(&mut rng);
            assert!(amount == 1 || amount == 2);
        }
    }

    #[test]
    fn jackpot_is_monotonic() {
        let table = RewardTable::standard();
        assert!(!table.is_jackpot(100_000));
        assert!(table.is_jackpot(200_000));
        let amounts = [0, 10_000, 199_999, 200_000, 200_001, 1_000_000];
        for a in amounts {
            for b in amounts {
                if table.is_jackpot(a) && b >= a {
                    assert!(table.is_jackpot(b));
                }
            }
        }
    }

    #[test]
    fn rejects_bad_tables() {
        assert!(RewardTable::new(vec![], 0).is_err());
        let zero = vec![RewardTier { amount: 5, weight: 0.0 }];
        assert!(RewardTable::new(zero, 5).is_err());
        let nan = vec![RewardTier { amount: 5, weight: f64::NAN }];
        assert!(RewardTable::new(nan, 5).is_err());
    }

    #[test]
    fn formats_grouped_amounts() {
        assert_eq!(format_amount(0), "0 VNĐ");
        assert_eq!(format_amount(10_000), "10.000 VNĐ");
        assert_eq!(format_amount(200_000), "200.000 VNĐ");
        assert_eq!(format_amount(1_234_567), "1.234.567 VNĐ");
    }
}
