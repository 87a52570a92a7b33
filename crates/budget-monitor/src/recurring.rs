//! Recurring Charge Detection
//!
//! Groups recent settled spend by merchant and keeps the groups whose amounts
//! barely vary. The frequency label is a count heuristic over the window, not
//! derived from the spacing between charges, so an irregular merchant with
//! four charges is still labelled weekly.

use chrono::{Duration, NaiveDate};
use finance_core::numeric::{coefficient_of_variation, mean, round_currency};
use finance_core::TransactionRecord;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringEntry {
    pub merchant: String,
    /// Average charge
    pub amount: Decimal,
    pub occurrences_90d: usize,
    pub last_seen: NaiveDate,
    pub frequency: String,
}

/// Detector configuration
#[derive(Debug, Clone)]
pub struct RecurringChargeDetector {
    pub window_days: i64,
    pub min_occurrences: usize,
    /// Coefficient of variation must be strictly below this
    pub max_variation: Decimal,
    /// Groups with at most this many charges are labelled monthly
    pub monthly_max_occurrences: usize,
    pub max_entries: usize,
}

impl Default for RecurringChargeDetector {
    fn default() -> Self {
        Self {
            window_days: 90,
            min_occurrences: 2,
            max_variation: dec!(0.10),
            monthly_max_occurrences: 3,
            max_entries: 20,
        }
    }
}

impl RecurringChargeDetector {
    pub fn detect(&self, transactions: &[TransactionRecord], reference_date: NaiveDate) -> Vec<RecurringEntry> {
        let window_start = reference_date - Duration::days(self.window_days);

        let mut groups: BTreeMap<&str, Vec<&TransactionRecord>> = BTreeMap::new();
        for txn in transactions
            .iter()
            .filter(|t| t.is_settled_spend() && t.date >= window_start && t.date <= reference_date)
        {
            groups.entry(txn.merchant_or_name()).or_default().push(txn);
        }

        let mut entries: Vec<(Decimal, RecurringEntry)> = groups
            .into_iter()
            .filter_map(|(merchant, txns)| self.evaluate(merchant, &txns))
            .collect();

        entries.sort_by(|(a_avg, a), (b_avg, b)| b_avg.cmp(a_avg).then_with(|| a.merchant.cmp(&b.merchant)));
        entries.truncate(self.max_entries);

        tracing::debug!("Detected {} recurring charges", entries.len());
        entries.into_iter().map(|(_, entry)| entry).collect()
    }

    fn evaluate(&self, merchant: &str, txns: &[&TransactionRecord]) -> Option<(Decimal, RecurringEntry)> {
        if txns.len() < self.min_occurrences {
            return None;
        }
        let amounts: Vec<Decimal> = txns.iter().map(|t| t.amount).collect();
        let variation = coefficient_of_variation(&amounts)?;
        if variation >= self.max_variation {
            return None;
        }
        let average = mean(&amounts)?;
        let last_seen = txns.iter().map(|t| t.date).max()?;

        let frequency = if txns.len() <= self.monthly_max_occurrences {
            "monthly"
        } else {
            "weekly"
        };

        Some((
            average,
            RecurringEntry {
                merchant: merchant.to_string(),
                amount: round_currency(average),
                occurrences_90d: txns.len(),
                last_seen,
                frequency: frequency.to_string(),
            },
        ))
    }
}
