//! Spending Anomaly Detection
//!
//! Flags settled charges in the reporting period that exceed a multiple of
//! their category's trailing average.

use chrono::{Duration, NaiveDate};
use finance_core::numeric::{mean, round_currency, safe_div};
use finance_core::{DateRange, TransactionRecord};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Trailing per-category average of settled spend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryAverages {
    averages: BTreeMap<String, Decimal>,
}

impl CategoryAverages {
    pub fn from_history(transactions: &[TransactionRecord], reference_date: NaiveDate, window_days: i64) -> Self {
        let window_start = reference_date - Duration::days(window_days);
        let mut amounts: BTreeMap<&str, Vec<Decimal>> = BTreeMap::new();
        for txn in transactions
            .iter()
            .filter(|t| t.is_settled_spend() && t.date >= window_start && t.date <= reference_date)
        {
            if let Some(category) = txn.category.as_deref() {
                amounts.entry(category).or_default().push(txn.amount);
            }
        }

        let averages = amounts
            .into_iter()
            .filter_map(|(category, values)| mean(&values).map(|avg| (category.to_string(), avg)))
            .collect();
        Self { averages }
    }

    pub fn from_map(averages: BTreeMap<String, Decimal>) -> Self {
        Self { averages }
    }

    pub fn get(&self, category: &str) -> Option<Decimal> {
        self.averages.get(category).copied()
    }

    pub fn len(&self) -> usize {
        self.averages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.averages.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEntry {
    pub id: String,
    pub name: String,
    pub category: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category_avg: Decimal,
    /// `None` when the category average is zero.
    pub multiple: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    pub threshold_multiple: Decimal,
    pub history_days: i64,
    pub max_entries: usize,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self {
            threshold_multiple: dec!(3),
            history_days: 90,
            max_entries: 10,
        }
    }
}

impl AnomalyDetector {
    /// Unusual charges within `period`, largest first.
    pub fn detect(
        &self,
        transactions: &[TransactionRecord],
        period: DateRange,
        averages: &CategoryAverages,
    ) -> Vec<AnomalyEntry> {
        let mut flagged: Vec<AnomalyEntry> = transactions
            .iter()
            .filter(|t| t.is_settled_spend() && period.contains(t.date))
            .filter_map(|t| {
                let category = t.category.as_deref()?;
                let average = averages.get(category)?;
                if t.amount <= average * self.threshold_multiple {
                    return None;
                }
                Some(AnomalyEntry {
                    id: t.id.clone(),
                    name: t.name.clone(),
                    category: category.to_string(),
                    amount: round_currency(t.amount),
                    date: t.date,
                    category_avg: round_currency(average),
                    multiple: safe_div(t.amount, average)
                        .map(|m| m.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)),
                })
            })
            .collect();

        flagged.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.id.cmp(&b.id)));
        flagged.truncate(self.max_entries);

        if !flagged.is_empty() {
            tracing::info!("Flagged {} unusual transactions in {}..={}", flagged.len(), period.start, period.end);
        }
        flagged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn october() -> DateRange {
        DateRange { start: day(1), end: day(31) }
    }

    fn txn(id: &str, amount: Decimal, category: Option<&str>) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            name: format!("Purchase {}", id),
            merchant_name: None,
            amount,
            date: day(10),
            pending: false,
            category: category.map(str::to_string),
        }
    }

    fn dining_average(avg: Decimal) -> CategoryAverages {
        CategoryAverages::from_map(BTreeMap::from([("Dining".to_string(), avg)]))
    }

    #[test]
    fn test_multiple_over_threshold_flagged() {
        let flagged = AnomalyDetector::default().detect(
            &[txn("big", dec!(200), Some("Dining")), txn("modest", dec!(140), Some("Dining"))],
            october(),
            &dining_average(dec!(50)),
        );
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].id, "big");
        assert_eq!(flagged[0].multiple, Some(dec!(4.0)));
        assert_eq!(flagged[0].category_avg, dec!(50.00));
    }

    #[test]
    fn test_exactly_three_times_not_flagged() {
        let flagged =
            AnomalyDetector::default().detect(&[txn("edge", dec!(150), Some("Dining"))], october(), &dining_average(dec!(50)));
        assert!(flagged.is_empty());
    }

    #[test]
    fn test_zero_average_has_no_multiple() {
        let flagged =
            AnomalyDetector::default().detect(&[txn("any", dec!(10), Some("Dining"))], october(), &dining_average(Decimal::ZERO));
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].multiple, None);
    }

    #[test]
    fn test_uncategorized_and_unknown_categories_skipped() {
        let flagged = AnomalyDetector::default().detect(
            &[txn("a", dec!(900), None), txn("b", dec!(900), Some("Travel"))],
            october(),
            &dining_average(dec!(50)),
        );
        assert!(flagged.is_empty());
    }

    #[test]
    fn test_averages_from_history() {
        let mut old = txn("old", dec!(1000), Some("Dining"));
        old.date = day(10) - Duration::days(120);
        let history = vec![
            txn("a", dec!(40), Some("Dining")),
            txn("b", dec!(60), Some("Dining")),
            txn("c", dec!(-30), Some("Dining")),
            old,
        ];
        let averages = CategoryAverages::from_history(&history, day(16), 90);
        assert_eq!(averages.get("Dining"), Some(dec!(50)));
        assert_eq!(averages.len(), 1);
    }

    #[test]
    fn test_capped_and_sorted_by_amount() {
        let txns: Vec<_> = (0..15).map(|i| txn(&format!("t{:02}", i), Decimal::from(200 + i), Some("Dining"))).collect();
        let flagged = AnomalyDetector::default().detect(&txns, october(), &dining_average(dec!(50)));
        assert_eq!(flagged.len(), 10);
        assert_eq!(flagged[0].amount, dec!(214));
        assert!(flagged.windows(2).all(|w| w[0].amount >= w[1].amount));
    }
}
