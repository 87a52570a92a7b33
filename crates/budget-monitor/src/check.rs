use chrono::NaiveDate;
use finance_core::{BudgetLine, DateRange, FinanceResult, TransactionRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::anomaly::{AnomalyDetector, AnomalyEntry, CategoryAverages};
use crate::budget::{month_period, spent_by_category, BudgetMonitor, BudgetStatusEntry};
use crate::recurring::{RecurringChargeDetector, RecurringEntry};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetCheckSummary {
    pub categories_on_track: usize,
    pub categories_warning: usize,
    pub categories_over_budget: usize,
    pub recurring_charges_detected: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetCheckReport {
    pub period: DateRange,
    pub on_track: Vec<BudgetStatusEntry>,
    pub warning: Vec<BudgetStatusEntry>,
    pub over_budget: Vec<BudgetStatusEntry>,
    pub recurring: Vec<RecurringEntry>,
    pub unusual_transactions: Vec<AnomalyEntry>,
    pub summary: BudgetCheckSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Month-to-date budget tiers plus recurring and unusual charges.
///
/// Month-to-date spend always comes from the transaction feed; a budgeted
/// category with no transactions this month has spent nothing.
pub fn check_budgets(
    budgets: &[BudgetLine],
    transactions: &[TransactionRecord],
    reference_date: NaiveDate,
) -> FinanceResult<BudgetCheckReport> {
    let period = month_period(reference_date)?;
    let spent = spent_by_category(transactions, period);

    let lines: Vec<BudgetLine> = budgets
        .iter()
        .map(|line| BudgetLine {
            spent_to_date: spent.get(&line.category).copied().unwrap_or(Decimal::ZERO),
            ..line.clone()
        })
        .collect();
    let tiers = BudgetMonitor::classify(&lines);

    let recurring = RecurringChargeDetector::default().detect(transactions, reference_date);

    let anomaly_detector = AnomalyDetector::default();
    let averages = CategoryAverages::from_history(transactions, reference_date, anomaly_detector.history_days);
    let unusual_transactions = anomaly_detector.detect(transactions, period, &averages);

    let message = budgets.is_empty().then(|| "No active budgets found.".to_string());
    if message.is_some() {
        tracing::info!("No active budgets; reporting detectors only");
    }

    Ok(BudgetCheckReport {
        period,
        summary: BudgetCheckSummary {
            categories_on_track: tiers.on_track.len(),
            categories_warning: tiers.warning.len(),
            categories_over_budget: tiers.over_budget.len(),
            recurring_charges_detected: recurring.len(),
        },
        on_track: tiers.on_track,
        warning: tiers.warning,
        over_budget: tiers.over_budget,
        recurring,
        unusual_transactions,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn txn(id: &str, merchant: &str, amount: Decimal, days_ago: i64, category: &str) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            name: merchant.to_string(),
            merchant_name: Some(merchant.to_string()),
            amount,
            date: reference() - Duration::days(days_ago),
            pending: false,
            category: Some(category.to_string()),
        }
    }

    fn budget(category: &str, limit: Decimal, spent: Decimal) -> BudgetLine {
        BudgetLine {
            category: category.to_string(),
            monthly_limit: limit,
            spent_to_date: spent,
        }
    }

    #[test]
    fn test_full_check() {
        let mut transactions = vec![
            txn("n1", "Netflix", dec!(15.49), 1, "Entertainment"),
            txn("n2", "Netflix", dec!(15.49), 31, "Entertainment"),
            txn("d1", "Bistro", dec!(450), 2, "Dining"),
        ];
        for i in 0..9 {
            transactions.push(txn(&format!("h{}", i), "Cafe", dec!(20), 20 + i * 5, "Dining"));
        }

        let report = check_budgets(
            &[budget("Dining", dec!(500), Decimal::ZERO), budget("Travel", dec!(1000), dec!(100))],
            &transactions,
            reference(),
        )
        .unwrap();

        assert_eq!(report.period.start, NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
        // Dining: 450 this month against 500
        assert_eq!(report.warning.len(), 1);
        assert_eq!(report.warning[0].spent, dec!(450.00));
        // Travel has no transactions this month, so nothing is spent
        assert_eq!(report.on_track[0].category, "Travel");
        assert_eq!(report.on_track[0].spent, dec!(0.00));

        assert!(report.recurring.iter().any(|r| r.merchant == "Netflix" && r.frequency == "monthly"));
        // Dining average (450 + 9 * 20) / 10 = 63, so 450 > 189
        assert_eq!(report.unusual_transactions.len(), 1);
        assert_eq!(report.unusual_transactions[0].id, "d1");
        assert_eq!(report.summary.categories_warning, 1);
        assert!(report.message.is_none());
    }

    #[test]
    fn test_spend_ignores_stale_supplied_figures() {
        let budgets = vec![
            budget("Dining", dec!(1000), dec!(900)),
            budget("Travel", dec!(1000), dec!(950)),
        ];
        let transactions = vec![txn("a", "Cafe", dec!(10), 3, "Dining")];
        let report = check_budgets(&budgets, &transactions, reference()).unwrap();

        assert!(report.warning.is_empty());
        assert_eq!(report.summary.categories_on_track, 2);
        let spent: Vec<Decimal> = report.on_track.iter().map(|e| e.spent).collect();
        assert_eq!(spent, vec![dec!(10.00), dec!(0.00)]);
    }

    #[test]
    fn test_no_budgets_is_not_an_error() {
        let report = check_budgets(&[], &[], reference()).unwrap();
        assert!(report.on_track.is_empty() && report.warning.is_empty() && report.over_budget.is_empty());
        assert_eq!(report.message.as_deref(), Some("No active budgets found."));
    }

    #[test]
    fn test_idempotent() {
        let budgets = vec![budget("Dining", dec!(300), dec!(280))];
        let transactions = vec![txn("a", "Cafe", dec!(12), 3, "Dining")];
        let first = serde_json::to_string(&check_budgets(&budgets, &transactions, reference()).unwrap()).unwrap();
        let second = serde_json::to_string(&check_budgets(&budgets, &transactions, reference()).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
