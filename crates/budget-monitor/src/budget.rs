use chrono::{Datelike, Duration, NaiveDate};
use finance_core::numeric::{percent_of, round_currency, round_percent};
use finance_core::{BudgetLine, DateRange, FinanceError, FinanceResult, TransactionRecord};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const WARNING_PCT: Decimal = dec!(80);
const OVER_PCT: Decimal = dec!(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    OnTrack,
    Warning,
    OverBudget,
}

impl BudgetStatus {
    /// Over above 100%, warning from 80% through exactly 100%.
    pub fn classify(pct_used: Decimal) -> Self {
        if pct_used > OVER_PCT {
            Self::OverBudget
        } else if pct_used >= WARNING_PCT {
            Self::Warning
        } else {
            Self::OnTrack
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatusEntry {
    pub category: String,
    pub budget: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub pct_used: Decimal,
    pub status: BudgetStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetTiers {
    pub on_track: Vec<BudgetStatusEntry>,
    pub warning: Vec<BudgetStatusEntry>,
    pub over_budget: Vec<BudgetStatusEntry>,
}

impl BudgetTiers {
    pub fn len(&self) -> usize {
        self.on_track.len() + self.warning.len() + self.over_budget.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct BudgetMonitor;

impl BudgetMonitor {
    pub fn entry(line: &BudgetLine) -> BudgetStatusEntry {
        // A zero or negative limit reports 0% rather than dividing.
        let pct = percent_of(line.spent_to_date, line.monthly_limit);
        BudgetStatusEntry {
            category: line.category.clone(),
            budget: round_currency(line.monthly_limit),
            spent: round_currency(line.spent_to_date),
            remaining: round_currency(line.monthly_limit - line.spent_to_date),
            pct_used: round_percent(pct),
            status: BudgetStatus::classify(pct),
        }
    }

    /// Partition lines into the three tiers, each ordered by category.
    pub fn classify(lines: &[BudgetLine]) -> BudgetTiers {
        let mut sorted: Vec<&BudgetLine> = lines.iter().collect();
        sorted.sort_by(|a, b| a.category.cmp(&b.category));

        let mut tiers = BudgetTiers::default();
        for line in sorted {
            let entry = Self::entry(line);
            match entry.status {
                BudgetStatus::OnTrack => tiers.on_track.push(entry),
                BudgetStatus::Warning => tiers.warning.push(entry),
                BudgetStatus::OverBudget => tiers.over_budget.push(entry),
            }
        }

        tracing::debug!(
            "Budgets: {} on track, {} warning, {} over",
            tiers.on_track.len(),
            tiers.warning.len(),
            tiers.over_budget.len()
        );
        tiers
    }
}

/// First through last day of the month containing `reference`.
pub fn month_period(reference: NaiveDate) -> FinanceResult<DateRange> {
    let out_of_range = || FinanceError::InvalidInput(format!("date {} out of range", reference));

    let start = reference.with_day(1).ok_or_else(out_of_range)?;
    let next_month = if reference.month() == 12 {
        NaiveDate::from_ymd_opt(reference.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(reference.year(), reference.month() + 1, 1)
    }
    .ok_or_else(out_of_range)?;

    Ok(DateRange {
        start,
        end: next_month - Duration::days(1),
    })
}

/// Settled spend per category inside `period`. Uncategorized transactions are ignored.
pub fn spent_by_category(transactions: &[TransactionRecord], period: DateRange) -> BTreeMap<String, Decimal> {
    let mut spent = BTreeMap::new();
    for txn in transactions
        .iter()
        .filter(|t| t.is_settled_spend() && period.contains(t.date))
    {
        if let Some(category) = txn.category.as_deref() {
            *spent.entry(category.to_string()).or_insert(Decimal::ZERO) += txn.amount;
        }
    }
    spent
}
