//! Wash Sale Rule Monitoring
//!
//! A purchase of the same security within the window on either side of a
//! sale disallows the loss. Purchases are recognised from the transaction
//! feed: a negative amount whose name mentions the ticker.

use chrono::{Duration, NaiveDate};
use finance_core::TransactionRecord;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Inclusive date window around a prospective sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WashSaleWindow {
    pub ticker: String,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub window_days: i64,
}

impl WashSaleWindow {
    /// Bounds that fall off the calendar clamp to the earliest/latest date.
    pub fn around(ticker: &str, sale_date: NaiveDate, window_days: i64) -> Self {
        let span = Duration::try_days(window_days);
        Self {
            ticker: ticker.to_string(),
            window_start: span
                .and_then(|d| sale_date.checked_sub_signed(d))
                .unwrap_or(NaiveDate::MIN),
            window_end: span
                .and_then(|d| sale_date.checked_add_signed(d))
                .unwrap_or(NaiveDate::MAX),
            window_days,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.window_start && date <= self.window_end
    }

    /// Case-insensitive substring match of the ticker against the transaction
    /// name. Short tickers can collide with unrelated names.
    pub fn is_matching_purchase(&self, transaction: &TransactionRecord) -> bool {
        if self.ticker.trim().is_empty() || transaction.amount >= Decimal::ZERO {
            return false;
        }
        let ticker = self.ticker.trim().to_lowercase();
        transaction.name.to_lowercase().contains(&ticker) && self.contains(transaction.date)
    }

    pub fn check(&self, transactions: &[TransactionRecord]) -> WashSaleCheck {
        let matches: Vec<&TransactionRecord> = transactions
            .iter()
            .filter(|t| self.is_matching_purchase(t))
            .collect();

        let safe_date = matches
            .iter()
            .map(|t| t.date)
            .max()
            .and_then(|latest| {
                Duration::try_days(self.window_days.saturating_add(1)).and_then(|d| latest.checked_add_signed(d))
            });

        if !matches.is_empty() {
            tracing::debug!(
                "{} has {} purchase(s) inside {}..={}",
                self.ticker,
                matches.len(),
                self.window_start,
                self.window_end
            );
        }

        WashSaleCheck {
            at_risk: !matches.is_empty(),
            matching_transaction_ids: matches.iter().map(|t| t.id.clone()).collect(),
            safe_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WashSaleCheck {
    pub at_risk: bool,
    pub matching_transaction_ids: Vec<String>,
    /// First day a sale clears every matching purchase, when any exist.
    pub safe_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn txn(id: &str, name: &str, amount: Decimal, on: NaiveDate) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            name: name.to_string(),
            merchant_name: None,
            amount,
            date: on,
            pending: false,
            category: None,
        }
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let window = WashSaleWindow::around("VTI", date(2026, 6, 30), 30);
        assert_eq!(window.window_start, date(2026, 5, 31));
        assert_eq!(window.window_end, date(2026, 7, 30));
        assert!(window.contains(date(2026, 5, 31)));
        assert!(window.contains(date(2026, 7, 30)));
        assert!(!window.contains(date(2026, 7, 31)));
    }

    #[test]
    fn test_detects_recent_buy() {
        let window = WashSaleWindow::around("VTI", date(2026, 6, 30), 30);
        let transactions = vec![
            txn("t1", "Buy vti shares", dec!(-2500), date(2026, 6, 5)),
            txn("t2", "VTI dividend", dec!(12.40), date(2026, 6, 10)),
            txn("t3", "Buy VTI", dec!(-1000), date(2026, 3, 1)),
        ];
        let check = window.check(&transactions);
        assert!(check.at_risk);
        assert_eq!(check.matching_transaction_ids, vec!["t1".to_string()]);
        assert_eq!(check.safe_date, Some(date(2026, 7, 6)));
    }

    #[test]
    fn test_no_match_is_safe() {
        let window = WashSaleWindow::around("QQQ", date(2026, 6, 30), 30);
        let check = window.check(&[txn("t1", "Buy VTI", dec!(-100), date(2026, 6, 29))]);
        assert!(!check.at_risk);
        assert!(check.safe_date.is_none());
    }

    #[test]
    fn test_huge_window_clamps_to_calendar() {
        let window = WashSaleWindow::around("VTI", date(2026, 6, 30), 100_000_000);
        assert_eq!(window.window_start, NaiveDate::MIN);
        assert_eq!(window.window_end, NaiveDate::MAX);
        let check = window.check(&[txn("t1", "Buy VTI", dec!(-100), date(2026, 6, 29))]);
        assert!(check.at_risk);
        assert!(check.safe_date.is_none());

        let widest = WashSaleWindow::around("VTI", date(2026, 6, 30), i64::MAX);
        assert_eq!(widest.window_start, NaiveDate::MIN);
    }

    #[test]
    fn test_blank_ticker_never_matches() {
        let window = WashSaleWindow::around("  ", date(2026, 6, 30), 30);
        assert!(!window.check(&[txn("t1", "Buy anything", dec!(-100), date(2026, 6, 29))]).at_risk);
    }
}
