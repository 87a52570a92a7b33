//! Portfolio Performance
//!
//! Point-in-time totals for current holdings, period returns measured against
//! recorded net-worth snapshots, and concentration checks.

use chrono::{Datelike, Duration, NaiveDate};
use finance_core::numeric::{percent_of, round_currency, round_percent};
use finance_core::{HoldingPosition, NetWorthSnapshot};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const CONCENTRATION_PCT: Decimal = dec!(10);
const TOP_POSITIONS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodReturn {
    pub prior_value: Decimal,
    pub change: Decimal,
    pub change_pct: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassBreakdown {
    pub value: Decimal,
    pub pct: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationRisk {
    pub ticker: String,
    pub pct: Decimal,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSummary {
    pub ticker: String,
    pub name: Option<String>,
    pub value: Decimal,
    pub unrealized_gl: Decimal,
    pub unrealized_gl_pct: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub total_value: Decimal,
    pub total_cost_basis: Decimal,
    pub total_unrealized_gain_loss: Decimal,
    pub total_unrealized_pct: Decimal,
    /// Keyed by period label; `None` when no usable snapshot precedes the period.
    pub returns: BTreeMap<String, Option<PeriodReturn>>,
    pub asset_classes: BTreeMap<String, ClassBreakdown>,
    pub concentration_risks: Vec<ConcentrationRisk>,
    pub top_positions: Vec<PositionSummary>,
}

pub struct PerformanceAnalyzer;

impl PerformanceAnalyzer {
    /// Period labels and their start dates relative to `reference_date`.
    pub fn periods(reference_date: NaiveDate) -> Vec<(&'static str, NaiveDate)> {
        let mut periods = vec![
            ("1d", reference_date - Duration::days(1)),
            ("1w", reference_date - Duration::weeks(1)),
            ("1m", reference_date - Duration::days(30)),
            ("3m", reference_date - Duration::days(90)),
        ];
        if let Some(jan_first) = NaiveDate::from_ymd_opt(reference_date.year(), 1, 1) {
            periods.push(("ytd", jan_first));
        }
        periods
    }

    /// Latest snapshot on or before `start`, if its value is positive.
    fn prior_value(snapshots: &[NetWorthSnapshot], start: NaiveDate) -> Option<Decimal> {
        snapshots
            .iter()
            .filter(|s| s.date <= start)
            .max_by_key(|s| s.date)
            .map(|s| s.net_worth)
            .filter(|v| *v > Decimal::ZERO)
    }

    pub fn analyze(
        holdings: &[HoldingPosition],
        snapshots: &[NetWorthSnapshot],
        reference_date: NaiveDate,
    ) -> PerformanceReport {
        let total_value: Decimal = holdings.iter().map(|h| h.market_value).sum();
        let total_cost: Decimal = holdings.iter().map(|h| h.cost_basis_total).sum();
        let total_unrealized: Decimal = holdings.iter().map(|h| h.unrealized_gain_loss).sum();

        let returns = Self::periods(reference_date)
            .into_iter()
            .map(|(label, start)| {
                let period_return = Self::prior_value(snapshots, start).map(|prior| PeriodReturn {
                    prior_value: round_currency(prior),
                    change: round_currency(total_value - prior),
                    change_pct: round_percent(percent_of(total_value - prior, prior)),
                });
                (label.to_string(), period_return)
            })
            .collect();

        let mut class_values: BTreeMap<String, Decimal> = BTreeMap::new();
        for h in holdings {
            *class_values.entry(h.asset_class_key()).or_insert(Decimal::ZERO) += h.market_value;
        }
        let asset_classes = class_values
            .into_iter()
            .map(|(class, value)| {
                let breakdown = ClassBreakdown {
                    value: round_currency(value),
                    pct: round_percent(percent_of(value, total_value)),
                };
                (class, breakdown)
            })
            .collect();

        let mut by_value: Vec<&HoldingPosition> = holdings.iter().collect();
        by_value.sort_by(|a, b| b.market_value.cmp(&a.market_value).then_with(|| a.ticker.cmp(&b.ticker)));

        let concentration_risks: Vec<ConcentrationRisk> = by_value
            .iter()
            .filter_map(|h| {
                let pct = percent_of(h.market_value, total_value);
                (pct > CONCENTRATION_PCT).then(|| ConcentrationRisk {
                    ticker: h.ticker.clone(),
                    pct: round_percent(pct),
                    value: round_currency(h.market_value),
                })
            })
            .collect();

        let top_positions = by_value
            .iter()
            .take(TOP_POSITIONS)
            .map(|h| PositionSummary {
                ticker: h.ticker.clone(),
                name: h.security_name.clone(),
                value: round_currency(h.market_value),
                unrealized_gl: round_currency(h.unrealized_gain_loss),
                unrealized_gl_pct: round_percent(percent_of(h.unrealized_gain_loss, h.cost_basis_total)),
            })
            .collect();

        if !concentration_risks.is_empty() {
            tracing::warn!("{} positions exceed {}% of the portfolio", concentration_risks.len(), CONCENTRATION_PCT);
        }

        PerformanceReport {
            total_value: round_currency(total_value),
            total_cost_basis: round_currency(total_cost),
            total_unrealized_gain_loss: round_currency(total_unrealized),
            total_unrealized_pct: round_percent(percent_of(total_unrealized, total_cost)),
            returns,
            asset_classes,
            concentration_risks,
            top_positions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn holding(ticker: &str, class: &str, cost: Decimal, value: Decimal) -> HoldingPosition {
        HoldingPosition {
            ticker: ticker.to_string(),
            security_name: Some(format!("{} Inc", ticker)),
            asset_class: Some(class.to_string()),
            quantity: dec!(10),
            cost_basis_total: cost,
            market_value: value,
            unrealized_gain_loss: value - cost,
            acquisition_date: None,
            account_name: None,
        }
    }

    fn snapshot(days_ago: i64, net_worth: Decimal) -> NetWorthSnapshot {
        NetWorthSnapshot {
            date: reference() - Duration::days(days_ago),
            net_worth,
        }
    }

    #[test]
    fn test_totals_and_breakdown() {
        let holdings = vec![
            holding("AAPL", "equity", dec!(4000), dec!(5000)),
            holding("BND", "bond", dec!(5500), dec!(5000)),
        ];
        let report = PerformanceAnalyzer::analyze(&holdings, &[], reference());
        assert_eq!(report.total_value, dec!(10000));
        assert_eq!(report.total_cost_basis, dec!(9500));
        assert_eq!(report.total_unrealized_gain_loss, dec!(500));
        // 500 / 9500 = 5.26%
        assert_eq!(report.total_unrealized_pct, dec!(5.3));
        assert_eq!(report.asset_classes["equity"].pct, dec!(50.0));
        assert_eq!(report.concentration_risks.len(), 2);
        assert!(report.returns.values().all(Option::is_none));
    }

    #[test]
    fn test_returns_use_latest_snapshot_before_period() {
        let holdings = vec![holding("VTI", "etf", dec!(10000), dec!(11000))];
        let snapshots = vec![
            snapshot(1, dec!(10000)),
            snapshot(8, dec!(0)),
            snapshot(40, dec!(10500)),
            snapshot(35, dec!(12000)),
        ];
        let report = PerformanceAnalyzer::analyze(&holdings, &snapshots, reference());

        let one_day = report.returns["1d"].as_ref().unwrap();
        assert_eq!(one_day.change, dec!(1000));
        assert_eq!(one_day.change_pct, dec!(10.0));
        // Latest snapshot on/before 7 days ago has zero net worth
        assert!(report.returns["1w"].is_none());
        let one_month = report.returns["1m"].as_ref().unwrap();
        assert_eq!(one_month.prior_value, dec!(12000));
        assert!(report.returns["3m"].is_none());
    }

    #[test]
    fn test_top_positions_capped_and_sorted() {
        let holdings: Vec<_> = (1..=12)
            .map(|i| holding(&format!("T{:02}", i), "equity", dec!(100), Decimal::from(i * 100)))
            .collect();
        let report = PerformanceAnalyzer::analyze(&holdings, &[], reference());
        assert_eq!(report.top_positions.len(), 10);
        assert_eq!(report.top_positions[0].ticker, "T12");
        // Largest is 1200 of 7800 = 15.4%
        assert_eq!(report.concentration_risks[0].pct, dec!(15.4));
    }

    #[test]
    fn test_empty_holdings() {
        let report = PerformanceAnalyzer::analyze(&[], &[], reference());
        assert_eq!(report.total_value, Decimal::ZERO);
        assert_eq!(report.total_unrealized_pct, Decimal::ZERO);
        assert!(report.top_positions.is_empty());
    }
}
