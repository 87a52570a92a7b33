use finance_core::numeric::{percent_of, round_currency, round_percent};
use finance_core::{AllocationTarget, HoldingPosition};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const CASH_CLASS: &str = "cash";

const DRIFT_TOLERANCE_PCT: Decimal = dec!(5);

/// Equity 70 / ETF 15 / bond 10 / cash 5.
pub fn default_target() -> AllocationTarget {
    BTreeMap::from([
        ("equity".to_string(), dec!(70)),
        ("etf".to_string(), dec!(15)),
        ("bond".to_string(), dec!(10)),
        (CASH_CLASS.to_string(), dec!(5)),
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebalanceAction {
    Reduce,
    Increase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSlice {
    /// Market value in the class
    pub value: Decimal,
    /// Share of the total portfolio
    pub pct: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftEntry {
    /// Asset class (lower-cased)
    pub asset_class: String,
    /// Target weight
    pub target_pct: Decimal,
    /// Current weight
    pub current_pct: Decimal,
    /// Current minus target, in percentage points
    pub drift_pct: Decimal,
    /// Direction that closes the drift
    pub action: RebalanceAction,
    /// Dollars to buy (positive) or sell (negative) to land on target.
    pub rebalance_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationReport {
    /// Holdings plus cash
    pub total_portfolio_value: Decimal,
    /// Value and weight per asset class
    pub current_allocation: BTreeMap<String, AllocationSlice>,
    /// Target weights the drift was measured against
    pub target_allocation: AllocationTarget,
    /// No target was supplied, so the built-in mix was used
    pub using_default_target: bool,
    /// Classes outside tolerance
    pub drift: Vec<DriftEntry>,
    /// True when any class is outside tolerance
    pub rebalance_needed: bool,
}

pub struct AllocationDriftCalculator;

impl AllocationDriftCalculator {
    /// Market value per lower-cased asset class, with cash balances under `cash`.
    pub fn class_values(holdings: &[HoldingPosition], cash_balance: Decimal) -> BTreeMap<String, Decimal> {
        let mut values = BTreeMap::from([(CASH_CLASS.to_string(), cash_balance)]);
        for holding in holdings {
            *values.entry(holding.asset_class_key()).or_insert(Decimal::ZERO) += holding.market_value;
        }
        values
    }

    /// Compare current class weights to `target`. Each target class is judged
    /// on its own; targets need not sum to 100.
    pub fn compute_drift(
        class_values: &BTreeMap<String, Decimal>,
        target: &AllocationTarget,
        total_value: Decimal,
    ) -> Vec<DriftEntry> {
        let mut entries = Vec::new();

        for (asset_class, target_pct) in target {
            let current_value = class_values.get(asset_class).copied().unwrap_or(Decimal::ZERO);
            let current_pct = percent_of(current_value, total_value);
            let drift = current_pct - *target_pct;
            if drift.abs() <= DRIFT_TOLERANCE_PCT {
                continue;
            }

            let target_value = total_value * *target_pct / Decimal::ONE_HUNDRED;
            entries.push(DriftEntry {
                asset_class: asset_class.clone(),
                target_pct: *target_pct,
                current_pct: round_percent(current_pct),
                drift_pct: round_percent(drift),
                action: if drift > Decimal::ZERO {
                    RebalanceAction::Reduce
                } else {
                    RebalanceAction::Increase
                },
                rebalance_amount: round_currency(target_value - current_value),
            });
        }

        entries
    }

    pub fn analyze(
        holdings: &[HoldingPosition],
        cash_balance: Decimal,
        target: Option<&AllocationTarget>,
    ) -> AllocationReport {
        let using_default_target = target.map_or(true, |t| t.is_empty());
        let target: AllocationTarget = match target {
            Some(t) if !t.is_empty() => t.iter().map(|(k, v)| (k.trim().to_lowercase(), *v)).collect(),
            _ => default_target(),
        };

        let class_values = Self::class_values(holdings, cash_balance);
        let total_value: Decimal = class_values.values().copied().sum();
        let drift = Self::compute_drift(&class_values, &target, total_value);

        tracing::info!(
            "Allocation across {} classes, total {}, {} drifting",
            class_values.len(),
            round_currency(total_value),
            drift.len()
        );

        let current_allocation = class_values
            .iter()
            .map(|(class, value)| {
                (
                    class.clone(),
                    AllocationSlice {
                        value: round_currency(*value),
                        pct: round_percent(percent_of(*value, total_value)),
                    },
                )
            })
            .collect();

        AllocationReport {
            total_portfolio_value: round_currency(total_value),
            current_allocation,
            target_allocation: target,
            using_default_target,
            rebalance_needed: !drift.is_empty(),
            drift,
        }
    }
}
