//! Conversion of loosely typed store rows into the typed entities.
//!
//! Money fields that are missing or null default to zero only where a zero is
//! financially meaningful; identity fields are always required.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::error::{FinanceError, FinanceResult};
use crate::numeric::decimal_from_f64;
use crate::types::*;

pub type Row = Map<String, Value>;

/// A row excluded from a batch, with the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    pub kind: &'static str,
    pub index: usize,
    pub reason: String,
}

pub trait FromRow: Sized {
    const KIND: &'static str;

    fn from_row(row: &Row) -> FinanceResult<Self>;
}

/// Convert every row, skipping (and recording) the malformed ones.
pub fn convert_rows<T: FromRow>(rows: &[Row]) -> (Vec<T>, Vec<SkippedRow>) {
    let mut converted = Vec::with_capacity(rows.len());
    let mut skipped = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        match T::from_row(row) {
            Ok(item) => converted.push(item),
            Err(e) => {
                tracing::warn!("Skipping {} row {}: {}", T::KIND, index, e);
                skipped.push(SkippedRow {
                    kind: T::KIND,
                    index,
                    reason: e.to_string(),
                });
            }
        }
    }

    (converted, skipped)
}

fn lookup<'a>(row: &'a Row, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| row.get(*k))
        .find(|v| !v.is_null())
}

fn invalid(keys: &[&str], detail: impl std::fmt::Display) -> FinanceError {
    FinanceError::InvalidInput(format!("field '{}': {}", keys[0], detail))
}

fn parse_decimal(value: &Value, keys: &[&str]) -> FinanceResult<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
                .or_else(|| n.as_f64().and_then(decimal_from_f64))
                .ok_or_else(|| invalid(keys, format!("unrepresentable number {}", text)))
        }
        Value::String(s) => {
            let trimmed = s.trim().replace(',', "");
            Decimal::from_str(&trimmed).map_err(|_| invalid(keys, format!("not a number: '{}'", s)))
        }
        other => Err(invalid(keys, format!("expected number, got {}", other))),
    }
}

/// Optional money field; zero when missing or null.
pub fn money_or_zero(row: &Row, keys: &[&str]) -> FinanceResult<Decimal> {
    Ok(optional_money(row, keys)?.unwrap_or(Decimal::ZERO))
}

pub fn optional_money(row: &Row, keys: &[&str]) -> FinanceResult<Option<Decimal>> {
    lookup(row, keys).map(|v| parse_decimal(v, keys)).transpose()
}

pub fn required_money(row: &Row, keys: &[&str]) -> FinanceResult<Decimal> {
    optional_money(row, keys)?.ok_or_else(|| invalid(keys, "missing"))
}

pub fn optional_str(row: &Row, keys: &[&str]) -> Option<String> {
    match lookup(row, keys)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn required_str(row: &Row, keys: &[&str]) -> FinanceResult<String> {
    optional_str(row, keys).ok_or_else(|| invalid(keys, "missing"))
}

pub fn optional_date(row: &Row, keys: &[&str]) -> FinanceResult<Option<NaiveDate>> {
    match lookup(row, keys) {
        None => Ok(None),
        Some(Value::String(s)) => {
            // Accept full timestamps by reading the calendar date prefix.
            let day = s.trim().get(..10).unwrap_or(s.trim());
            NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| invalid(keys, format!("unparsable date '{}'", s)))
        }
        Some(other) => Err(invalid(keys, format!("expected date string, got {}", other))),
    }
}

pub fn required_date(row: &Row, keys: &[&str]) -> FinanceResult<NaiveDate> {
    optional_date(row, keys)?.ok_or_else(|| invalid(keys, "missing"))
}

pub fn flag(row: &Row, keys: &[&str]) -> FinanceResult<bool> {
    match lookup(row, keys) {
        None => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" => Ok(true),
            "false" | "f" | "0" | "no" | "" => Ok(false),
            _ => Err(invalid(keys, format!("not a boolean: '{}'", s))),
        },
        Some(Value::Number(n)) => Ok(n.as_i64().map(|i| i != 0).unwrap_or(false)),
        Some(other) => Err(invalid(keys, format!("expected boolean, got {}", other))),
    }
}

impl FromRow for TransactionRecord {
    const KIND: &'static str = "transaction";

    fn from_row(row: &Row) -> FinanceResult<Self> {
        Ok(Self {
            id: required_str(row, &["id", "transaction_id"])?,
            name: optional_str(row, &["name"]).unwrap_or_default(),
            merchant_name: optional_str(row, &["merchant_name", "merchant"]),
            amount: required_money(row, &["amount"])?,
            date: required_date(row, &["date"])?,
            pending: flag(row, &["pending"])?,
            category: optional_str(row, &["category"]),
        })
    }
}

impl FromRow for HoldingPosition {
    const KIND: &'static str = "holding";

    fn from_row(row: &Row) -> FinanceResult<Self> {
        let cost_basis_total = money_or_zero(row, &["cost_basis_total", "cost_basis"])?;
        let market_value = money_or_zero(row, &["market_value"])?;
        let unrealized_gain_loss = optional_money(row, &["unrealized_gain_loss"])?
            .unwrap_or(market_value - cost_basis_total);

        Ok(Self {
            ticker: required_str(row, &["ticker", "ticker_symbol", "symbol"])?,
            security_name: optional_str(row, &["security_name"]),
            asset_class: optional_str(row, &["asset_class", "security_type"]),
            quantity: money_or_zero(row, &["quantity"])?,
            cost_basis_total,
            market_value,
            unrealized_gain_loss,
            acquisition_date: optional_date(row, &["acquisition_date"])?,
            account_name: optional_str(row, &["account_name", "account"]),
        })
    }
}

impl FromRow for BudgetLine {
    const KIND: &'static str = "budget";

    fn from_row(row: &Row) -> FinanceResult<Self> {
        Ok(Self {
            category: required_str(row, &["category"])?,
            monthly_limit: required_money(row, &["monthly_limit", "limit"])?,
            spent_to_date: money_or_zero(row, &["spent_to_date", "spent"])?,
        })
    }
}

impl FromRow for TaxDocumentTotals {
    const KIND: &'static str = "tax_document";

    fn from_row(row: &Row) -> FinanceResult<Self> {
        Ok(Self {
            form_type: required_str(row, &["form_type"])?,
            wages: money_or_zero(row, &["wages", "w2_wages", "wages_tips_other_compensation"])?,
            interest: money_or_zero(row, &["interest", "interest_income"])?,
            dividends: money_or_zero(row, &["dividends", "ordinary_dividends"])?,
            proceeds: money_or_zero(row, &["proceeds", "net_proceeds"])?,
            cost_basis: money_or_zero(row, &["cost_basis"])?,
            withheld: money_or_zero(row, &["withheld", "total_tax_withheld"])?,
        })
    }
}

impl FromRow for NetWorthSnapshot {
    const KIND: &'static str = "net_worth_snapshot";

    fn from_row(row: &Row) -> FinanceResult<Self> {
        Ok(Self {
            date: required_date(row, &["date"])?,
            net_worth: required_money(row, &["net_worth"])?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_transaction_row_conversion() {
        let r = row(json!({
            "id": 42,
            "name": "SQ *BLUE BOTTLE",
            "merchant_name": null,
            "amount": "6.75",
            "date": "2026-03-04T10:15:00Z",
            "pending": false,
            "category": "Food & Dining"
        }));
        let txn = TransactionRecord::from_row(&r).unwrap();
        assert_eq!(txn.id, "42");
        assert_eq!(txn.amount, dec!(6.75));
        assert_eq!(txn.date, NaiveDate::from_ymd_opt(2026, 3, 4).unwrap());
        assert_eq!(txn.merchant_name, None);
    }

    #[test]
    fn test_holding_requires_ticker() {
        let r = row(json!({ "market_value": 1200.5, "cost_basis_total": 1000 }));
        assert!(HoldingPosition::from_row(&r).is_err());
    }

    #[test]
    fn test_holding_derives_unrealized_when_absent() {
        let r = row(json!({
            "ticker_symbol": "VXUS",
            "security_type": "ETF",
            "market_value": 900,
            "cost_basis_total": 1000.25
        }));
        let h = HoldingPosition::from_row(&r).unwrap();
        assert_eq!(h.ticker, "VXUS");
        assert_eq!(h.unrealized_gain_loss, dec!(-100.25));
        assert_eq!(h.acquisition_date, None);
    }

    #[test]
    fn test_missing_withholding_defaults_to_zero() {
        let r = row(json!({ "form_type": "1099-INT", "interest_income": 310.12 }));
        let doc = TaxDocumentTotals::from_row(&r).unwrap();
        assert_eq!(doc.interest, dec!(310.12));
        assert_eq!(doc.withheld, Decimal::ZERO);
    }

    #[test]
    fn test_batch_skips_malformed_rows() {
        let rows = vec![
            row(json!({ "category": "Groceries", "monthly_limit": 600, "spent": 120 })),
            row(json!({ "category": "Dining", "monthly_limit": "lots" })),
            row(json!({ "monthly_limit": 100 })),
        ];
        let (lines, skipped) = convert_rows::<BudgetLine>(&rows);
        assert_eq!(lines.len(), 1);
        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped[0].index, 1);
        assert_eq!(skipped[1].index, 2);
        assert_eq!(skipped[1].kind, "budget");
    }

    #[test]
    fn test_unparsable_date_is_rejected() {
        let r = row(json!({ "id": "a", "amount": 5, "date": "03/04/2026" }));
        assert!(TransactionRecord::from_row(&r).is_err());
    }
}
