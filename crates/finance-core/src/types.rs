use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Filing status used to select bracket tables and thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    Single,
    MarriedFilingJointly,
    MarriedFilingSeparately,
    HeadOfHousehold,
}

impl Default for FilingStatus {
    fn default() -> Self {
        Self::Single
    }
}

impl FilingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilingStatus::Single => "single",
            FilingStatus::MarriedFilingJointly => "married_filing_jointly",
            FilingStatus::MarriedFilingSeparately => "married_filing_separately",
            FilingStatus::HeadOfHousehold => "head_of_household",
        }
    }

    /// Parse the user-facing spelling, accepting a few common abbreviations.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "single" => Some(Self::Single),
            "married_filing_jointly" | "mfj" | "joint" => Some(Self::MarriedFilingJointly),
            "married_filing_separately" | "mfs" => Some(Self::MarriedFilingSeparately),
            "head_of_household" | "hoh" => Some(Self::HeadOfHousehold),
            _ => None,
        }
    }
}

impl std::fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregated income for one tax year and filing status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeAggregate {
    pub wages: Decimal,
    pub interest_income: Decimal,
    pub ordinary_dividends: Decimal,
    /// Clamped to zero before tax is computed; losses never offset ordinary income here.
    pub capital_gains_net: Decimal,
    pub tax_withheld: Decimal,
}

/// Standard and itemized deduction candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Deduction {
    pub standard_amount: Decimal,
    pub itemized_amount: Decimal,
}

impl Deduction {
    pub fn effective(&self) -> Decimal {
        self.standard_amount.max(self.itemized_amount)
    }

    pub fn is_itemized(&self) -> bool {
        self.itemized_amount > self.standard_amount
    }

    pub fn kind(&self) -> &'static str {
        if self.is_itemized() {
            "itemized"
        } else {
            "standard"
        }
    }
}

/// One per-form row of tax-document totals, as grouped by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxDocumentTotals {
    pub form_type: String,
    pub wages: Decimal,
    pub interest: Decimal,
    pub dividends: Decimal,
    pub proceeds: Decimal,
    pub cost_basis: Decimal,
    pub withheld: Decimal,
}

/// A budgeted category for the active month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetLine {
    pub category: String,
    pub monthly_limit: Decimal,
    /// Excludes pending transactions and non-positive amounts.
    pub spent_to_date: Decimal,
}

/// A single bank or card transaction. Positive amounts are spend, negative are credits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub name: String,
    pub merchant_name: Option<String>,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub pending: bool,
    pub category: Option<String>,
}

impl TransactionRecord {
    /// Merchant name, falling back to the transaction name.
    pub fn merchant_or_name(&self) -> &str {
        match self.merchant_name.as_deref() {
            Some(m) if !m.trim().is_empty() => m,
            _ => &self.name,
        }
    }

    /// Settled outflow: positive amount and not pending.
    pub fn is_settled_spend(&self) -> bool {
        !self.pending && self.amount > Decimal::ZERO
    }
}

/// An investment position held in an active account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingPosition {
    pub ticker: String,
    pub security_name: Option<String>,
    /// Security type as reported by the brokerage (equity, etf, bond, ...).
    pub asset_class: Option<String>,
    pub quantity: Decimal,
    pub cost_basis_total: Decimal,
    pub market_value: Decimal,
    pub unrealized_gain_loss: Decimal,
    pub acquisition_date: Option<NaiveDate>,
    pub account_name: Option<String>,
}

impl HoldingPosition {
    /// Lower-cased asset class, `other` when absent.
    pub fn asset_class_key(&self) -> String {
        self.asset_class
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_lowercase)
            .unwrap_or_else(|| "other".to_string())
    }
}

/// Asset class label to target percentage. Percentages need not sum to 100.
pub type AllocationTarget = BTreeMap<String, Decimal>;

/// Point-in-time net worth recorded by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetWorthSnapshot {
    pub date: NaiveDate,
    pub net_worth: Decimal,
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_deduction_selection() {
        let d = Deduction { standard_amount: dec!(16100), itemized_amount: Decimal::ZERO };
        assert_eq!(d.effective(), dec!(16100));
        assert_eq!(d.kind(), "standard");

        let d = Deduction { standard_amount: dec!(16100), itemized_amount: dec!(21000) };
        assert_eq!(d.effective(), dec!(21000));
        assert_eq!(d.kind(), "itemized");
    }

    #[test]
    fn test_filing_status_parse() {
        assert_eq!(FilingStatus::parse("single"), Some(FilingStatus::Single));
        assert_eq!(FilingStatus::parse("Married Filing Jointly"), Some(FilingStatus::MarriedFilingJointly));
        assert_eq!(FilingStatus::parse("hoh"), Some(FilingStatus::HeadOfHousehold));
        assert_eq!(FilingStatus::parse("widowed"), None);
    }

    #[test]
    fn test_merchant_fallback() {
        let txn = TransactionRecord {
            id: "t1".to_string(),
            name: "NETFLIX.COM 866-579".to_string(),
            merchant_name: None,
            amount: dec!(15.49),
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            pending: false,
            category: None,
        };
        assert_eq!(txn.merchant_or_name(), "NETFLIX.COM 866-579");
        assert!(txn.is_settled_spend());
    }

    #[test]
    fn test_asset_class_key_defaults_to_other() {
        let holding = HoldingPosition {
            ticker: "VTI".to_string(),
            security_name: None,
            asset_class: Some(" ETF ".to_string()),
            quantity: dec!(10),
            cost_basis_total: dec!(2000),
            market_value: dec!(2500),
            unrealized_gain_loss: dec!(500),
            acquisition_date: None,
            account_name: None,
        };
        assert_eq!(holding.asset_class_key(), "etf");

        let unlabeled = HoldingPosition { asset_class: None, ..holding };
        assert_eq!(unlabeled.asset_class_key(), "other");
    }
}
