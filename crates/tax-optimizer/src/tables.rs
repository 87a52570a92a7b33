//! Federal Tax Tables
//!
//! Built-in 2026 federal tables per filing status, overridable from a JSON
//! document shaped like:
//!
//! ```json
//! {
//!   "year": 2026,
//!   "federal_brackets": { "single": [{ "min": 0, "max": 12400, "rate": 0.10 }, ...] },
//!   "long_term_capital_gains_rates": { "single": [...] },
//!   "standard_deduction": { "single": 16100 },
//!   "niit_threshold": { "single": 200000 },
//!   "net_investment_income_tax_rate": 0.038
//! }
//! ```

use finance_core::{FilingStatus, FinanceError, FinanceResult};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::brackets::{BracketTable, TaxBracket};

/// Everything the liability estimator needs for one filing status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingTables {
    pub ordinary: BracketTable,
    pub long_term_capital_gains: BracketTable,
    pub standard_deduction: Decimal,
    pub niit_threshold: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxTables {
    pub year: i32,
    pub niit_rate: Decimal,
    pub by_status: BTreeMap<FilingStatus, FilingTables>,
}

#[derive(Debug, Deserialize)]
struct RawTaxTables {
    #[serde(default)]
    year: Option<i32>,
    federal_brackets: BTreeMap<String, BracketTable>,
    long_term_capital_gains_rates: BTreeMap<String, BracketTable>,
    standard_deduction: BTreeMap<String, Decimal>,
    #[serde(default)]
    niit_threshold: BTreeMap<String, Decimal>,
    net_investment_income_tax_rate: Decimal,
}

const DEFAULT_NIIT_THRESHOLD: Decimal = dec!(200000);

impl TaxTables {
    /// 2026 federal figures (inflation-adjusted brackets, standard deduction, LTCG tiers).
    pub fn federal_2026() -> Self {
        let mut by_status = BTreeMap::new();

        by_status.insert(
            FilingStatus::Single,
            FilingTables {
                ordinary: ordinary_table([
                    dec!(12400),
                    dec!(50400),
                    dec!(105700),
                    dec!(201775),
                    dec!(256225),
                    dec!(640600),
                ]),
                long_term_capital_gains: ltcg_table(dec!(49450), dec!(545500)),
                standard_deduction: dec!(16100),
                niit_threshold: dec!(200000),
            },
        );
        by_status.insert(
            FilingStatus::MarriedFilingJointly,
            FilingTables {
                ordinary: ordinary_table([
                    dec!(24800),
                    dec!(100800),
                    dec!(211400),
                    dec!(403550),
                    dec!(512450),
                    dec!(768700),
                ]),
                long_term_capital_gains: ltcg_table(dec!(98900), dec!(613700)),
                standard_deduction: dec!(32200),
                niit_threshold: dec!(250000),
            },
        );
        by_status.insert(
            FilingStatus::MarriedFilingSeparately,
            FilingTables {
                ordinary: ordinary_table([
                    dec!(12400),
                    dec!(50400),
                    dec!(105700),
                    dec!(201775),
                    dec!(256225),
                    dec!(384350),
                ]),
                long_term_capital_gains: ltcg_table(dec!(49450), dec!(306850)),
                standard_deduction: dec!(16100),
                niit_threshold: dec!(125000),
            },
        );
        by_status.insert(
            FilingStatus::HeadOfHousehold,
            FilingTables {
                ordinary: ordinary_table([
                    dec!(17700),
                    dec!(67450),
                    dec!(105700),
                    dec!(201750),
                    dec!(256200),
                    dec!(640600),
                ]),
                long_term_capital_gains: ltcg_table(dec!(66200), dec!(579600)),
                standard_deduction: dec!(24150),
                niit_threshold: dec!(200000),
            },
        );

        Self {
            year: 2026,
            niit_rate: dec!(0.038),
            by_status,
        }
    }

    /// Load an override file. Statuses missing from the file are simply absent
    /// and resolve to the single-filer tables at lookup time.
    pub fn from_json_file(path: &Path) -> FinanceResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            FinanceError::Configuration(format!("cannot read tax tables {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> FinanceResult<Self> {
        let raw: RawTaxTables = serde_json::from_str(raw)?;
        let mut by_status = BTreeMap::new();

        for (key, ordinary) in &raw.federal_brackets {
            let status = FilingStatus::parse(key).ok_or_else(|| {
                FinanceError::InvalidInput(format!("unknown filing status '{}' in tax tables", key))
            })?;
            let long_term_capital_gains = raw
                .long_term_capital_gains_rates
                .get(key)
                .cloned()
                .ok_or_else(|| {
                    FinanceError::InvalidInput(format!("no capital gains table for '{}'", key))
                })?;
            let standard_deduction = raw.standard_deduction.get(key).copied().ok_or_else(|| {
                FinanceError::InvalidInput(format!("no standard deduction for '{}'", key))
            })?;
            let niit_threshold = raw
                .niit_threshold
                .get(key)
                .copied()
                .unwrap_or(DEFAULT_NIIT_THRESHOLD);

            by_status.insert(
                status,
                FilingTables {
                    ordinary: ordinary.clone(),
                    long_term_capital_gains,
                    standard_deduction,
                    niit_threshold,
                },
            );
        }

        if by_status.is_empty() {
            return Err(FinanceError::InvalidInput("tax tables contain no filing statuses".to_string()));
        }

        Ok(Self {
            year: raw.year.unwrap_or(2026),
            niit_rate: raw.net_investment_income_tax_rate,
            by_status,
        })
    }

    /// Tables for a status, falling back to single-filer tables.
    pub fn for_status(&self, status: FilingStatus) -> FinanceResult<&FilingTables> {
        self.by_status
            .get(&status)
            .or_else(|| {
                tracing::warn!("No tax tables for {}, using single", status);
                self.by_status.get(&FilingStatus::Single)
            })
            .ok_or_else(|| FinanceError::InvalidInput(format!("no tax tables for {}", status)))
    }
}

fn ordinary_table(bounds: [Decimal; 6]) -> BracketTable {
    let rates = [
        dec!(0.10),
        dec!(0.12),
        dec!(0.22),
        dec!(0.24),
        dec!(0.32),
        dec!(0.35),
        dec!(0.37),
    ];
    let mut brackets = Vec::with_capacity(rates.len());
    let mut lower = Decimal::ZERO;
    for (i, rate) in rates.iter().enumerate() {
        let upper = bounds.get(i).copied();
        brackets.push(TaxBracket::new(lower, upper, *rate));
        if let Some(u) = upper {
            lower = u;
        }
    }
    BracketTable::from_trusted(brackets)
}

fn ltcg_table(zero_rate_top: Decimal, fifteen_rate_top: Decimal) -> BracketTable {
    BracketTable::from_trusted(vec![
        TaxBracket::new(Decimal::ZERO, Some(zero_rate_top), Decimal::ZERO),
        TaxBracket::new(zero_rate_top, Some(fifteen_rate_top), dec!(0.15)),
        TaxBracket::new(fifteen_rate_top, None, dec!(0.20)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_are_valid() {
        let tables = TaxTables::federal_2026();
        assert_eq!(tables.by_status.len(), 4);
        for (status, t) in &tables.by_status {
            assert!(BracketTable::new(t.ordinary.brackets().to_vec()).is_ok(), "{}", status);
            assert!(BracketTable::new(t.long_term_capital_gains.brackets().to_vec()).is_ok(), "{}", status);
            assert_eq!(t.ordinary.brackets().len(), 7);
        }
    }

    #[test]
    fn test_status_lookup() {
        let tables = TaxTables::federal_2026();
        let mfj = tables.for_status(FilingStatus::MarriedFilingJointly).unwrap();
        assert_eq!(mfj.standard_deduction, dec!(32200));
        assert_eq!(mfj.niit_threshold, dec!(250000));
    }

    #[test]
    fn test_override_file_shape() {
        let json = r#"{
            "federal_brackets": {
                "single": [{"min": 0, "max": 10000, "rate": 0.1}, {"min": 10000, "max": null, "rate": 0.3}]
            },
            "long_term_capital_gains_rates": {
                "single": [{"min": 0, "max": null, "rate": 0.15}]
            },
            "standard_deduction": {"single": 15000},
            "net_investment_income_tax_rate": 0.038
        }"#;
        let tables = TaxTables::from_json_str(json).unwrap();
        let single = tables.for_status(FilingStatus::Single).unwrap();
        assert_eq!(single.standard_deduction, dec!(15000));
        assert_eq!(single.niit_threshold, dec!(200000));

        // Unlisted statuses fall back to single.
        let hoh = tables.for_status(FilingStatus::HeadOfHousehold).unwrap();
        assert_eq!(hoh.standard_deduction, dec!(15000));
    }

    #[test]
    fn test_override_with_missing_ltcg_rejected() {
        let json = r#"{
            "federal_brackets": {"single": [{"min": 0, "max": null, "rate": 0.1}]},
            "long_term_capital_gains_rates": {},
            "standard_deduction": {"single": 15000},
            "net_investment_income_tax_rate": 0.038
        }"#;
        assert!(TaxTables::from_json_str(json).is_err());
    }
}
