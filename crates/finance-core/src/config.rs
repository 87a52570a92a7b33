use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{FinanceError, FinanceResult};
use crate::types::FilingStatus;

/// Process-wide settings, built once at startup and passed by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Where the store's exported snapshot lives.
    pub snapshot_path: PathBuf,
    pub filing_status: FilingStatus,
    pub tax_year: i32,
    /// Optional JSON file overriding the built-in bracket tables.
    pub tax_tables_path: Option<PathBuf>,
    /// Date every computation is evaluated against.
    pub reference_date: NaiveDate,
    pub harvest_short_term_rate: Decimal, // 0.37
    pub harvest_long_term_rate: Decimal,  // 0.20
    pub harvest_min_loss: Decimal,        // $1,000
}

impl EngineConfig {
    pub fn from_env() -> FinanceResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> FinanceResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let snapshot_path = get("FINANCE_SNAPSHOT_PATH")
            .map(PathBuf::from)
            .ok_or_else(|| FinanceError::Configuration("FINANCE_SNAPSHOT_PATH not set".to_string()))?;

        let filing_status = match get("FILING_STATUS") {
            Some(raw) => FilingStatus::parse(&raw).ok_or_else(|| {
                FinanceError::Configuration(format!("unknown FILING_STATUS '{}'", raw))
            })?,
            None => FilingStatus::Single,
        };

        let reference_date = match get("REFERENCE_DATE") {
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                FinanceError::Configuration(format!("REFERENCE_DATE '{}' is not YYYY-MM-DD", raw))
            })?,
            None => Utc::now().date_naive(),
        };

        let tax_year = match get("TAX_YEAR") {
            Some(raw) => raw.trim().parse::<i32>().map_err(|_| {
                FinanceError::Configuration(format!("TAX_YEAR '{}' is not a year", raw))
            })?,
            None => reference_date.year(),
        };

        let config = Self {
            snapshot_path,
            filing_status,
            tax_year,
            tax_tables_path: get("TAX_TABLES_PATH").map(PathBuf::from),
            reference_date,
            harvest_short_term_rate: decimal_var(&get, "HARVEST_SHORT_TERM_RATE", dec!(0.37))?,
            harvest_long_term_rate: decimal_var(&get, "HARVEST_LONG_TERM_RATE", dec!(0.20))?,
            harvest_min_loss: decimal_var(&get, "HARVEST_MIN_LOSS", dec!(1000))?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> FinanceResult<()> {
        for (name, rate) in [
            ("HARVEST_SHORT_TERM_RATE", self.harvest_short_term_rate),
            ("HARVEST_LONG_TERM_RATE", self.harvest_long_term_rate),
        ] {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(FinanceError::Configuration(format!(
                    "{} must be between 0 and 1, got {}",
                    name, rate
                )));
            }
        }
        if self.harvest_min_loss < Decimal::ZERO {
            return Err(FinanceError::Configuration(
                "HARVEST_MIN_LOSS must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

fn decimal_var<F>(get: &F, key: &str, default: Decimal) -> FinanceResult<Decimal>
where
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => Decimal::from_str(raw.trim())
            .map_err(|_| FinanceError::Configuration(format!("{} '{}' is not a number", key, raw))),
        None => Ok(default),
    }
}
