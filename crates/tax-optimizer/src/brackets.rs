//! Progressive Bracket Math
//!
//! Applies an ordered bracket table to an amount. A boundary value belongs to
//! the lower bracket: income exactly at a lower bound adds nothing to it.

use finance_core::{FinanceError, FinanceResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One tier of a progressive table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    #[serde(alias = "min")]
    pub lower_bound: Decimal,
    /// `None` marks the open-ended top bracket.
    #[serde(alias = "max")]
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxBracket {
    pub fn new(lower_bound: Decimal, upper_bound: Option<Decimal>, rate: Decimal) -> Self {
        Self {
            lower_bound,
            upper_bound,
            rate,
        }
    }
}

/// A validated, contiguous, strictly ascending bracket table whose last entry
/// (and only the last) is open-ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TaxBracket>", into = "Vec<TaxBracket>")]
pub struct BracketTable {
    brackets: Vec<TaxBracket>,
}

impl BracketTable {
    pub fn new(brackets: Vec<TaxBracket>) -> FinanceResult<Self> {
        validate(&brackets)?;
        Ok(Self { brackets })
    }

    /// A single bracket covering `[0, ∞)`.
    pub fn flat(rate: Decimal) -> FinanceResult<Self> {
        Self::new(vec![TaxBracket::new(Decimal::ZERO, None, rate)])
    }

    /// Construct from constants that are covered by the table tests.
    pub(crate) fn from_trusted(brackets: Vec<TaxBracket>) -> Self {
        debug_assert!(validate(&brackets).is_ok());
        Self { brackets }
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    /// Rate of the highest bracket whose lower bound is strictly below `amount`.
    pub fn marginal_rate(&self, amount: Decimal) -> Decimal {
        self.brackets
            .iter()
            .rev()
            .find(|b| amount > b.lower_bound)
            .map(|b| b.rate)
            .unwrap_or(Decimal::ZERO)
    }
}

impl TryFrom<Vec<TaxBracket>> for BracketTable {
    type Error = FinanceError;

    fn try_from(brackets: Vec<TaxBracket>) -> Result<Self, Self::Error> {
        Self::new(brackets)
    }
}

impl From<BracketTable> for Vec<TaxBracket> {
    fn from(table: BracketTable) -> Self {
        table.brackets
    }
}

fn validate(brackets: &[TaxBracket]) -> FinanceResult<()> {
    let invalid = |msg: String| Err(FinanceError::InvalidBracketTable(msg));

    let Some(first) = brackets.first() else {
        return invalid("table has no brackets".to_string());
    };
    if first.lower_bound < Decimal::ZERO {
        return invalid(format!("first lower bound {} is negative", first.lower_bound));
    }

    let last_index = brackets.len() - 1;
    for (i, bracket) in brackets.iter().enumerate() {
        if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
            return invalid(format!("bracket {} rate {} outside [0, 1]", i, bracket.rate));
        }
        match bracket.upper_bound {
            None if i != last_index => {
                return invalid(format!("bracket {} is open-ended but is not the last", i));
            }
            None => {}
            Some(_) if i == last_index => {
                return invalid("last bracket must be open-ended".to_string());
            }
            Some(upper) => {
                if upper <= bracket.lower_bound {
                    return invalid(format!(
                        "bracket {} upper bound {} not above lower bound {}",
                        i, upper, bracket.lower_bound
                    ));
                }
                let next = &brackets[i + 1];
                if next.lower_bound != upper {
                    return invalid(format!(
                        "gap between bracket {} (ends {}) and bracket {} (starts {})",
                        i,
                        upper,
                        i + 1,
                        next.lower_bound
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Progressive tax over a bracket table.
pub struct BracketTaxCalculator;

impl BracketTaxCalculator {
    /// Total tax owed on `amount`. Unrounded; callers round at the report boundary.
    pub fn calculate(amount: Decimal, table: &BracketTable) -> FinanceResult<Decimal> {
        if amount < Decimal::ZERO {
            return Err(FinanceError::InvalidInput(format!(
                "taxable amount {} is negative",
                amount
            )));
        }

        let mut tax = Decimal::ZERO;
        for bracket in table.brackets() {
            if amount <= bracket.lower_bound {
                break;
            }
            let top = match bracket.upper_bound {
                Some(upper) => amount.min(upper),
                None => amount,
            };
            tax += (top - bracket.lower_bound) * bracket.rate;
        }
        Ok(tax)
    }
}
