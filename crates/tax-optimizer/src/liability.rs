//! Federal Liability Estimator
//!
//! Ordinary tax on wages, interest and dividends after the larger of the
//! standard or itemized deduction; all capital gains are treated as long-term;
//! NIIT applies to total income above the filing-status threshold.

use chrono::NaiveDate;
use finance_core::numeric::{percent_of, round_currency, round_percent};
use finance_core::{Deduction, FilingStatus, FinanceError, FinanceResult, IncomeAggregate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::brackets::{BracketTable, BracketTaxCalculator};
use crate::tables::FilingTables;

/// Estimated-payment due dates as (quarter, month, day, year offset).
const QUARTERLY_DUE_DATES: [(u8, u32, u32, i32); 4] = [(1, 4, 15, 0), (2, 6, 16, 0), (3, 9, 15, 0), (4, 1, 15, 1)];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeSummary {
    pub w2_wages: Decimal,
    pub interest: Decimal,
    pub dividends: Decimal,
    pub capital_gains: Decimal,
    /// Wages + interest + dividends.
    pub gross_income: Decimal,
    /// Gross income plus capital gains.
    pub total_income: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionSummary {
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub federal_ordinary: Decimal,
    pub ltcg: Decimal,
    pub niit: Decimal,
    pub total_federal: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyPayment {
    pub quarter: u8,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    pub remaining: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSummary {
    pub year: i32,
    pub filing_status: FilingStatus,
    pub income: IncomeSummary,
    pub deduction: DeductionSummary,
    pub taxable_income: Decimal,
    pub tax: TaxBreakdown,
    pub effective_rate_pct: Decimal,
    pub marginal_rate_pct: Decimal,
    pub withholding: Decimal,
    pub estimated_payments_paid: Decimal,
    pub balance_due: Decimal,
    pub quarterly_payment: Decimal,
    pub quarters_remaining: usize,
    pub quarterly_schedule: Vec<QuarterlyPayment>,
}

/// Estimator bound to one filing status' tables.
pub struct TaxLiabilityEstimator {
    ordinary: BracketTable,
    long_term_capital_gains: BracketTable,
    niit_threshold: Decimal,
    niit_rate: Decimal,
    filing_status: FilingStatus,
}

impl TaxLiabilityEstimator {
    pub fn new(
        ordinary: BracketTable,
        long_term_capital_gains: BracketTable,
        niit_threshold: Decimal,
        niit_rate: Decimal,
        filing_status: FilingStatus,
    ) -> Self {
        Self {
            ordinary,
            long_term_capital_gains,
            niit_threshold,
            niit_rate,
            filing_status,
        }
    }

    pub fn from_tables(tables: &FilingTables, niit_rate: Decimal, filing_status: FilingStatus) -> Self {
        Self::new(
            tables.ordinary.clone(),
            tables.long_term_capital_gains.clone(),
            tables.niit_threshold,
            niit_rate,
            filing_status,
        )
    }

    pub fn estimate(
        &self,
        income: &IncomeAggregate,
        deduction: Deduction,
        estimated_payments_paid: Decimal,
        tax_year: i32,
        reference_date: NaiveDate,
    ) -> FinanceResult<TaxSummary> {
        validate_income(income)?;

        let capital_gains = income.capital_gains_net.max(Decimal::ZERO);
        let gross_income = income.wages + income.interest_income + income.ordinary_dividends;
        let effective_deduction = deduction.effective();
        let taxable_income = (gross_income - effective_deduction).max(Decimal::ZERO);

        let federal_ordinary = BracketTaxCalculator::calculate(taxable_income, &self.ordinary)?;
        let ltcg = BracketTaxCalculator::calculate(capital_gains, &self.long_term_capital_gains)?;
        let total_income = gross_income + capital_gains;
        let niit = (total_income - self.niit_threshold).max(Decimal::ZERO) * self.niit_rate;
        let total_federal = federal_ordinary + ltcg + niit;

        let marginal_rate = self.ordinary.marginal_rate(taxable_income);
        let effective_rate_pct = percent_of(total_federal, total_income);
        let balance_due = total_federal - income.tax_withheld - estimated_payments_paid;

        let quarterly_amount = total_federal / Decimal::from(4);
        let quarterly_schedule = quarterly_schedule(tax_year, reference_date, quarterly_amount)?;
        let quarters_remaining = quarterly_schedule.iter().filter(|q| q.remaining).count();

        tracing::info!(
            "Estimated {} {} liability: total {} (ordinary {}, ltcg {}, niit {}), balance due {}",
            tax_year,
            self.filing_status,
            round_currency(total_federal),
            round_currency(federal_ordinary),
            round_currency(ltcg),
            round_currency(niit),
            round_currency(balance_due)
        );

        Ok(TaxSummary {
            year: tax_year,
            filing_status: self.filing_status,
            income: IncomeSummary {
                w2_wages: round_currency(income.wages),
                interest: round_currency(income.interest_income),
                dividends: round_currency(income.ordinary_dividends),
                capital_gains: round_currency(capital_gains),
                gross_income: round_currency(gross_income),
                total_income: round_currency(total_income),
            },
            deduction: DeductionSummary {
                amount: round_currency(effective_deduction),
                kind: deduction.kind().to_string(),
            },
            taxable_income: round_currency(taxable_income),
            tax: TaxBreakdown {
                federal_ordinary: round_currency(federal_ordinary),
                ltcg: round_currency(ltcg),
                niit: round_currency(niit),
                total_federal: round_currency(total_federal),
            },
            effective_rate_pct: round_percent(effective_rate_pct),
            marginal_rate_pct: round_percent(marginal_rate * Decimal::ONE_HUNDRED),
            withholding: round_currency(income.tax_withheld),
            estimated_payments_paid: round_currency(estimated_payments_paid),
            balance_due: round_currency(balance_due),
            quarterly_payment: round_currency(quarterly_amount),
            quarters_remaining,
            quarterly_schedule,
        })
    }
}

fn validate_income(income: &IncomeAggregate) -> FinanceResult<()> {
    for (field, value) in [
        ("wages", income.wages),
        ("interest_income", income.interest_income),
        ("ordinary_dividends", income.ordinary_dividends),
        ("tax_withheld", income.tax_withheld),
    ] {
        if value < Decimal::ZERO {
            return Err(FinanceError::InvalidInput(format!("{} is negative: {}", field, value)));
        }
    }
    Ok(())
}

/// Fixed calendar of estimated-payment due dates; a date counts as remaining
/// when it falls on or after the reference date.
fn quarterly_schedule(
    tax_year: i32,
    reference_date: NaiveDate,
    amount: Decimal,
) -> FinanceResult<Vec<QuarterlyPayment>> {
    QUARTERLY_DUE_DATES
        .iter()
        .map(|&(quarter, month, day, year_offset)| {
            let due_date = tax_year
                .checked_add(year_offset)
                .and_then(|year| NaiveDate::from_ymd_opt(year, month, day))
                .ok_or_else(|| FinanceError::InvalidInput(format!("tax year {} out of range", tax_year)))?;
            Ok(QuarterlyPayment {
                quarter,
                due_date,
                amount: round_currency(amount),
                remaining: due_date >= reference_date,
            })
        })
        .collect()
}
