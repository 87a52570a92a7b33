//! Tax Optimizer
//!
//! Progressive bracket math, federal liability estimation and tax-loss
//! harvesting suggestions with wash sale monitoring.

pub mod brackets;
pub mod harvester;
pub mod income;
pub mod liability;
pub mod tables;
pub mod wash_sale;

pub use brackets::{BracketTable, BracketTaxCalculator, TaxBracket};
pub use harvester::{
    HarvestOpportunity, HarvestPriority, HarvestReport, HarvestingConfig, TaxLossHarvestAnalyzer,
};
pub use income::aggregate_income;
pub use liability::{
    DeductionSummary, IncomeSummary, QuarterlyPayment, TaxBreakdown, TaxLiabilityEstimator,
    TaxSummary,
};
pub use tables::{FilingTables, TaxTables};
pub use wash_sale::{WashSaleCheck, WashSaleWindow};
