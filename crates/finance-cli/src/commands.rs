//! Command implementations
//!
//! Each command converts the snapshot sections it needs, runs one analyzer and
//! returns a report body. `execute` folds the outcome into the status envelope.

use std::path::Path;

use budget_monitor::{check_budgets, BudgetCheckReport, CategorizationReport, KeywordCategorizer};
use finance_core::{
    convert_rows, BudgetLine, Deduction, EngineConfig, FinanceError, FinanceResult, FinanceSnapshot, HoldingPosition,
    NetWorthSnapshot, Report, SkippedRow, SnapshotSource, TaxDocumentTotals, TransactionRecord,
};
use portfolio_manager::{AllocationDriftCalculator, AllocationReport, PerformanceAnalyzer, PerformanceReport};
use rust_decimal::Decimal;
use serde::Serialize;
use tax_optimizer::{
    aggregate_income, HarvestReport, HarvestingConfig, TaxLiabilityEstimator, TaxLossHarvestAnalyzer, TaxSummary,
    TaxTables,
};

use crate::cli::Commands;

/// Ten years.
const MAX_LOOKBACK_DAYS: i64 = 3650;

/// A report body plus any input rows that were rejected while building it.
/// Rejected rows are listed even when nothing usable was left.
#[derive(Debug, Serialize)]
pub struct WithSkipped<T> {
    #[serde(flatten)]
    pub body: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_rows: Vec<SkippedRow>,
}

impl<T> WithSkipped<Body<T>> {
    fn data(body: T, skipped_rows: Vec<SkippedRow>) -> Self {
        Self {
            body: Body::Data(body),
            skipped_rows,
        }
    }

    fn no_data(message: String, skipped_rows: Vec<SkippedRow>) -> Self {
        tracing::info!("{}", message);
        Self {
            body: Body::NoData { message },
            skipped_rows,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Body<T> {
    Data(T),
    NoData { message: String },
}

type CommandResult<T> = FinanceResult<WithSkipped<Body<T>>>;

/// Rendered report and whether it carries `status: ok`.
#[derive(Debug)]
pub struct Rendered {
    pub ok: bool,
    pub json: serde_json::Value,
}

/// Build the engine configuration, letting `--snapshot` stand in for the
/// snapshot path variable.
pub fn load_config<F>(snapshot_override: Option<&Path>, lookup: F) -> FinanceResult<EngineConfig>
where
    F: Fn(&str) -> Option<String>,
{
    EngineConfig::from_lookup(|key: &str| match (key, snapshot_override) {
        ("FINANCE_SNAPSHOT_PATH", Some(path)) => Some(path.display().to_string()),
        _ => lookup(key),
    })
}

pub fn error_output(error: FinanceError) -> Rendered {
    finish::<()>(Err(error))
}

pub fn execute(command: &Commands, config: &EngineConfig, source: &dyn SnapshotSource) -> Rendered {
    let snapshot = match source.load() {
        Ok(snapshot) => snapshot,
        Err(e) => return error_output(e),
    };

    match command {
        Commands::Tax => finish(tax(config, &snapshot)),
        Commands::Budget => finish(budget(config, &snapshot)),
        Commands::Allocation => finish(allocation(&snapshot)),
        Commands::Harvest { ticker, lookback_days } => {
            finish(harvest(config, &snapshot, ticker.clone(), *lookback_days))
        }
        Commands::Performance => finish(performance(config, &snapshot)),
        Commands::Categorize => finish(categorize(&snapshot)),
    }
}

fn finish<T: Serialize>(result: CommandResult<T>) -> Rendered {
    let report = match result {
        Err(FinanceError::DataUnavailable(message)) => Report::ok(WithSkipped::no_data(message, Vec::new())),
        other => Report::from_result(other),
    };

    let ok = report.is_ok();
    let json = serde_json::to_value(&report).unwrap_or_else(|e| {
        serde_json::json!({ "status": "error", "message": format!("failed to serialize report: {}", e) })
    });
    Rendered { ok, json }
}

pub fn tax(config: &EngineConfig, snapshot: &FinanceSnapshot) -> CommandResult<TaxSummary> {
    let tables = match &config.tax_tables_path {
        Some(path) => TaxTables::from_json_file(path)?,
        None => TaxTables::federal_2026(),
    };
    if tables.year != config.tax_year {
        tracing::warn!("Tax tables are for {}, estimating {}", tables.year, config.tax_year);
    }
    let filing = tables.for_status(config.filing_status)?;

    let (documents, skipped) = convert_rows::<TaxDocumentTotals>(&snapshot.income_documents);
    if documents.is_empty() {
        let message = format!("No income documents found for {}", config.tax_year);
        return Ok(WithSkipped::no_data(message, skipped));
    }

    let income = aggregate_income(&documents);
    let deduction = Deduction {
        standard_amount: filing.standard_deduction,
        itemized_amount: snapshot.itemized_deductions.unwrap_or(Decimal::ZERO),
    };
    let estimator = TaxLiabilityEstimator::from_tables(filing, tables.niit_rate, config.filing_status);
    let summary = estimator.estimate(
        &income,
        deduction,
        snapshot.estimated_payments.unwrap_or(Decimal::ZERO),
        config.tax_year,
        config.reference_date,
    )?;
    Ok(WithSkipped::data(summary, skipped))
}

pub fn budget(config: &EngineConfig, snapshot: &FinanceSnapshot) -> CommandResult<BudgetCheckReport> {
    let (budgets, mut skipped) = convert_rows::<BudgetLine>(&snapshot.budgets);
    let (transactions, skipped_txns) = convert_rows::<TransactionRecord>(&snapshot.transactions);
    skipped.extend(skipped_txns);

    let report = check_budgets(&budgets, &transactions, config.reference_date)?;
    Ok(WithSkipped::data(report, skipped))
}

pub fn allocation(snapshot: &FinanceSnapshot) -> CommandResult<AllocationReport> {
    let (holdings, skipped) = convert_rows::<HoldingPosition>(&snapshot.holdings);
    let cash = snapshot.cash_balance.unwrap_or(Decimal::ZERO);
    if holdings.is_empty() && cash.is_zero() {
        return Ok(WithSkipped::no_data("No holdings or cash balances found".to_string(), skipped));
    }

    let report = AllocationDriftCalculator::analyze(&holdings, cash, snapshot.target_allocation.as_ref());
    Ok(WithSkipped::data(report, skipped))
}

pub fn harvest(
    config: &EngineConfig,
    snapshot: &FinanceSnapshot,
    ticker: Option<String>,
    lookback_days: i64,
) -> CommandResult<HarvestReport> {
    if !(0..=MAX_LOOKBACK_DAYS).contains(&lookback_days) {
        return Err(FinanceError::InvalidInput(format!(
            "lookback days must be between 0 and {}, got {}",
            MAX_LOOKBACK_DAYS, lookback_days
        )));
    }

    let (holdings, mut skipped) = convert_rows::<HoldingPosition>(&snapshot.holdings);
    let (transactions, skipped_txns) = convert_rows::<TransactionRecord>(&snapshot.transactions);
    skipped.extend(skipped_txns);

    let harvest_config = HarvestingConfig::from_engine(config)
        .with_ticker(ticker)
        .with_window_days(lookback_days);
    let report = TaxLossHarvestAnalyzer::new(harvest_config).analyze(&holdings, &transactions, config.reference_date);
    Ok(WithSkipped::data(report, skipped))
}

pub fn performance(config: &EngineConfig, snapshot: &FinanceSnapshot) -> CommandResult<PerformanceReport> {
    let (holdings, mut skipped) = convert_rows::<HoldingPosition>(&snapshot.holdings);
    let (snapshots, skipped_snapshots) = convert_rows::<NetWorthSnapshot>(&snapshot.net_worth_snapshots);
    skipped.extend(skipped_snapshots);

    if holdings.is_empty() {
        return Ok(WithSkipped::no_data("No holdings found".to_string(), skipped));
    }

    let report = PerformanceAnalyzer::analyze(&holdings, &snapshots, config.reference_date);
    Ok(WithSkipped::data(report, skipped))
}

pub fn categorize(snapshot: &FinanceSnapshot) -> CommandResult<CategorizationReport> {
    let (transactions, skipped) = convert_rows::<TransactionRecord>(&snapshot.transactions);
    let report = KeywordCategorizer::with_default_rules()?.run(&transactions);
    Ok(WithSkipped::data(report, skipped))
}
