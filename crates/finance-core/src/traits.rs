use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{FinanceError, FinanceResult};
use crate::rows::Row;

/// Everything the external store exports for one invocation.
///
/// Each section is optional: sync collaborators that have never run simply
/// leave their section empty and the analyzers report "no data".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinanceSnapshot {
    #[serde(default)]
    pub income_documents: Vec<Row>,
    #[serde(default)]
    pub estimated_payments: Option<Decimal>,
    #[serde(default)]
    pub itemized_deductions: Option<Decimal>,
    #[serde(default)]
    pub budgets: Vec<Row>,
    #[serde(default)]
    pub transactions: Vec<Row>,
    #[serde(default)]
    pub holdings: Vec<Row>,
    #[serde(default)]
    pub cash_balance: Option<Decimal>,
    #[serde(default)]
    pub target_allocation: Option<BTreeMap<String, Decimal>>,
    #[serde(default)]
    pub net_worth_snapshots: Vec<Row>,
}

/// Source of input snapshots (database export, sync job output, fixtures).
pub trait SnapshotSource {
    fn load(&self) -> FinanceResult<FinanceSnapshot>;
}

/// Reads a snapshot exported as a JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSource for JsonFileSource {
    fn load(&self) -> FinanceResult<FinanceSnapshot> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            FinanceError::Configuration(format!(
                "cannot read snapshot {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let snapshot: FinanceSnapshot = serde_json::from_str(&raw)?;
        tracing::debug!(
            "Loaded snapshot {}: {} transactions, {} holdings, {} budgets",
            self.path.display(),
            snapshot.transactions.len(),
            snapshot.holdings.len(),
            snapshot.budgets.len()
        );
        Ok(snapshot)
    }
}

/// An in-memory source, used by tests and by callers that already hold rows.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    snapshot: FinanceSnapshot,
}

impl StaticSource {
    pub fn new(snapshot: FinanceSnapshot) -> Self {
        Self { snapshot }
    }
}

impl SnapshotSource for StaticSource {
    fn load(&self) -> FinanceResult<FinanceSnapshot> {
        Ok(self.snapshot.clone())
    }
}
