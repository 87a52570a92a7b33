//! Budget Monitor
//!
//! Month-to-date budget classification, recurring charge and spending anomaly
//! detection, and rule-based transaction categorization.

pub mod anomaly;
pub mod budget;
pub mod categorizer;
pub mod check;
pub mod recurring;

pub use anomaly::{AnomalyDetector, AnomalyEntry, CategoryAverages};
pub use budget::{month_period, spent_by_category, BudgetMonitor, BudgetStatus, BudgetStatusEntry, BudgetTiers};
pub use categorizer::{CategorizationReport, CategoryAssignment, CategoryRule, KeywordCategorizer};
pub use check::{check_budgets, BudgetCheckReport, BudgetCheckSummary};
pub use recurring::{RecurringChargeDetector, RecurringEntry};
