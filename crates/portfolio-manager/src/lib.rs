pub mod allocation;
pub mod performance;

pub use allocation::{
    default_target, AllocationDriftCalculator, AllocationReport, AllocationSlice, DriftEntry, RebalanceAction,
    CASH_CLASS,
};
pub use performance::{
    ClassBreakdown, ConcentrationRisk, PerformanceAnalyzer, PerformanceReport, PeriodReturn, PositionSummary,
};
