//! Shared building blocks for the finance analytics engine: decimal helpers,
//! the error taxonomy, typed input snapshots and the report envelope.

pub mod config;
pub mod error;
pub mod numeric;
pub mod report;
pub mod rows;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::*;
pub use report::*;
pub use rows::{convert_rows, FromRow, Row, SkippedRow};
pub use traits::*;
pub use types::*;
