use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinanceError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No data available: {0}")]
    DataUnavailable(String),

    #[error("Invalid bracket table: {0}")]
    InvalidBracketTable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type FinanceResult<T> = Result<T, FinanceError>;
