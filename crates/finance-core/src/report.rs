//! Uniform report envelope.
//!
//! Every analyzer result is emitted as `{"status": "ok", ...}` or
//! `{"status": "error", "message": "..."}`.

use serde::Serialize;

use crate::error::FinanceError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Report<T> {
    Ok(T),
    Error { message: String },
}

impl<T> Report<T> {
    pub fn ok(body: T) -> Self {
        Report::Ok(body)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Report::Error {
            message: message.into(),
        }
    }

    /// Fold a computation result into the envelope so failures never escape raw.
    pub fn from_result(result: Result<T, FinanceError>) -> Self {
        match result {
            Ok(body) => Report::Ok(body),
            Err(e) => {
                tracing::warn!("Computation failed: {}", e);
                Report::error(e.to_string())
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Report::Ok(_))
    }
}
