use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured error returned by every fallible roster operation.
///
/// `code` is a stable SCREAMING_SNAKE identifier grouped by layer (`DB_*`, `INGEST_*`,
/// `SETTINGS_*`, `EXPORT_*`); hosts match on it instead of parsing `message`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "[{}] {} ({details})", self.code, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn display_includes_details_when_present() {
        let err = AppError::new("DB_QUERY_FAILED", "query failed").with_details("no such table");
        assert_eq!(err.to_string(), "[DB_QUERY_FAILED] query failed (no such table)");

        let bare = AppError::new("EXPORT_CSV_FAILED", "export failed");
        assert_eq!(bare.to_string(), "[EXPORT_CSV_FAILED] export failed");
    }
}
