use thiserror::Error;

/// Rejections raised at the ledger's mutation boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("Category already exists: {0}")]
    DuplicateCategory(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),
}

impl LedgerError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}
