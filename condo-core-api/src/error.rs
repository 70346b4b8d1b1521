use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Postgres SQLSTATE codes that signal lock contention rather than a broken statement.
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const LOCK_NOT_AVAILABLE: &str = "55P03";

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("Insufficient credit: {0}")]
    InsufficientCredit(String),

    #[error("Business rule violation: {0}")]
    BusinessRuleViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("Fatal configuration error: {0}")]
    FatalConfiguration(String),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Structured classification handed back to callers alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingErrorKind {
    Validation,
    InsufficientBalance,
    InsufficientCredit,
    BusinessRuleViolation,
    NotFound,
    ConcurrencyConflict,
    FatalConfiguration,
    InvariantViolation,
    Database,
}

impl BillingError {
    pub fn kind(&self) -> BillingErrorKind {
        match self {
            BillingError::Validation(_) => BillingErrorKind::Validation,
            BillingError::InsufficientBalance(_) => BillingErrorKind::InsufficientBalance,
            BillingError::InsufficientCredit(_) => BillingErrorKind::InsufficientCredit,
            BillingError::BusinessRuleViolation(_) => BillingErrorKind::BusinessRuleViolation,
            BillingError::NotFound(_) => BillingErrorKind::NotFound,
            BillingError::ConcurrencyConflict(_) => BillingErrorKind::ConcurrencyConflict,
            BillingError::FatalConfiguration(_) => BillingErrorKind::FatalConfiguration,
            BillingError::InvariantViolation(_) => BillingErrorKind::InvariantViolation,
            BillingError::Database(_) => BillingErrorKind::Database,
        }
    }

    /// Only lock contention is worth retrying; every other kind needs different input or provisioning.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BillingError::ConcurrencyConflict(_))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation(message.into())
    }

    pub fn rule(message: impl Into<String>) -> Self {
        BillingError::BusinessRuleViolation(message.into())
    }

    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        BillingError::NotFound(format!("{entity} {id}"))
    }

    pub(crate) fn from_sql_state(code: Option<&str>, message: String) -> Self {
        match code {
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) | Some(LOCK_NOT_AVAILABLE) => {
                BillingError::ConcurrencyConflict(message)
            }
            _ => BillingError::Database(message),
        }
    }
}

impl From<validator::ValidationErrors> for BillingError {
    fn from(errors: validator::ValidationErrors) -> Self {
        BillingError::Validation(errors.to_string())
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for BillingError {
    fn from(error: sqlx::Error) -> Self {
        let code = match &error {
            sqlx::Error::Database(db_error) => db_error.code().map(|c| c.into_owned()),
            _ => None,
        };
        BillingError::from_sql_state(code.as_deref(), error.to_string())
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for BillingError {
    fn from(error: Box<dyn std::error::Error + Send + Sync>) -> Self {
        #[cfg(feature = "sqlx")]
        let error = match error.downcast::<sqlx::Error>() {
            Ok(sqlx_error) => return BillingError::from(*sqlx_error),
            Err(other) => other,
        };
        BillingError::Database(error.to_string())
    }
}

pub type BillingResult<T> = Result<T, BillingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_contention_codes_are_retryable() {
        for code in ["40001", "40P01", "55P03"] {
            let err = BillingError::from_sql_state(Some(code), "contention".to_string());
            assert_eq!(err.kind(), BillingErrorKind::ConcurrencyConflict);
            assert!(err.is_retryable());
        }
        let err = BillingError::from_sql_state(Some("23505"), "duplicate key".to_string());
        assert_eq!(err.kind(), BillingErrorKind::Database);
        assert!(!err.is_retryable());
    }

    #[test]
    fn boxed_errors_become_database_errors() {
        let boxed: Box<dyn std::error::Error + Send + Sync> = "Transaction has been consumed".into();
        let err = BillingError::from(boxed);
        assert_eq!(err.kind(), BillingErrorKind::Database);
        assert!(err.to_string().contains("Transaction has been consumed"));
    }
}
