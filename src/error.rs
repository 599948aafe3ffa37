//! Error types for the backing-store boundary.
//!
//! Every failure coming out of a [`crate::domain::repositories::ClickStore`]
//! is a [`StoreError`], classified as either transient (connectivity, worth
//! retrying) or permanent (retrying will not change the outcome). A cache
//! miss is not an error and is represented as `None`.

use thiserror::Error;

use crate::utils::db_error::is_transient_sqlx_error;

/// Failure reported by the read or write interface of the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Connectivity-classified failure. Retried by [`crate::utils::retry::RetryPolicy`].
    #[error("transient store error: {0}")]
    Transient(String),

    /// Any other failure (validation, constraint violation, decode error).
    /// Never retried.
    #[error("store error: {0}")]
    Permanent(String),
}

impl StoreError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Permanent(message.into())
    }

    /// Returns true if the failure is likely to succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if is_transient_sqlx_error(&e) {
            Self::Transient(e.to_string())
        } else {
            Self::Permanent(e.to_string())
        }
    }
}
