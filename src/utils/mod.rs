//! Helpers shared by the store-facing code.
//!
//! - [`retry`] - Exponential backoff for transient store failures
//! - [`db_error`] - Classification of SQLx errors as transient or permanent

pub mod db_error;
pub mod retry;
