//! Application layer services.
//!
//! # Available Services
//!
//! - [`services::ClickTracker`] - Cached record lookups and click recording

pub mod services;
