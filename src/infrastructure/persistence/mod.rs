//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx runtime
//! queries.
//!
//! # Repositories
//!
//! - [`PgClickStore`] - URL record reads and batched counter updates

pub mod pg_click_store;

pub use pg_click_store::PgClickStore;
