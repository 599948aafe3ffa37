//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract for data operations; implementations live in
//! `crate::infrastructure::persistence`. Mock implementations are
//! auto-generated via `mockall` for unit tests.

pub mod click_store;

pub use click_store::ClickStore;

#[cfg(test)]
pub use click_store::MockClickStore;
