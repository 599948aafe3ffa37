//! Domain layer containing business entities and logic.
//!
//! Defines the record type, the pending click delta, the store contract, and
//! the aggregator that coalesces clicks before they reach the store. Nothing
//! here depends on PostgreSQL.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`click_delta`] - Per-key counter increments awaiting a flush
//! - [`click_aggregator`] - Buffering and single-flight batch flushing
//!
//! # Click Processing Flow
//!
//! 1. A caller records a click through [`crate::application::services::ClickTracker`]
//! 2. [`click_aggregator::ClickAggregator::enqueue`] merges it into the key's pending delta
//! 3. A flush task snapshots the buffer and writes it via [`repositories::ClickStore`]
//! 4. On success the cached records for the flushed keys are invalidated;
//!    on failure the batch is merged back into the buffer

pub mod click_aggregator;
pub mod click_delta;
pub mod entities;
pub mod repositories;
