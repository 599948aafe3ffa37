//! Business logic services for the application layer.

pub mod click_tracker;

pub use click_tracker::ClickTracker;
