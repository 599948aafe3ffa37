//! Core domain entities.
//!
//! - [`UrlRecord`] - A shortened URL with its click counters

pub mod url_record;

pub use url_record::UrlRecord;
