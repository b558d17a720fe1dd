//! Utility functions for freshness-timestamp handling.

pub mod timestamps;

pub use timestamps::{parse_freshness, parse_timestamp, Timestamp, TimestampError};
