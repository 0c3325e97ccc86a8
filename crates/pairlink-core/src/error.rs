//! Common error types for pairlink.
//!
//! This module provides shared error types that are used across multiple crates.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur throughout the pairlink system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A required field was missing or empty.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A destination contained something other than ASCII digits.
    #[error("invalid destination {0:?}: expected digits only (country code + number)")]
    InvalidDestination(String),
}
