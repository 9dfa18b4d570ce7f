//! Quota Error Types
//!
//! Errors returned by tracker construction and named-limit operations.
//! A denied check is not an error; it is reported as `false`.

use std::time::Duration;

/// Error types for quota operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuotaError {
    /// A positive capacity was requested without a usable window
    #[error("Invalid configuration: window {window:?} for capacity {capacity}")]
    InvalidConfiguration {
        /// Requested capacity
        capacity: u32,
        /// Requested window
        window: Duration,
    },

    /// Named limits need a non-empty name
    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    /// A named limit with this name is already registered
    #[error("Named limit '{0}' already exists")]
    AlreadyExists(String),

    /// No named limit with this name is registered
    #[error("Named limit '{0}' does not exist")]
    NotFound(String),
}

/// Result alias for quota operations
pub type Result<T> = std::result::Result<T, QuotaError>;
