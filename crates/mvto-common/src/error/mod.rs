//! Error handling for the MVTO engine.
//!
//! Two kinds of failure exist. [`OrderViolation`] is the expected outcome of
//! a rejected write and never leaves the transaction executor. [`MvtoError`]
//! covers everything a driver can observe.

mod engine;

pub use engine::{MvtoError, OrderViolation};

/// Result type alias for MVTO operations.
pub type MvtoResult<T> = std::result::Result<T, MvtoError>;
