//! # mvto-test
//!
//! Integration tests for the MVTO engine.
//!
//! This crate contains:
//! - Scenario builders shared by the end-to-end tests
//! - End-to-end tests under `tests/`

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Test utilities and helpers
pub mod utils;
