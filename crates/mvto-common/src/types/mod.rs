//! Type definitions for the MVTO engine.

mod ids;

pub use ids::{ItemId, Tid};

/// The value stored in one version of a data item.
pub type Value = i64;
