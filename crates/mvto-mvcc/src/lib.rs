//! # mvto-mvcc
//!
//! Multi-version timestamp ordering storage.
//!
//! This crate implements:
//! - Versioned data items with the MVTO read and write rules
//! - The timestamp authority and its GC watermark
//! - Watermark-driven garbage collection
//! - Snapshots for end-of-run reporting and invariant checks

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Versioned data items
pub mod version;

/// Item snapshots
pub mod snapshot;

/// Timestamp issuance
pub mod timestamp;

/// Garbage collection bookkeeping
pub mod gc;

/// The shared store
pub mod store;

pub use gc::{GcResult, GcStats};
pub use snapshot::ItemSnapshot;
pub use store::{Store, StoreReport, StoreStats};
pub use timestamp::TimestampAuthority;
pub use version::VersionedItem;
