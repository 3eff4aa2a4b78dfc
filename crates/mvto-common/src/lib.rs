//! # mvto-common
//!
//! Common types, errors, and configuration for the MVTO engine.
//!
//! This crate provides the foundational pieces shared by every MVTO crate:
//!
//! - **Types**: Timestamp (`Tid`) and data item (`ItemId`) identifiers, `Value`
//! - **Errors**: `MvtoError` for everything a driver can observe, and
//!   `OrderViolation` for the recoverable write-rule rejection
//! - **Config**: Engine and workload configuration, loadable from TOML
//! - **Constants**: Defaults for the GC threshold and the workload shape
//!
//! ## Example
//!
//! ```rust
//! use mvto_common::types::{ItemId, Tid};
//! use mvto_common::error::MvtoResult;
//!
//! fn example() -> MvtoResult<()> {
//!     let tid = Tid::new(7);
//!     let item = ItemId::new(3);
//!     assert_eq!(tid.next(), Tid::new(8));
//!     assert_eq!(item.as_u64(), 3);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use constants::*;
pub use error::{MvtoError, MvtoResult, OrderViolation};
pub use types::{ItemId, Tid, Value};
