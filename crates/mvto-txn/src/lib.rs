//! # mvto-txn
//!
//! Transaction execution for the MVTO engine.
//!
//! This crate provides:
//!
//! - **Steps and Transactions**: Immutable read/write step sequences over
//!   data items.
//!
//! - **Executor**: The `Running -> AbortedRetrying -> Running -> Committed`
//!   state machine. A rejected write discards the attempt and the whole
//!   sequence replays under a fresh timestamp until it commits.
//!
//! - **Workload**: A seeded generator of random transaction batches.
//!
//! - **Runner**: One OS thread per batch over a shared store, with
//!   per-worker throughput and abort counts.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  run_workload                                        │
//! │     │ one thread per batch                           │
//! │     ▼                                                │
//! │  TransactionExecutor ──issue/release──▶ Authority    │
//! │     │                                     │          │
//! │     │ read / write                        │ GC       │
//! │     ▼                                     ▼          │
//! │  VersionedItem  ◀──────────────────────  Store       │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use mvto_common::config::EngineConfig;
//! use mvto_common::types::ItemId;
//! use mvto_mvcc::Store;
//! use mvto_txn::{submit_transaction, Step, Transaction};
//!
//! let store = Store::with_item_count(2, EngineConfig::default()).unwrap();
//! let txn = Transaction::new(vec![Step::read(ItemId::new(0)), Step::write(ItemId::new(0))]);
//!
//! let outcome = submit_transaction(&store, &txn).unwrap();
//! assert_eq!(outcome.aborts, 0);
//! assert_eq!(store.report().items[0].latest_value(), Some(1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Transaction steps
pub mod step;

/// Transaction execution and retry
pub mod executor;

/// Workload generation
pub mod workload;

/// Threaded workload runner
pub mod runner;

pub use executor::{
    submit_transaction, ExecutorState, TransactionExecutor, TransactionStats, TxnOutcome,
};
pub use runner::{run_workload, RunReport, WorkerReport};
pub use step::{Step, StepKind, Transaction};
pub use workload::WorkloadGenerator;
