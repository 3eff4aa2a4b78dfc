//! Transaction execution with abort-and-retry.
//!
//! # Executor States
//!
//! ```text
//! ┌──────┐  run()   ┌─────────┐  all steps ok   ┌───────────┐
//! │ Idle │─────────▶│ Running │────────────────▶│ Committed │
//! └──────┘          └─────────┘                 └───────────┘
//!                     ▲     │
//!          new tid    │     │ write rejected
//!                     │     ▼
//!               ┌─────────────────┐
//!               │ AbortedRetrying │
//!               └─────────────────┘
//! ```
//!
//! Every attempt runs under its own timestamp and a fresh working set. The
//! timestamp is released at the end of the attempt whether it commits,
//! aborts, or fails. Versions written by an aborted attempt stay in place
//! under the dead timestamp; no later reader is ever issued that timestamp,
//! so they are inert until collected.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use mvto_common::constants::DEFAULT_WRITE_VALUE;
use mvto_common::error::{MvtoResult, OrderViolation};
use mvto_common::types::{ItemId, Tid, Value};
use mvto_mvcc::Store;
use tracing::{debug, warn};

use crate::step::{StepKind, Transaction};

/// Where an executor is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    /// Not started.
    Idle,
    /// An attempt is executing under `tid`.
    Running {
        /// Timestamp of the current attempt.
        tid: Tid,
    },
    /// The attempt under `tid` was rejected and will be replayed.
    AbortedRetrying {
        /// Timestamp of the failed attempt.
        tid: Tid,
        /// The write rule that rejected it.
        violation: OrderViolation,
    },
    /// Committed under `tid`.
    Committed {
        /// Timestamp of the committing attempt.
        tid: Tid,
    },
}

impl ExecutorState {
    /// Returns true once the transaction has committed.
    pub fn is_committed(&self) -> bool {
        matches!(self, ExecutorState::Committed { .. })
    }
}

impl fmt::Display for ExecutorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorState::Idle => write!(f, "Idle"),
            ExecutorState::Running { tid } => write!(f, "Running({})", tid),
            ExecutorState::AbortedRetrying { tid, .. } => write!(f, "AbortedRetrying({})", tid),
            ExecutorState::Committed { tid } => write!(f, "Committed({})", tid),
        }
    }
}

/// Result of running a transaction to commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxnOutcome {
    /// Timestamp of the committing attempt.
    pub tid: Tid,
    /// Number of aborted attempts before the commit.
    pub aborts: u64,
}

impl TxnOutcome {
    /// Returns the total number of attempts, including the committing one.
    pub fn attempts(&self) -> u64 {
        self.aborts + 1
    }
}

/// Counters shared by executors.
#[derive(Debug, Default)]
pub struct TransactionStats {
    /// Transactions committed.
    pub committed: AtomicU64,
    /// Attempts aborted by the write rule.
    pub aborted: AtomicU64,
    /// Attempts started.
    pub attempts: AtomicU64,
}

impl TransactionStats {
    /// Creates new stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of committed transactions.
    pub fn committed(&self) -> u64 {
        self.committed.load(AtomicOrdering::Relaxed)
    }

    /// Returns the number of aborted attempts.
    pub fn aborted(&self) -> u64 {
        self.aborted.load(AtomicOrdering::Relaxed)
    }

    /// Returns the number of started attempts.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(AtomicOrdering::Relaxed)
    }
}

/// Outcome of a single attempt.
enum Attempt {
    Completed,
    Rejected(OrderViolation),
}

fn increment(value: Value) -> Value {
    value.wrapping_add(1)
}

/// Runs one transaction against a store until it commits.
pub struct TransactionExecutor<'a> {
    store: &'a Store,
    transaction: &'a Transaction,
    transform: fn(Value) -> Value,
    stats: Option<&'a TransactionStats>,
    state: ExecutorState,
}

impl<'a> TransactionExecutor<'a> {
    /// Creates an idle executor.
    pub fn new(store: &'a Store, transaction: &'a Transaction) -> Self {
        Self {
            store,
            transaction,
            transform: increment,
            stats: None,
            state: ExecutorState::Idle,
        }
    }

    /// Replaces the function applied to every value read. Defaults to
    /// adding one.
    pub fn with_transform(mut self, transform: fn(Value) -> Value) -> Self {
        self.transform = transform;
        self
    }

    /// Reports attempts, aborts, and commits into `stats`.
    pub fn with_stats(mut self, stats: &'a TransactionStats) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Returns the current state.
    pub fn state(&self) -> ExecutorState {
        self.state
    }

    /// Runs attempts until one commits.
    ///
    /// Write-rule rejections are retried without limit and only show up in
    /// the returned abort count. Any other error releases the current
    /// timestamp and is returned as is.
    pub fn run(&mut self) -> MvtoResult<TxnOutcome> {
        let mut aborts = 0;

        loop {
            let tid = self.store.issue_timestamp();
            self.state = ExecutorState::Running { tid };
            if let Some(stats) = self.stats {
                stats.attempts.fetch_add(1, AtomicOrdering::Relaxed);
            }

            let attempt = match self.attempt(tid) {
                Ok(attempt) => attempt,
                Err(err) => {
                    if let Err(release_err) = self.store.release_timestamp(tid) {
                        warn!(%tid, error = %release_err, "release after failed attempt");
                    }
                    return Err(err);
                }
            };
            self.store.release_timestamp(tid)?;

            match attempt {
                Attempt::Completed => {
                    self.state = ExecutorState::Committed { tid };
                    if let Some(stats) = self.stats {
                        stats.committed.fetch_add(1, AtomicOrdering::Relaxed);
                    }
                    return Ok(TxnOutcome { tid, aborts });
                }
                Attempt::Rejected(violation) => {
                    debug!(
                        item = %violation.item,
                        writer = %violation.writer,
                        read_version = %violation.read_version,
                        reader = %violation.reader,
                        "abort"
                    );
                    self.store.record_abort();
                    if let Some(stats) = self.stats {
                        stats.aborted.fetch_add(1, AtomicOrdering::Relaxed);
                    }
                    aborts += 1;
                    self.state = ExecutorState::AbortedRetrying { tid, violation };
                }
            }
        }
    }

    /// Executes every step once under `tid`.
    fn attempt(&self, tid: Tid) -> MvtoResult<Attempt> {
        let mut working_set: HashMap<ItemId, Value> = HashMap::new();

        for step in self.transaction.steps() {
            let item = self.store.item(step.item)?;
            match step.kind {
                StepKind::Read => {
                    let value = item.read(tid)?;
                    working_set.insert(step.item, (self.transform)(value));
                }
                StepKind::Write => {
                    let value = working_set
                        .get(&step.item)
                        .copied()
                        .unwrap_or(DEFAULT_WRITE_VALUE);
                    if let Err(violation) = item.write(tid, value) {
                        return Ok(Attempt::Rejected(violation));
                    }
                }
            }
        }

        Ok(Attempt::Completed)
    }
}

/// Executes `transaction` to commit and reports how many aborts it took.
pub fn submit_transaction(store: &Store, transaction: &Transaction) -> MvtoResult<TxnOutcome> {
    TransactionExecutor::new(store, transaction).run()
}
