//! System-wide constants for the MVTO engine.

// =============================================================================
// Engine Constants
// =============================================================================

/// Minimum distance the GC watermark must advance before a sweep runs.
///
/// A sweep touches every item, so it is amortized over at least this many
/// finished transactions.
pub const DEFAULT_GC_THRESHOLD: u64 = 100;

/// Value stored in the sentinel version 0 of every item.
pub const DEFAULT_INITIAL_VALUE: i64 = 0;

/// Value written when a transaction writes an item it has not read.
pub const DEFAULT_WRITE_VALUE: i64 = 0;

// =============================================================================
// Workload Defaults
// =============================================================================

/// Default number of worker threads.
pub const DEFAULT_THREADS: usize = 4;

/// Default number of data items.
pub const DEFAULT_ITEMS: usize = 5;

/// Default total number of transactions across all workers.
pub const DEFAULT_TRANSACTIONS: usize = 3_000;

/// Default number of steps per transaction.
pub const DEFAULT_STEPS_PER_TXN: usize = 30;

/// Default probability that a generated step is a read.
pub const DEFAULT_READ_PROBABILITY: f64 = 0.5;

/// Default seed for workload generation.
pub const DEFAULT_SEED: u64 = 42;
