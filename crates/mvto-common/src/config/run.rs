//! Run configuration structures.
//!
//! A run is described by two sections: the engine settings that shape the
//! store, and the workload settings consumed by the driver.
//!
//! ```toml
//! [engine]
//! gc_threshold = 100
//! initial_value = 0
//!
//! [workload]
//! threads = 4
//! items = 5
//! transactions = 3000
//! steps_per_txn = 30
//! read_probability = 0.5
//! seed = 42
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_GC_THRESHOLD, DEFAULT_INITIAL_VALUE, DEFAULT_ITEMS, DEFAULT_READ_PROBABILITY,
    DEFAULT_SEED, DEFAULT_STEPS_PER_TXN, DEFAULT_THREADS, DEFAULT_TRANSACTIONS,
};
use crate::error::{MvtoError, MvtoResult};
use crate::types::Value;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum watermark advance that triggers a GC sweep.
    #[serde(default = "default_gc_threshold")]
    pub gc_threshold: u64,

    /// Value of the sentinel version of every item.
    #[serde(default = "default_initial_value")]
    pub initial_value: Value,
}

fn default_gc_threshold() -> u64 {
    DEFAULT_GC_THRESHOLD
}

fn default_initial_value() -> Value {
    DEFAULT_INITIAL_VALUE
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gc_threshold: default_gc_threshold(),
            initial_value: default_initial_value(),
        }
    }
}

impl EngineConfig {
    /// Sets the GC threshold.
    pub fn with_gc_threshold(mut self, gc_threshold: u64) -> Self {
        self.gc_threshold = gc_threshold;
        self
    }

    /// Sets the sentinel value.
    pub fn with_initial_value(mut self, initial_value: Value) -> Self {
        self.initial_value = initial_value;
        self
    }
}

/// Workload configuration for the driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadConfig {
    /// Number of worker threads.
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Number of data items in the store.
    #[serde(default = "default_items")]
    pub items: usize,

    /// Total number of transactions across all workers.
    #[serde(default = "default_transactions")]
    pub transactions: usize,

    /// Number of steps in every transaction.
    #[serde(default = "default_steps_per_txn")]
    pub steps_per_txn: usize,

    /// Probability that a step is a read rather than a write.
    #[serde(default = "default_read_probability")]
    pub read_probability: f64,

    /// Seed for the workload generator.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_threads() -> usize {
    DEFAULT_THREADS
}

fn default_items() -> usize {
    DEFAULT_ITEMS
}

fn default_transactions() -> usize {
    DEFAULT_TRANSACTIONS
}

fn default_steps_per_txn() -> usize {
    DEFAULT_STEPS_PER_TXN
}

fn default_read_probability() -> f64 {
    DEFAULT_READ_PROBABILITY
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            items: default_items(),
            transactions: default_transactions(),
            steps_per_txn: default_steps_per_txn(),
            read_probability: default_read_probability(),
            seed: default_seed(),
        }
    }
}

impl WorkloadConfig {
    /// Splits the total transaction count across workers.
    ///
    /// The remainder goes to the lowest-numbered workers, so the counts
    /// differ by at most one and always sum to `transactions`.
    pub fn transactions_per_worker(&self) -> Vec<usize> {
        if self.threads == 0 {
            return Vec::new();
        }
        let base = self.transactions / self.threads;
        let extra = self.transactions % self.threads;
        (0..self.threads)
            .map(|worker| base + usize::from(worker < extra))
            .collect()
    }

    /// Checks that the workload can be generated.
    pub fn validate(&self) -> MvtoResult<()> {
        if self.threads == 0 {
            return Err(MvtoError::config("workload.threads must be at least 1"));
        }
        if self.items == 0 {
            return Err(MvtoError::config("workload.items must be at least 1"));
        }
        if self.steps_per_txn == 0 {
            return Err(MvtoError::config("workload.steps_per_txn must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.read_probability) {
            return Err(MvtoError::config(format!(
                "workload.read_probability must be within [0, 1], got {}",
                self.read_probability
            )));
        }
        Ok(())
    }
}

/// Complete configuration of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Engine settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Workload settings.
    #[serde(default)]
    pub workload: WorkloadConfig,
}

impl RunConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> MvtoResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> MvtoResult<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Serializes configuration to TOML.
    pub fn to_toml(&self) -> MvtoResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validates the whole configuration.
    pub fn validate(&self) -> MvtoResult<()> {
        self.workload.validate()
    }
}
