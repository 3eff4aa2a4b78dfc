//! Seeded random workload generation.
//!
//! Each generated step is a read with probability `read_probability` and a
//! write otherwise, targeting an item drawn uniformly from `0..items`. The
//! same configuration always yields the same batches.

use mvto_common::config::WorkloadConfig;
use mvto_common::error::MvtoResult;
use mvto_common::types::ItemId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::step::{Step, Transaction};

/// Generates per-worker transaction batches.
#[derive(Debug)]
pub struct WorkloadGenerator {
    config: WorkloadConfig,
    rng: StdRng,
}

impl WorkloadGenerator {
    /// Creates a generator seeded from `config.seed`.
    pub fn new(config: &WorkloadConfig) -> MvtoResult<Self> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Generates one random step.
    pub fn step(&mut self) -> Step {
        let item = ItemId::new(self.rng.gen_range(0..self.config.items as u64));
        if self.rng.gen_bool(self.config.read_probability) {
            Step::read(item)
        } else {
            Step::write(item)
        }
    }

    /// Generates one transaction of `steps_per_txn` steps.
    pub fn transaction(&mut self) -> Transaction {
        (0..self.config.steps_per_txn).map(|_| self.step()).collect()
    }

    /// Generates one batch per worker, sized by
    /// [`WorkloadConfig::transactions_per_worker`].
    pub fn generate(&mut self) -> Vec<Vec<Transaction>> {
        self.config
            .transactions_per_worker()
            .into_iter()
            .map(|count| (0..count).map(|_| self.transaction()).collect())
            .collect()
    }
}
