//! Threaded workload runner.
//!
//! Every batch gets its own named OS thread. A worker runs its transactions
//! in order, each one to commit, before taking the next. All workers share
//! one store.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use mvto_common::error::{MvtoError, MvtoResult};
use mvto_mvcc::Store;
use tracing::{debug, error, info};

use crate::executor::submit_transaction;
use crate::step::Transaction;

fn per_second(count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        count as f64 / secs
    } else {
        0.0
    }
}

fn ratio(aborts: u64, commits: u64) -> f64 {
    let attempts = aborts + commits;
    if attempts == 0 {
        0.0
    } else {
        aborts as f64 / attempts as f64
    }
}

/// What one worker did.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerReport {
    /// Worker index.
    pub worker: usize,
    /// Transactions committed.
    pub transactions: u64,
    /// Attempts aborted along the way.
    pub aborts: u64,
    /// Wall time spent on the batch.
    pub elapsed: Duration,
}

impl WorkerReport {
    /// Committed transactions per second.
    pub fn throughput(&self) -> f64 {
        per_second(self.transactions, self.elapsed)
    }

    /// Fraction of attempts that aborted.
    pub fn abort_ratio(&self) -> f64 {
        ratio(self.aborts, self.transactions)
    }
}

impl fmt::Display for WorkerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "worker {}: {} txns, {} aborts in {:.3?} ({:.0} txn/s, abort ratio {:.3})",
            self.worker,
            self.transactions,
            self.aborts,
            self.elapsed,
            self.throughput(),
            self.abort_ratio()
        )
    }
}

/// Aggregate result of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Per-worker results, ordered by worker index.
    pub workers: Vec<WorkerReport>,
    /// Transactions committed across all workers.
    pub total_transactions: u64,
    /// Aborted attempts across all workers.
    pub total_aborts: u64,
    /// Wall time from the first spawn to the last join.
    pub elapsed: Duration,
}

impl RunReport {
    /// Committed transactions per second over the whole run.
    pub fn throughput(&self) -> f64 {
        per_second(self.total_transactions, self.elapsed)
    }

    /// Fraction of all attempts that aborted.
    pub fn abort_ratio(&self) -> f64 {
        ratio(self.total_aborts, self.total_transactions)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for worker in &self.workers {
            writeln!(f, "{}", worker)?;
        }
        write!(
            f,
            "total: {} txns, {} aborts in {:.3?} ({:.0} txn/s, abort ratio {:.3})",
            self.total_transactions,
            self.total_aborts,
            self.elapsed,
            self.throughput(),
            self.abort_ratio()
        )
    }
}

fn run_batch(worker: usize, store: &Store, batch: &[Transaction]) -> MvtoResult<WorkerReport> {
    let started = Instant::now();
    let mut aborts = 0;

    for transaction in batch {
        aborts += submit_transaction(store, transaction)?.aborts;
    }

    let report = WorkerReport {
        worker,
        transactions: batch.len() as u64,
        aborts,
        elapsed: started.elapsed(),
    };
    debug!(worker, transactions = report.transactions, aborts, "worker finished");
    Ok(report)
}

/// Runs every batch on its own thread against `store` and waits for all of
/// them.
///
/// All workers are joined before returning. The first engine error in
/// worker order is returned; a panicking worker becomes
/// [`MvtoError::WorkerPanicked`].
pub fn run_workload(store: Arc<Store>, batches: Vec<Vec<Transaction>>) -> MvtoResult<RunReport> {
    let started = Instant::now();
    info!(
        workers = batches.len(),
        transactions = batches.iter().map(Vec::len).sum::<usize>(),
        "starting workload"
    );

    let mut handles = Vec::with_capacity(batches.len());
    for (worker, batch) in batches.into_iter().enumerate() {
        let store = Arc::clone(&store);
        let handle = thread::Builder::new()
            .name(format!("mvto-worker-{}", worker))
            .spawn(move || run_batch(worker, &store, &batch))
            .map_err(|err| MvtoError::WorkerSpawn {
                worker,
                reason: err.to_string(),
            })?;
        handles.push(handle);
    }

    let mut workers = Vec::with_capacity(handles.len());
    let mut first_error = None;
    for (worker, handle) in handles.into_iter().enumerate() {
        let result = handle
            .join()
            .unwrap_or(Err(MvtoError::WorkerPanicked { worker }));
        match result {
            Ok(report) => workers.push(report),
            Err(err) => {
                error!(worker, error = %err, "worker failed");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }
    if let Some(err) = first_error {
        return Err(err);
    }

    let report = RunReport {
        total_transactions: workers.iter().map(|w| w.transactions).sum(),
        total_aborts: workers.iter().map(|w| w.aborts).sum(),
        workers,
        elapsed: started.elapsed(),
    };
    info!(
        transactions = report.total_transactions,
        aborts = report.total_aborts,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "workload finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mvto_common::config::{EngineConfig, WorkloadConfig};
    use mvto_common::types::ItemId;

    use crate::step::Step;
    use crate::workload::WorkloadGenerator;

    #[test]
    fn test_run_small_workload() {
        let workload = WorkloadConfig {
            threads: 3,
            items: 3,
            transactions: 60,
            steps_per_txn: 8,
            read_probability: 0.5,
            seed: 11,
        };
        let store = Arc::new(
            Store::with_item_count(workload.items, EngineConfig::default().with_gc_threshold(5))
                .unwrap(),
        );
        let batches = WorkloadGenerator::new(&workload).unwrap().generate();

        let report = run_workload(Arc::clone(&store), batches).unwrap();
        assert_eq!(report.workers.len(), 3);
        assert_eq!(report.total_transactions, 60);
        assert_eq!(report.total_aborts, store.abort_count());
        assert_eq!(
            store.stats().issued,
            report.total_transactions + report.total_aborts
        );
        assert_eq!(store.authority().active_count(), 0);
        assert!(store.verify().is_ok());
        assert!(report.to_string().contains("total: 60 txns"));
    }

    #[test]
    fn test_worker_error_is_returned() {
        let store = Arc::new(Store::with_item_count(2, EngineConfig::default()).unwrap());
        let good = vec![Transaction::new(vec![Step::read(ItemId::new(0))])];
        let bad = vec![Transaction::new(vec![Step::write(ItemId::new(7))])];

        let err = run_workload(Arc::clone(&store), vec![good, bad]).unwrap_err();
        assert!(matches!(err, MvtoError::UnknownItem(id) if id == ItemId::new(7)));
        assert_eq!(store.authority().active_count(), 0);
    }

    #[test]
    fn test_empty_run() {
        let store = Arc::new(Store::with_item_count(1, EngineConfig::default()).unwrap());
        let report = run_workload(store, Vec::new()).unwrap();
        assert_eq!(report.total_transactions, 0);
        assert_eq!(report.abort_ratio(), 0.0);
    }

    #[test]
    fn test_report_ratios() {
        let worker = WorkerReport {
            worker: 0,
            transactions: 30,
            aborts: 10,
            elapsed: Duration::from_secs(2),
        };
        assert_eq!(worker.throughput(), 15.0);
        assert_eq!(worker.abort_ratio(), 0.25);
        assert!(worker.to_string().starts_with("worker 0: 30 txns, 10 aborts"));
    }
}
