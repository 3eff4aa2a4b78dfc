//! Configuration for the MVTO engine and its workload driver.

mod run;

pub use run::{EngineConfig, RunConfig, WorkloadConfig};
