//! MVTO Performance Benchmarks
//!
//! This crate contains benchmarks for the MVTO engine:
//! - Item read and write admission
//! - The write rejection path
//! - GC sweeps over long version maps
//! - Full workloads across worker counts
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench -p mvto-bench
//! ```

pub mod utils;
