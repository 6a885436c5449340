//! Benchmark harness comparing dataframe engines on a synthetic dataset.
//!
//! A run generates (or reuses) a CSV file of `id`, `group`, `value` rows,
//! times load, aggregate, filter and join on every configured engine, and
//! renders a comparison table against a baseline engine.

pub mod config;
pub mod dataset;
pub mod engine;
pub mod errors;
pub mod harness;
pub mod io;
pub mod observability;
pub mod report;
pub mod runner;

pub use config::{BenchConfig, ConfigOverrides};
pub use engine::{Engine, EngineKind, TableShape};
pub use errors::{BenchError, BenchResult};
pub use harness::{Benchmarkable, BenchmarkRunner, Operation, Timings};
pub use report::{classify, ComparisonReport, Verdict};
