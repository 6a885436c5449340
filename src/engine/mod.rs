//! Engine adapters.
//!
//! An engine is anything that can load the benchmark dataset and run the
//! aggregate, filter and join stages over its own table type. Engines carry
//! no state between calls.

pub mod columnar;
pub mod pandas;

use crate::errors::BenchResult;
use crate::harness::Benchmarkable;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Shape information every engine table can report.
pub trait TableShape {
    fn num_rows(&self) -> usize;
    fn num_columns(&self) -> usize;
}

pub trait Engine {
    type Table: TableShape;

    fn name(&self) -> &str;

    /// Parse the dataset file into memory, validating the schema.
    fn load(&self, path: &Path) -> BenchResult<Self::Table>;

    /// Mean of `value` per `group`.
    fn aggregate(&self, table: &Self::Table) -> BenchResult<Self::Table>;

    /// Rows with `value` above the filter threshold.
    fn filter(&self, table: &Self::Table) -> BenchResult<Self::Table>;

    /// Inner join on `id`.
    fn join(&self, left: &Self::Table, right: &Self::Table) -> BenchResult<Self::Table>;

    /// Sorted group keys of an aggregated table.
    fn group_keys(&self, aggregated: &Self::Table) -> BenchResult<Vec<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Pandas-style engine built on pandrs
    Pandrs,
    /// Columnar engine built on polars
    Polars,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Pandrs => "pandrs",
            EngineKind::Polars => "polars",
        }
    }

    pub fn build(&self) -> Box<dyn Benchmarkable> {
        match self {
            EngineKind::Pandrs => Box::new(pandas::PandrsEngine),
            EngineKind::Polars => Box::new(columnar::PolarsEngine),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
