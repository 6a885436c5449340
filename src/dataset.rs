//! Synthetic dataset generation.
//!
//! The benchmark dataset has three columns: a dense integer `id` (0..N), a
//! categorical `group` drawn uniformly from [`GROUP_ALPHABET`] and a uniform
//! `value` in [0, 1). Files are cached on disk keyed by row count.

use crate::errors::{BenchError, BenchResult};
use crate::io;
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const ID_COLUMN: &str = "id";
pub const GROUP_COLUMN: &str = "group";
pub const VALUE_COLUMN: &str = "value";

pub const GROUP_ALPHABET: [&str; 4] = ["A", "B", "C", "D"];

/// Rows whose `value` is strictly greater than this survive the filter stage.
pub const FILTER_THRESHOLD: f64 = 0.5;

pub const DEFAULT_SEED: u64 = 42;

/// One typed row of the dataset file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub id: i64,
    pub group: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSpec {
    pub row_count: usize,
    pub path: PathBuf,
    /// `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetStatus {
    Generated,
    Reused,
}

/// Short label for a row count: `1M`, `10M`, `500K`, or the plain number.
pub fn row_label(rows: usize) -> String {
    if rows >= 1_000_000 && rows % 1_000_000 == 0 {
        format!("{}M", rows / 1_000_000)
    } else if rows >= 1_000 && rows % 1_000 == 0 {
        format!("{}K", rows / 1_000)
    } else {
        rows.to_string()
    }
}

pub fn default_path(rows: usize) -> PathBuf {
    PathBuf::from(format!("test_data_{}.csv", row_label(rows)))
}

/// Parse a row count such as `1000`, `1_000_000`, `500K` or `10M`.
pub fn parse_row_count(raw: &str) -> Result<usize, String> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != '_').collect();
    let (digits, multiplier) = match cleaned.chars().last() {
        Some('k') | Some('K') => (&cleaned[..cleaned.len() - 1], 1_000),
        Some('m') | Some('M') => (&cleaned[..cleaned.len() - 1], 1_000_000),
        _ => (cleaned.as_str(), 1),
    };
    let base: usize = digits
        .parse()
        .map_err(|_| format!("invalid row count: {:?}", raw))?;
    let rows = base
        .checked_mul(multiplier)
        .ok_or_else(|| format!("row count overflows: {:?}", raw))?;
    if rows == 0 {
        return Err("row count must be greater than zero".to_string());
    }
    Ok(rows)
}

/// Build the in-memory dataset for `spec`.
pub fn generate_frame(spec: &DatasetSpec) -> BenchResult<DataFrame> {
    let mut rng = match spec.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let n = spec.row_count;
    let ids: Vec<i64> = (0..n as i64).collect();
    let mut groups: Vec<&str> = Vec::with_capacity(n);
    let mut values: Vec<f64> = Vec::with_capacity(n);
    for _ in 0..n {
        groups.push(GROUP_ALPHABET[rng.gen_range(0..GROUP_ALPHABET.len())]);
        values.push(rng.gen::<f64>());
    }

    let df = df! {
        ID_COLUMN => ids,
        GROUP_COLUMN => groups,
        VALUE_COLUMN => values,
    }?;
    Ok(df)
}

/// Make sure the dataset described by `spec` exists on disk.
///
/// An existing file is left untouched unless `regenerate` is set. New data is
/// written next to the target and renamed into place once complete.
pub fn ensure_dataset(spec: &DatasetSpec, regenerate: bool) -> BenchResult<DatasetStatus> {
    if spec.row_count == 0 {
        return Err(BenchError::InvalidConfig(
            "row count must be greater than zero".to_string(),
        ));
    }

    if spec.path.exists() && !regenerate {
        info!("{:?} already exists, skipping generation", spec.path);
        return Ok(DatasetStatus::Reused);
    }

    if let Some(parent) = spec.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    info!(rows = spec.row_count, seed = ?spec.seed, "Generating dataset {:?}", spec.path);
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .map_err(|e| BenchError::Unknown(e.into()))?,
    );
    pb.set_message(format!("Generating {} rows...", row_label(spec.row_count)));

    let mut df = generate_frame(spec)?;
    let partial = partial_path(&spec.path);
    io::write_csv(&mut df, &partial)?;
    std::fs::rename(&partial, &spec.path)?;

    pb.finish_with_message(format!("{:?} created.", spec.path));
    debug!(rows = df.height(), "Dataset written");
    Ok(DatasetStatus::Generated)
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}
