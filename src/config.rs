use crate::dataset::{self, DatasetSpec, DEFAULT_SEED};
use crate::engine::EngineKind;
use crate::errors::{BenchError, BenchResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Benchmark parameters. Every field has a default, so an empty YAML file is
/// a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
    pub row_count: usize,
    /// Dataset location; derived from `row_count` when absent.
    pub output_path: Option<PathBuf>,
    /// `None` seeds from OS entropy.
    pub seed: Option<u64>,
    pub regenerate: bool,
    pub engines: Vec<EngineKind>,
    /// Defaults to the first engine.
    pub baseline: Option<EngineKind>,
    pub report_json: Option<PathBuf>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            row_count: 1_000_000,
            output_path: None,
            seed: Some(DEFAULT_SEED),
            regenerate: false,
            engines: vec![EngineKind::Pandrs, EngineKind::Polars],
            baseline: None,
            report_json: None,
        }
    }
}

/// Values supplied on the command line; `None` keeps the file/default value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub row_count: Option<usize>,
    pub output_path: Option<PathBuf>,
    pub seed: Option<u64>,
    pub unseeded: bool,
    pub regenerate: bool,
    pub engines: Option<Vec<EngineKind>>,
    pub baseline: Option<EngineKind>,
    pub report_json: Option<PathBuf>,
}

impl BenchConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> BenchResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> BenchResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(BenchError::ConfigError)
    }

    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(rows) = overrides.row_count {
            self.row_count = rows;
        }
        if let Some(path) = overrides.output_path {
            self.output_path = Some(path);
        }
        if overrides.unseeded {
            self.seed = None;
        } else if let Some(seed) = overrides.seed {
            self.seed = Some(seed);
        }
        if overrides.regenerate {
            self.regenerate = true;
        }
        if let Some(engines) = overrides.engines {
            self.engines = engines;
        }
        if let Some(baseline) = overrides.baseline {
            self.baseline = Some(baseline);
        }
        if let Some(path) = overrides.report_json {
            self.report_json = Some(path);
        }
        self
    }

    pub fn validate(&self) -> BenchResult<()> {
        if self.row_count == 0 {
            return Err(BenchError::InvalidConfig(
                "row_count must be greater than zero".to_string(),
            ));
        }
        if self.engines.is_empty() {
            return Err(BenchError::InvalidConfig(
                "at least one engine is required".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for engine in &self.engines {
            if !seen.insert(engine) {
                return Err(BenchError::InvalidConfig(format!(
                    "engine {} listed more than once",
                    engine
                )));
            }
        }
        if let Some(baseline) = self.baseline {
            if !self.engines.contains(&baseline) {
                return Err(BenchError::InvalidConfig(format!(
                    "baseline {} is not among the engines",
                    baseline
                )));
            }
        }
        Ok(())
    }

    pub fn baseline(&self) -> BenchResult<EngineKind> {
        self.baseline
            .or_else(|| self.engines.first().copied())
            .ok_or_else(|| BenchError::InvalidConfig("no baseline engine".to_string()))
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| dataset::default_path(self.row_count))
    }

    pub fn dataset_spec(&self) -> DatasetSpec {
        DatasetSpec {
            row_count: self.row_count,
            path: self.dataset_path(),
            seed: self.seed,
        }
    }
}
