use crate::config::BenchConfig;
use crate::dataset::{self, DatasetStatus};
use crate::errors::{BenchError, BenchResult};
use crate::harness::{self, BenchmarkRun, BenchmarkRunner};
use crate::observability::{DatasetStats, RunMetadata};
use crate::report::ComparisonReport;
use serde::Serialize;
use std::io::Write;
use tracing::info;
use uuid::Uuid;

/// Everything a run produced; serialized as the JSON report.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub metadata: RunMetadata,
    pub run: BenchmarkRun,
    pub comparison: ComparisonReport,
    pub inconsistencies: Vec<String>,
}

/// Generate-or-reuse the dataset, benchmark every configured engine and
/// write the comparison table to `out`.
pub fn execute<W: Write>(config: &BenchConfig, run_id: Uuid, out: &mut W) -> BenchResult<RunSummary> {
    config.validate()?;
    let spec = config.dataset_spec();
    let baseline = config.baseline()?;

    // 1. Dataset
    let status = dataset::ensure_dataset(&spec, config.regenerate)?;
    let stats = DatasetStats::collect(&spec.path, spec.row_count, spec.seed, status)?;
    info!(hash = %stats.hash, bytes = stats.size_bytes, "Dataset ready: {:?}", spec.path);

    // 2. Engines
    let engines = config.engines.iter().map(|k| k.build()).collect();
    let runner = BenchmarkRunner::new(engines);
    let run = runner.run(&spec.path)?;

    // An explicit output path may point at a file of any size.
    let expected_rows = match status {
        DatasetStatus::Generated => Some(spec.row_count),
        DatasetStatus::Reused if config.output_path.is_none() => Some(spec.row_count),
        DatasetStatus::Reused => None,
    };
    let inconsistencies = harness::check_consistency(&run.outcomes, expected_rows);

    // 3. Report
    let comparison =
        ComparisonReport::build(&run.timings, &run.engines, baseline.as_str(), spec.row_count)?;
    writeln!(out)?;
    write!(out, "{}", comparison)?;
    out.flush()?;

    let summary = RunSummary {
        metadata: RunMetadata::new(run_id, stats),
        run,
        comparison,
        inconsistencies,
    };

    if let Some(path) = &config.report_json {
        let file = std::fs::File::create(path).map_err(BenchError::IoError)?;
        serde_json::to_writer_pretty(file, &summary)?;
        info!("JSON report written to {:?}", path);
    }

    Ok(summary)
}
