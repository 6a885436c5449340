//! Comparison table.
//!
//! Every non-baseline engine gets a verdict per operation relative to the
//! baseline's time for that operation.

use crate::dataset::row_label;
use crate::errors::{BenchError, BenchResult};
use crate::harness::{Operation, Timings};
use serde::Serialize;
use std::fmt;

/// Relative difference below which two timings count as the same speed.
pub const SIMILAR_THRESHOLD: f64 = 0.05;

const OPERATION_WIDTH: usize = 20;
const TIME_WIDTH: usize = 15;
const VERDICT_WIDTH: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Faster { ratio: f64 },
    Similar,
    Slower { ratio: f64 },
}

impl Verdict {
    pub fn is_win(&self) -> bool {
        matches!(self, Verdict::Faster { .. })
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Faster { ratio } => write!(f, "{:.2}× faster", ratio),
            Verdict::Similar => f.write_str("similar speed"),
            Verdict::Slower { ratio } => write!(f, "{:.2}× slower", ratio),
        }
    }
}

/// Classify `cmp` against `base` (both in seconds).
///
/// Any speedup is a win; only a slowdown inside the band reads as similar.
pub fn classify(base: f64, cmp: f64) -> Verdict {
    if cmp < base {
        return Verdict::Faster { ratio: base / cmp };
    }

    let diff = cmp - base;
    let relative = if base > 0.0 {
        diff / base
    } else if diff == 0.0 {
        0.0
    } else {
        f64::INFINITY
    };

    if relative < SIMILAR_THRESHOLD {
        Verdict::Similar
    } else {
        Verdict::Slower { ratio: cmp / base }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineVerdict {
    pub engine: String,
    #[serde(flatten)]
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRow {
    pub operation: Operation,
    /// Seconds per engine, in engine order.
    pub seconds: Vec<f64>,
    pub verdicts: Vec<EngineVerdict>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub row_count: usize,
    pub baseline: String,
    pub engines: Vec<String>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonReport {
    pub fn build(
        timings: &Timings,
        engines: &[String],
        baseline: &str,
        row_count: usize,
    ) -> BenchResult<Self> {
        if !engines.iter().any(|e| e == baseline) {
            return Err(BenchError::InvalidConfig(format!(
                "baseline {:?} is not among the benchmarked engines {:?}",
                baseline, engines
            )));
        }

        let mut rows = Vec::with_capacity(Operation::ALL.len());
        for op in Operation::ALL {
            let base = timings.require(baseline, op)?.as_secs_f64();
            let mut seconds = Vec::with_capacity(engines.len());
            let mut verdicts = Vec::new();
            for engine in engines {
                let secs = timings.require(engine, op)?.as_secs_f64();
                seconds.push(secs);
                if engine != baseline {
                    verdicts.push(EngineVerdict {
                        engine: engine.clone(),
                        verdict: classify(base, secs),
                    });
                }
            }
            rows.push(ComparisonRow {
                operation: op,
                seconds,
                verdicts,
            });
        }

        Ok(Self {
            row_count,
            baseline: baseline.to_string(),
            engines: engines.to_vec(),
            rows,
        })
    }

    pub fn challengers(&self) -> impl Iterator<Item = &String> {
        self.engines.iter().filter(move |e| **e != self.baseline)
    }

    /// Operations `engine` won outright against the baseline.
    pub fn wins(&self, engine: &str) -> usize {
        self.rows
            .iter()
            .filter(|row| {
                row.verdicts
                    .iter()
                    .any(|v| v.engine == engine && v.verdict.is_win())
            })
            .count()
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let challengers: Vec<&String> = self.challengers().collect();
        let width = OPERATION_WIDTH
            + (TIME_WIDTH + 1) * self.engines.len()
            + (VERDICT_WIDTH + 1) * challengers.len();
        let rule = "-".repeat(width);

        writeln!(f, "Benchmark Results ({} rows)", row_label(self.row_count))?;

        let mut header = format!("{:<w$}", "Operation", w = OPERATION_WIDTH);
        for engine in &self.engines {
            header.push_str(&format!(" {:<w$}", format!("{} (s)", engine), w = TIME_WIDTH));
        }
        for engine in &challengers {
            let title = if challengers.len() == 1 {
                "Comparison".to_string()
            } else {
                format!("{} vs {}", engine, self.baseline)
            };
            header.push_str(&format!(" {:<w$}", title, w = VERDICT_WIDTH));
        }
        writeln!(f, "{}", header.trim_end())?;
        writeln!(f, "{}", rule)?;

        for row in &self.rows {
            let mut line = format!("{:<w$}", row.operation.label(), w = OPERATION_WIDTH);
            for secs in &row.seconds {
                line.push_str(&format!(" {:<w$.6}", secs, w = TIME_WIDTH));
            }
            for v in &row.verdicts {
                line.push_str(&format!(" {:<w$}", v.verdict.to_string(), w = VERDICT_WIDTH));
            }
            writeln!(f, "{}", line.trim_end())?;
        }

        writeln!(f, "{}", rule)?;
        for engine in &challengers {
            writeln!(
                f,
                "{} was faster in {} out of {} operations.",
                engine,
                self.wins(engine),
                self.rows.len()
            )?;
        }
        Ok(())
    }
}
