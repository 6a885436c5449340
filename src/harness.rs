//! Benchmark orchestration.
//!
//! Every engine runs the fixed stage sequence (load, aggregate, filter, join)
//! against the same dataset file. Each call is timed on its own and the
//! elapsed time lands in an explicit [`Timings`] accumulator owned by the
//! caller.

use crate::engine::{Engine, TableShape};
use crate::errors::{BenchError, BenchResult};
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Load,
    Aggregate,
    Filter,
    Join,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Load,
        Operation::Aggregate,
        Operation::Filter,
        Operation::Join,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Operation::Load => "read",
            Operation::Aggregate => "agg",
            Operation::Filter => "filter",
            Operation::Join => "join",
        }
    }

    /// Row label used in the comparison table.
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Load => "Read Data",
            Operation::Aggregate => "Aggregation",
            Operation::Filter => "Filtering",
            Operation::Join => "Joining",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

fn as_secs_f64<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingSample {
    pub engine: String,
    pub operation: Operation,
    #[serde(rename = "elapsed_secs", serialize_with = "as_secs_f64")]
    pub elapsed: Duration,
}

/// Ordered timing samples, at most one per (engine, operation).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Timings {
    samples: Vec<TimingSample>,
}

impl Timings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, engine: &str, operation: Operation, elapsed: Duration) -> BenchResult<()> {
        if self.get(engine, operation).is_some() {
            return Err(BenchError::DuplicateSample {
                engine: engine.to_string(),
                operation: operation.to_string(),
            });
        }
        debug!(engine, %operation, secs = elapsed.as_secs_f64(), "timing sample");
        self.samples.push(TimingSample {
            engine: engine.to_string(),
            operation,
            elapsed,
        });
        Ok(())
    }

    pub fn get(&self, engine: &str, operation: Operation) -> Option<Duration> {
        self.samples
            .iter()
            .find(|s| s.engine == engine && s.operation == operation)
            .map(|s| s.elapsed)
    }

    pub fn require(&self, engine: &str, operation: Operation) -> BenchResult<Duration> {
        self.get(engine, operation)
            .ok_or_else(|| BenchError::MissingSample {
                engine: engine.to_string(),
                operation: operation.to_string(),
            })
    }

    pub fn samples(&self) -> &[TimingSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Time a single call.
pub fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let out = f();
    let elapsed = start.elapsed();
    (out, elapsed)
}

/// What an engine observed at each stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    pub engine: String,
    pub loaded_rows: usize,
    pub loaded_columns: usize,
    pub group_keys: Vec<String>,
    pub filtered_rows: usize,
    pub joined_rows: usize,
}

/// Object-safe view of an [`Engine`] so engines with different table types
/// can share one run list.
pub trait Benchmarkable {
    fn label(&self) -> &str;

    fn benchmark(&self, dataset: &Path, timings: &mut Timings) -> BenchResult<RunOutcome>;
}

impl<E: Engine> Benchmarkable for E {
    fn label(&self) -> &str {
        self.name()
    }

    fn benchmark(&self, dataset: &Path, timings: &mut Timings) -> BenchResult<RunOutcome> {
        let name = self.name();

        let (table, elapsed) = timed(|| self.load(dataset));
        let table = table?;
        timings.record(name, Operation::Load, elapsed)?;

        let (aggregated, elapsed) = timed(|| self.aggregate(&table));
        let aggregated = aggregated?;
        timings.record(name, Operation::Aggregate, elapsed)?;

        let (filtered, elapsed) = timed(|| self.filter(&table));
        let filtered = filtered?;
        timings.record(name, Operation::Filter, elapsed)?;

        let (joined, elapsed) = timed(|| self.join(&table, &filtered));
        let joined = joined?;
        timings.record(name, Operation::Join, elapsed)?;

        Ok(RunOutcome {
            engine: name.to_string(),
            loaded_rows: table.num_rows(),
            loaded_columns: table.num_columns(),
            group_keys: self.group_keys(&aggregated)?,
            filtered_rows: filtered.num_rows(),
            joined_rows: joined.num_rows(),
        })
    }
}

/// Result of running every engine once.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkRun {
    pub engines: Vec<String>,
    pub timings: Timings,
    pub outcomes: Vec<RunOutcome>,
}

pub struct BenchmarkRunner {
    engines: Vec<Box<dyn Benchmarkable>>,
}

impl BenchmarkRunner {
    pub fn new(engines: Vec<Box<dyn Benchmarkable>>) -> Self {
        Self { engines }
    }

    pub fn engine_names(&self) -> Vec<String> {
        self.engines.iter().map(|e| e.label().to_string()).collect()
    }

    /// Run all engines in order. Tables are dropped inside each engine's
    /// `benchmark` call, before the next engine starts.
    pub fn run(&self, dataset: &Path) -> BenchResult<BenchmarkRun> {
        let mut timings = Timings::new();
        let mut outcomes = Vec::with_capacity(self.engines.len());

        for engine in &self.engines {
            let _span = info_span!("engine", name = engine.label()).entered();
            info!("Benchmarking {}...", engine.label());
            let outcome = engine.benchmark(dataset, &mut timings)?;
            info!(
                rows = outcome.loaded_rows,
                groups = outcome.group_keys.len(),
                filtered = outcome.filtered_rows,
                joined = outcome.joined_rows,
                "{} done",
                engine.label()
            );
            outcomes.push(outcome);
        }

        Ok(BenchmarkRun {
            engines: self.engine_names(),
            timings,
            outcomes,
        })
    }
}

/// Compare engine outcomes against each other and against the stage
/// invariants. Returns one message per mismatch.
pub fn check_consistency(outcomes: &[RunOutcome], expected_rows: Option<usize>) -> Vec<String> {
    let mut problems = Vec::new();

    for o in outcomes {
        if o.joined_rows != o.filtered_rows {
            problems.push(format!(
                "{}: join produced {} rows but filter produced {}",
                o.engine, o.joined_rows, o.filtered_rows
            ));
        }
        if let Some(n) = expected_rows {
            if o.loaded_rows != n {
                problems.push(format!(
                    "{}: loaded {} rows, expected {}",
                    o.engine, o.loaded_rows, n
                ));
            }
        }
    }

    if let Some((first, rest)) = outcomes.split_first() {
        for o in rest {
            if o.loaded_rows != first.loaded_rows {
                problems.push(format!(
                    "{} loaded {} rows, {} loaded {}",
                    first.engine, first.loaded_rows, o.engine, o.loaded_rows
                ));
            }
            if o.group_keys != first.group_keys {
                problems.push(format!(
                    "{} groups {:?} differ from {} groups {:?}",
                    first.engine, first.group_keys, o.engine, o.group_keys
                ));
            }
            if o.filtered_rows != first.filtered_rows {
                problems.push(format!(
                    "{} filtered {} rows, {} filtered {}",
                    first.engine, first.filtered_rows, o.engine, o.filtered_rows
                ));
            }
            if o.joined_rows != first.joined_rows {
                problems.push(format!(
                    "{} joined {} rows, {} joined {}",
                    first.engine, first.joined_rows, o.engine, o.joined_rows
                ));
            }
        }
    }

    for p in &problems {
        warn!("Inconsistent results: {}", p);
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Counted(usize);

    impl TableShape for Counted {
        fn num_rows(&self) -> usize {
            self.0
        }

        fn num_columns(&self) -> usize {
            1
        }
    }

    /// Engine that records the order of calls it receives.
    struct Recording {
        name: &'static str,
        calls: Rc<RefCell<Vec<String>>>,
        fail_on: Option<Operation>,
    }

    impl Recording {
        fn log(&self, op: Operation) -> BenchResult<()> {
            self.calls.borrow_mut().push(format!("{}:{}", self.name, op));
            if self.fail_on == Some(op) {
                return Err(BenchError::SchemaError(format!("{} failed", op)));
            }
            Ok(())
        }
    }

    impl Engine for Recording {
        type Table = Counted;

        fn name(&self) -> &str {
            self.name
        }

        fn load(&self, _path: &Path) -> BenchResult<Counted> {
            self.log(Operation::Load)?;
            Ok(Counted(10))
        }

        fn aggregate(&self, _table: &Counted) -> BenchResult<Counted> {
            self.log(Operation::Aggregate)?;
            Ok(Counted(2))
        }

        fn filter(&self, _table: &Counted) -> BenchResult<Counted> {
            self.log(Operation::Filter)?;
            Ok(Counted(4))
        }

        fn join(&self, _left: &Counted, right: &Counted) -> BenchResult<Counted> {
            self.log(Operation::Join)?;
            Ok(Counted(right.0))
        }

        fn group_keys(&self, _aggregated: &Counted) -> BenchResult<Vec<String>> {
            Ok(vec!["A".to_string(), "B".to_string()])
        }
    }

    fn recording(
        name: &'static str,
        calls: &Rc<RefCell<Vec<String>>>,
        fail_on: Option<Operation>,
    ) -> Box<dyn Benchmarkable> {
        Box::new(Recording {
            name,
            calls: Rc::clone(calls),
            fail_on,
        })
    }

    #[test]
    fn test_runs_engines_then_operations_in_order() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let runner = BenchmarkRunner::new(vec![
            recording("one", &calls, None),
            recording("two", &calls, None),
            recording("three", &calls, None),
        ]);

        let run = runner.run(Path::new("unused.csv")).unwrap();

        let expected: Vec<String> = ["one", "two", "three"]
            .iter()
            .flat_map(|e| Operation::ALL.iter().map(move |op| format!("{}:{}", e, op)))
            .collect();
        assert_eq!(*calls.borrow(), expected);
        assert_eq!(run.timings.len(), 12);
        assert_eq!(run.engines, vec!["one", "two", "three"]);
        for o in &run.outcomes {
            assert_eq!(o.loaded_rows, 10);
            assert_eq!(o.filtered_rows, 4);
            assert_eq!(o.joined_rows, 4);
        }
        assert!(check_consistency(&run.outcomes, Some(10)).is_empty());
    }

    #[test]
    fn test_failure_aborts_run() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let runner = BenchmarkRunner::new(vec![
            recording("one", &calls, Some(Operation::Filter)),
            recording("two", &calls, None),
        ]);

        let err = runner.run(Path::new("unused.csv")).unwrap_err();
        assert!(matches!(err, BenchError::SchemaError(_)));
        // Second engine never started
        assert_eq!(calls.borrow().len(), 3);
    }

    #[test]
    fn test_duplicate_sample_rejected() {
        let mut timings = Timings::new();
        timings
            .record("pandrs", Operation::Load, Duration::from_millis(5))
            .unwrap();
        let err = timings
            .record("pandrs", Operation::Load, Duration::from_millis(6))
            .unwrap_err();
        assert!(matches!(err, BenchError::DuplicateSample { .. }));
        assert_eq!(timings.get("pandrs", Operation::Load), Some(Duration::from_millis(5)));
        assert!(timings.require("pandrs", Operation::Join).is_err());
    }

    #[test]
    fn test_timed_measures_call() {
        let (value, elapsed) = timed(|| {
            std::thread::sleep(Duration::from_millis(10));
            7
        });
        assert_eq!(value, 7);
        assert!(elapsed >= Duration::from_millis(10));
    }

    #[test]
    fn test_timings_serialize_as_seconds() {
        let mut timings = Timings::new();
        timings
            .record("polars", Operation::Join, Duration::from_millis(1500))
            .unwrap();
        let json = serde_json::to_value(&timings).unwrap();
        assert_eq!(json[0]["engine"], "polars");
        assert_eq!(json[0]["operation"], "join");
        assert_eq!(json[0]["elapsed_secs"], 1.5);
    }

    #[test]
    fn test_consistency_reports_mismatches() {
        let base = RunOutcome {
            engine: "pandrs".to_string(),
            loaded_rows: 100,
            loaded_columns: 3,
            group_keys: vec!["A".into(), "B".into()],
            filtered_rows: 40,
            joined_rows: 40,
        };
        let other = RunOutcome {
            engine: "polars".to_string(),
            group_keys: vec!["A".into()],
            joined_rows: 39,
            ..base.clone()
        };

        let problems = check_consistency(&[base, other], Some(100));
        assert_eq!(problems.len(), 3);
        assert!(problems.iter().any(|p| p.contains("groups")));
    }
}
