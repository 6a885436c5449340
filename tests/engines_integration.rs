use anyhow::Result;
use dfbench::dataset::{ensure_dataset, DatasetSpec, FILTER_THRESHOLD, GROUP_ALPHABET};
use dfbench::engine::columnar::PolarsEngine;
use dfbench::engine::pandas::PandrsEngine;
use dfbench::harness::{check_consistency, BenchmarkRunner};
use dfbench::{Engine, EngineKind, Operation, TableShape};
use tempfile::tempdir;

fn dataset(dir: &std::path::Path, rows: usize) -> Result<DatasetSpec> {
    let spec = DatasetSpec {
        row_count: rows,
        path: dir.join("data.csv"),
        seed: Some(1234),
    };
    ensure_dataset(&spec, false)?;
    Ok(spec)
}

/// Both engines must agree on every stage's shape for the same file.
#[test]
fn test_engines_agree_on_1000_rows() -> Result<()> {
    let dir = tempdir()?;
    let spec = dataset(dir.path(), 1000)?;

    let runner = BenchmarkRunner::new(vec![EngineKind::Pandrs.build(), EngineKind::Polars.build()]);
    let run = runner.run(&spec.path)?;

    assert_eq!(run.timings.len(), 8);
    for engine in ["pandrs", "polars"] {
        for op in Operation::ALL {
            assert!(run.timings.get(engine, op).is_some(), "{} {}", engine, op);
        }
    }

    let pandrs = &run.outcomes[0];
    let polars = &run.outcomes[1];
    assert_eq!(pandrs.loaded_rows, 1000);
    assert_eq!(pandrs.loaded_columns, 3);
    assert_eq!(polars.loaded_rows, 1000);
    assert_eq!(polars.loaded_columns, 3);
    assert_eq!(pandrs.group_keys, polars.group_keys);
    assert!(pandrs.group_keys.len() <= GROUP_ALPHABET.len());
    assert_eq!(pandrs.filtered_rows, polars.filtered_rows);
    assert_eq!(pandrs.joined_rows, pandrs.filtered_rows);
    assert_eq!(polars.joined_rows, polars.filtered_rows);
    assert!(check_consistency(&run.outcomes, Some(1000)).is_empty());
    Ok(())
}

/// Filter keeps exactly the rows above the threshold, read back independently.
#[test]
fn test_filter_counts_match_file() -> Result<()> {
    let dir = tempdir()?;
    let spec = dataset(dir.path(), 500)?;

    let mut rdr = csv::Reader::from_path(&spec.path)?;
    let expected = rdr
        .deserialize::<dfbench::dataset::DatasetRecord>()
        .filter_map(|r| r.ok())
        .filter(|r| r.value > FILTER_THRESHOLD)
        .count();

    let pandrs_table = PandrsEngine.load(&spec.path)?;
    assert_eq!(PandrsEngine.filter(&pandrs_table)?.num_rows(), expected);

    let polars_table = PolarsEngine.load(&spec.path)?;
    assert_eq!(PolarsEngine.filter(&polars_table)?.num_rows(), expected);
    Ok(())
}

/// Aggregated means agree between engines to floating-point tolerance.
#[test]
fn test_aggregate_means_agree() -> Result<()> {
    let dir = tempdir()?;
    let spec = dataset(dir.path(), 300)?;

    let pandrs_agg = PandrsEngine.aggregate(&PandrsEngine.load(&spec.path)?)?;
    let polars_agg = PolarsEngine.aggregate(&PolarsEngine.load(&spec.path)?)?;

    let keys = pandrs_agg.get_column_string_values("group")?;
    let pandrs_means = pandrs_agg.get_column_string_values("value")?;
    let groups = polars_agg.column("group")?.str()?;
    let means = polars_agg.column("value")?.f64()?;
    assert_eq!(keys.len(), polars_agg.height());
    for (key, mean) in keys.iter().zip(&pandrs_means) {
        let mean: f64 = mean.parse()?;
        let idx = groups
            .into_iter()
            .position(|g| g == Some(key.as_str()))
            .expect("group present in polars output");
        assert!((means.get(idx).unwrap() - mean).abs() < 1e-9);
    }
    Ok(())
}

/// A `value` column written without decimals is still a float column.
#[test]
fn test_engines_accept_integral_values() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("integral.csv");
    std::fs::write(&path, "id,group,value\n0,A,1\n1,B,0\n2,C,1\n")?;

    let runner = BenchmarkRunner::new(vec![EngineKind::Pandrs.build(), EngineKind::Polars.build()]);
    let run = runner.run(&path)?;
    for outcome in &run.outcomes {
        assert_eq!(outcome.loaded_rows, 3);
        assert_eq!(outcome.filtered_rows, 2);
        assert_eq!(outcome.joined_rows, 2);
    }
    assert!(check_consistency(&run.outcomes, Some(3)).is_empty());
    Ok(())
}
