use super::{Engine, TableShape};
use crate::dataset::{FILTER_THRESHOLD, GROUP_COLUMN, ID_COLUMN, VALUE_COLUMN};
use crate::errors::{BenchError, BenchResult};
use crate::io;
use polars::prelude::*;
use std::path::Path;

/// Columnar engine: eager polars frames, each stage built lazily and
/// collected before the timer stops.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolarsEngine;

impl TableShape for DataFrame {
    fn num_rows(&self) -> usize {
        self.height()
    }

    fn num_columns(&self) -> usize {
        self.width()
    }
}

impl Engine for PolarsEngine {
    type Table = DataFrame;

    fn name(&self) -> &str {
        "polars"
    }

    fn load(&self, path: &Path) -> BenchResult<DataFrame> {
        let df = io::read_csv(path)?.collect().map_err(io::read_error)?;
        validate_schema(&df)?;
        Ok(df)
    }

    fn aggregate(&self, table: &DataFrame) -> BenchResult<DataFrame> {
        Ok(table
            .clone()
            .lazy()
            .group_by([col(GROUP_COLUMN)])
            .agg([col(VALUE_COLUMN).mean()])
            .collect()?)
    }

    fn filter(&self, table: &DataFrame) -> BenchResult<DataFrame> {
        Ok(table
            .clone()
            .lazy()
            .filter(col(VALUE_COLUMN).gt(lit(FILTER_THRESHOLD)))
            .collect()?)
    }

    fn join(&self, left: &DataFrame, right: &DataFrame) -> BenchResult<DataFrame> {
        Ok(left
            .clone()
            .lazy()
            .join(
                right.clone().lazy(),
                [col(ID_COLUMN)],
                [col(ID_COLUMN)],
                JoinArgs::new(JoinType::Inner),
            )
            .collect()?)
    }

    fn group_keys(&self, aggregated: &DataFrame) -> BenchResult<Vec<String>> {
        let mut keys: Vec<String> = aggregated
            .column(GROUP_COLUMN)?
            .str()?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        keys.sort();
        Ok(keys)
    }
}

fn validate_schema(df: &DataFrame) -> BenchResult<()> {
    let checks: [(&str, fn(&DataType) -> bool, &str); 3] = [
        (ID_COLUMN, |dt| dt.is_integer(), "integer"),
        (GROUP_COLUMN, |dt| matches!(dt, DataType::String), "text"),
        (VALUE_COLUMN, |dt| dt.is_float(), "float"),
    ];

    for (name, accepts, expected) in checks {
        let column = df
            .column(name)
            .map_err(|_| BenchError::SchemaError(format!("missing column {:?}", name)))?;
        if !accepts(column.dtype()) {
            return Err(BenchError::SchemaError(format!(
                "column {:?} has type {}, expected {}",
                name,
                column.dtype(),
                expected
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn sample() -> DataFrame {
        df! {
            "id" => [0i64, 1, 2, 3, 4, 5],
            "group" => ["A", "B", "A", "C", "B", "A"],
            "value" => [0.9, 0.1, 0.5, 0.7, 0.51, 0.2],
        }
        .unwrap()
    }

    #[test]
    fn test_load_validates_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "id,group,value\n0,A,0.1\n1,B,0.9\n").unwrap();

        let df = PolarsEngine.load(&path).unwrap();
        assert_eq!(df.shape(), (2, 3));
    }

    #[test]
    fn test_load_rejects_missing_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "id,group\n0,A\n1,B\n").unwrap();

        let err = PolarsEngine.load(&path).unwrap_err();
        assert!(matches!(err, BenchError::SchemaError(_)), "{}", err);
    }

    #[test]
    fn test_load_rejects_wrong_type() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "id,group,value\n0,A,high\n1,B,low\n").unwrap();

        let err = PolarsEngine.load(&path).unwrap_err();
        assert!(matches!(err, BenchError::SchemaError(_)), "{}", err);
    }

    #[test]
    fn test_load_accepts_integral_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "id,group,value\n0,A,1\n1,B,0\n2,A,1\n").unwrap();

        let df = PolarsEngine.load(&path).unwrap();
        assert_eq!(df.column(VALUE_COLUMN).unwrap().dtype(), &DataType::Float64);
        assert_eq!(PolarsEngine.filter(&df).unwrap().height(), 2);
    }

    #[test]
    fn test_aggregate_means() {
        let agg = PolarsEngine
            .aggregate(&sample())
            .unwrap()
            .sort([GROUP_COLUMN], Default::default())
            .unwrap();

        assert_eq!(agg.height(), 3);
        let means = agg.column(VALUE_COLUMN).unwrap().f64().unwrap();
        assert!((means.get(0).unwrap() - (0.9 + 0.5 + 0.2) / 3.0).abs() < 1e-12);
        assert!((means.get(1).unwrap() - (0.1 + 0.51) / 2.0).abs() < 1e-12);
        assert!((means.get(2).unwrap() - 0.7).abs() < 1e-12);
        assert_eq!(PolarsEngine.group_keys(&agg).unwrap(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_filter_is_strict() {
        let filtered = PolarsEngine.filter(&sample()).unwrap();
        let ids: Vec<i64> = filtered
            .column(ID_COLUMN)
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        // 0.5 itself is excluded
        assert_eq!(ids, vec![0, 3, 4]);
    }

    #[test]
    fn test_join_matches_filter() {
        let df = sample();
        let filtered = PolarsEngine.filter(&df).unwrap();
        let joined = PolarsEngine.join(&df, &filtered).unwrap();
        assert_eq!(joined.height(), filtered.height());
        assert_eq!(joined.width(), 5);
    }

    #[test]
    fn test_empty_filter_flows_into_join() {
        let df = df! {
            "id" => [0i64, 1],
            "group" => ["A", "B"],
            "value" => [0.1, 0.5],
        }
        .unwrap();
        let filtered = PolarsEngine.filter(&df).unwrap();
        assert_eq!(filtered.height(), 0);
        let joined = PolarsEngine.join(&df, &filtered).unwrap();
        assert_eq!(joined.height(), 0);
    }
}
