//! Pandas-style baseline engine on `pandrs`.
//!
//! The file is parsed record by record with the csv crate into typed pandrs
//! series. Group-by runs through pandrs' `GroupBy` and the join through
//! `DataFrame::inner_join`.

use super::{Engine, TableShape};
use crate::dataset::{FILTER_THRESHOLD, GROUP_COLUMN, ID_COLUMN, VALUE_COLUMN};
use crate::errors::{BenchError, BenchResult};
use pandrs::{DataFrame, GroupBy, Series};
use std::path::Path;

impl TableShape for DataFrame {
    fn num_rows(&self) -> usize {
        self.row_count()
    }

    fn num_columns(&self) -> usize {
        self.column_count()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PandrsEngine;

impl Engine for PandrsEngine {
    type Table = DataFrame;

    fn name(&self) -> &str {
        "pandrs"
    }

    fn load(&self, path: &Path) -> BenchResult<DataFrame> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)?;
        let header = rdr.headers()?.clone();
        let position = |name: &str| {
            header
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| BenchError::SchemaError(format!("missing column {:?}", name)))
        };
        let id_idx = position(ID_COLUMN)?;
        let group_idx = position(GROUP_COLUMN)?;
        let value_idx = position(VALUE_COLUMN)?;

        let mut columns = Columns::default();
        for (line, record) in rdr.records().enumerate() {
            let record = record?;
            let field = |idx: usize| record.get(idx).unwrap_or_default();

            let id = field(id_idx);
            columns.ids.push(
                id.trim()
                    .parse()
                    .map_err(|_| bad_value(line, ID_COLUMN, id, "integer"))?,
            );
            columns.groups.push(field(group_idx).to_string());
            let value = field(value_idx);
            columns.values.push(
                value
                    .trim()
                    .parse()
                    .map_err(|_| bad_value(line, VALUE_COLUMN, value, "float"))?,
            );
        }
        columns.into_frame()
    }

    fn aggregate(&self, table: &DataFrame) -> BenchResult<DataFrame> {
        let keys = string_column(table, GROUP_COLUMN)?;
        let values = Series::new(
            float_column(table, VALUE_COLUMN)?,
            Some(VALUE_COLUMN.to_string()),
        )?;
        let grouped = GroupBy::new(keys, &values, Some(GROUP_COLUMN.to_string()))?;

        let mut means: Vec<(String, f64)> = grouped.mean()?.into_iter().collect();
        means.sort_by(|a, b| a.0.cmp(&b.0));
        let (groups, means): (Vec<String>, Vec<f64>) = means.into_iter().unzip();

        let mut out = DataFrame::new();
        out.add_column(
            GROUP_COLUMN.to_string(),
            Series::new(groups, Some(GROUP_COLUMN.to_string()))?,
        )?;
        out.add_column(
            VALUE_COLUMN.to_string(),
            Series::new(means, Some(VALUE_COLUMN.to_string()))?,
        )?;
        Ok(out)
    }

    fn filter(&self, table: &DataFrame) -> BenchResult<DataFrame> {
        let all = Columns::from_frame(table)?;
        let mut kept = Columns::default();
        for (i, value) in all.values.iter().enumerate() {
            if *value > FILTER_THRESHOLD {
                kept.ids.push(all.ids[i]);
                kept.groups.push(all.groups[i].clone());
                kept.values.push(*value);
            }
        }
        kept.into_frame()
    }

    fn join(&self, left: &DataFrame, right: &DataFrame) -> BenchResult<DataFrame> {
        for frame in [left, right] {
            require_column(frame, ID_COLUMN)?;
        }
        Ok(left.inner_join(right, ID_COLUMN, ID_COLUMN)?)
    }

    fn group_keys(&self, aggregated: &DataFrame) -> BenchResult<Vec<String>> {
        let mut keys = string_column(aggregated, GROUP_COLUMN)?;
        if let Some(blank) = keys.iter().position(|k| k.is_empty()) {
            return Err(BenchError::SchemaError(format!(
                "aggregated row {} has an empty group key",
                blank + 1
            )));
        }
        keys.sort();
        Ok(keys)
    }
}

/// The three benchmark columns, held typed outside the frame.
#[derive(Debug, Default)]
struct Columns {
    ids: Vec<i64>,
    groups: Vec<String>,
    values: Vec<f64>,
}

impl Columns {
    fn from_frame(df: &DataFrame) -> BenchResult<Self> {
        let ids = string_column(df, ID_COLUMN)?
            .iter()
            .enumerate()
            .map(|(line, s)| {
                s.parse()
                    .map_err(|_| bad_value(line, ID_COLUMN, s, "integer"))
            })
            .collect::<BenchResult<Vec<i64>>>()?;
        Ok(Self {
            ids,
            groups: string_column(df, GROUP_COLUMN)?,
            values: float_column(df, VALUE_COLUMN)?,
        })
    }

    fn into_frame(self) -> BenchResult<DataFrame> {
        let mut df = DataFrame::new();
        df.add_column(
            ID_COLUMN.to_string(),
            Series::new(self.ids, Some(ID_COLUMN.to_string()))?,
        )?;
        df.add_column(
            GROUP_COLUMN.to_string(),
            Series::new(self.groups, Some(GROUP_COLUMN.to_string()))?,
        )?;
        df.add_column(
            VALUE_COLUMN.to_string(),
            Series::new(self.values, Some(VALUE_COLUMN.to_string()))?,
        )?;
        Ok(df)
    }
}

fn require_column(df: &DataFrame, name: &str) -> BenchResult<()> {
    if df.column_names().iter().any(|c| c == name) {
        Ok(())
    } else {
        Err(BenchError::SchemaError(format!("missing column {:?}", name)))
    }
}

fn string_column(df: &DataFrame, name: &str) -> BenchResult<Vec<String>> {
    require_column(df, name)?;
    Ok(df.get_column_string_values(name)?)
}

fn float_column(df: &DataFrame, name: &str) -> BenchResult<Vec<f64>> {
    string_column(df, name)?
        .iter()
        .enumerate()
        .map(|(line, s)| s.parse().map_err(|_| bad_value(line, name, s, "float")))
        .collect()
}

fn bad_value(line: usize, column: &str, field: &str, expected: &str) -> BenchError {
    BenchError::SchemaError(format!(
        "row {}: column {:?} value {:?} is not a valid {}",
        line + 1,
        column,
        field,
        expected
    ))
}
