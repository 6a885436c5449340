use crate::dataset::{ID_COLUMN, VALUE_COLUMN};
use crate::errors::{BenchError, BenchResult};
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;

/// Pinned dtypes for the numeric columns. Without them an integral `value`
/// column in the inference window would come back as Int64.
fn dtype_overrides() -> SchemaRef {
    let mut schema = Schema::with_capacity(2);
    schema.with_column(ID_COLUMN.into(), DataType::Int64);
    schema.with_column(VALUE_COLUMN.into(), DataType::Float64);
    Arc::new(schema)
}

/// A pinned column absent from the file surfaces as `ColumnNotFound`, text
/// in a pinned numeric column as a `ComputeError` parse failure.
pub(crate) fn read_error(err: PolarsError) -> BenchError {
    match err {
        PolarsError::ColumnNotFound(msg) | PolarsError::SchemaFieldNotFound(msg) => {
            BenchError::SchemaError(format!("missing column {}", msg))
        }
        PolarsError::ComputeError(msg) => BenchError::SchemaError(msg.to_string()),
        PolarsError::Context { error, .. } => read_error(*error),
        other => BenchError::PolarsError(other),
    }
}

pub fn read_csv<P: AsRef<Path>>(path: P) -> BenchResult<LazyFrame> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(BenchError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Dataset not found: {:?}", path),
        )));
    }
    LazyCsvReader::new(path)
        .with_has_header(true)
        .with_dtype_overwrite(Some(dtype_overrides()))
        .finish()
        .map_err(read_error)
}

pub fn write_csv<P: AsRef<Path>>(df: &mut DataFrame, path: P) -> BenchResult<()> {
    let mut file = std::fs::File::create(path).map_err(BenchError::IoError)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(BenchError::PolarsError)?;
    Ok(())
}
