use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum BenchError {
    #[error("Configuration error: {0}")]
    #[diagnostic(
        code("DFBENCH-001"),
        help("Please check your benchmark YAML syntax and structure.")
    )]
    ConfigError(#[source] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code("DFBENCH-002"),
        help("Check --rows, --engines and --baseline (or the matching config keys).")
    )]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    #[diagnostic(code("DFBENCH-003"), help("Check file paths and permissions."))]
    IoError(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    #[diagnostic(
        code("DFBENCH-004"),
        help("An error occurred within the polars engine.")
    )]
    PolarsError(#[from] polars::error::PolarsError),

    #[error("CSV error: {0}")]
    #[diagnostic(
        code("DFBENCH-005"),
        help("The dataset file could not be parsed as comma-separated text.")
    )]
    CsvError(#[from] csv::Error),

    #[error("Schema mismatch: {0}")]
    #[diagnostic(
        code("DFBENCH-006"),
        help("The dataset must have columns id (integer), group (text) and value (float).")
    )]
    SchemaError(String),

    #[error("Timing sample for {engine}/{operation} was recorded twice")]
    #[diagnostic(code("DFBENCH-007"))]
    DuplicateSample { engine: String, operation: String },

    #[error("No timing sample for {engine}/{operation}")]
    #[diagnostic(code("DFBENCH-008"))]
    MissingSample { engine: String, operation: String },

    #[error("Report serialization failed: {0}")]
    #[diagnostic(code("DFBENCH-009"))]
    JsonError(#[from] serde_json::Error),

    #[error("pandrs error: {0}")]
    #[diagnostic(
        code("DFBENCH-010"),
        help("An error occurred within the pandrs engine.")
    )]
    PandrsError(#[from] pandrs::PandRSError),

    #[error(transparent)]
    #[diagnostic(code("DFBENCH-000"))]
    Unknown(#[from] anyhow::Error),
}

pub type BenchResult<T> = Result<T, BenchError>;
