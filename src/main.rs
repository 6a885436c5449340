use clap::{Parser, ValueEnum};
use dfbench::config::{BenchConfig, ConfigOverrides};
use dfbench::dataset::parse_row_count;
use dfbench::engine::EngineKind;
use miette::Result;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Clone, ValueEnum, Debug)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "dfbench")]
#[command(version)]
#[command(about = "Time read, group-by, filter and join across dataframe engines", long_about = None)]
struct Cli {
    /// Number of rows to generate (e.g. 1000, 500K, 10M)
    #[arg(long, value_name = "N", value_parser = parse_row_count)]
    rows: Option<usize>,

    /// Dataset path (default: test_data_<rows>.csv)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Random seed for dataset generation
    #[arg(long, conflicts_with = "unseeded")]
    seed: Option<u64>,

    /// Seed dataset generation from OS entropy
    #[arg(long)]
    unseeded: bool,

    /// Regenerate the dataset even if the file exists
    #[arg(long)]
    regenerate: bool,

    /// Engines to benchmark, in order
    #[arg(long, value_enum, value_delimiter = ',')]
    engines: Option<Vec<EngineKind>>,

    /// Engine the others are compared against (default: first engine)
    #[arg(long, value_enum)]
    baseline: Option<EngineKind>,

    /// YAML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also write the results as JSON
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Increase logging verbosity (Info -> Debug)
    #[arg(short, long)]
    verbose: bool,

    /// Silence all logs
    #[arg(short, long)]
    quiet: bool,

    /// Log format (text or json)
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    // DFBENCH_LOG > CLI args
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var("DFBENCH_LOG")
        .from_env_lossy();

    let run_id = Uuid::new_v4();

    match cli.log_format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .json()
                .with_span_list(false)
                .with_current_span(false)
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    let _span = tracing::info_span!("root", run_id = %run_id).entered();

    let base = match &cli.config {
        Some(path) => BenchConfig::from_path(path)?,
        None => BenchConfig::default(),
    };
    let config = base.apply(ConfigOverrides {
        row_count: cli.rows,
        output_path: cli.output,
        seed: cli.seed,
        unseeded: cli.unseeded,
        regenerate: cli.regenerate,
        engines: cli.engines,
        baseline: cli.baseline,
        report_json: cli.json,
    });

    let mut stdout = std::io::stdout().lock();
    dfbench::runner::execute(&config, run_id, &mut stdout)?;

    Ok(())
}
