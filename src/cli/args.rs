//! Command-line argument definitions for the station averages service
//!
//! Flags override values from the configuration file and environment.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the station averages service
///
/// Consumes `station,temperature,humidity` readings, keeps a running average
/// per station for readings above a temperature threshold, and publishes each
/// updated average downstream and as Prometheus gauges.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "station-averages",
    version,
    about = "Running per-station temperature and humidity averages from a weather stream",
    long_about = "Reads raw weather station records, drops readings at or below a temperature \
                  threshold, converts temperatures to Fahrenheit and maintains a running average \
                  per station. Every update is written to the output stream and exposed as \
                  Prometheus gauges."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Run the aggregation pipeline
    Run(RunArgs),
    /// Print synthetic weather records to stdout
    Produce(ProduceArgs),
    /// Replay a changelog and print the current average per station
    Inspect(InspectArgs),
}

/// Verbosity flags shared by every command
#[derive(Debug, Clone, Default, ClapArgs)]
pub struct LogArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Enable verbose logging (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors. Overrides verbose settings.
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl LogArgs {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }
}

#[derive(Debug, Clone, Default, ClapArgs)]
pub struct RunArgs {
    /// TOML configuration file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Readings must be strictly above this temperature (Celsius)
    #[arg(short = 't', long = "threshold", value_name = "CELSIUS", allow_negative_numbers = true)]
    pub threshold: Option<f64>,

    /// Port for the Prometheus scrape endpoint
    #[arg(long = "metrics-port", value_name = "PORT")]
    pub metrics_port: Option<u16>,

    /// Do not start the metrics endpoint
    #[arg(long = "no-metrics")]
    pub no_metrics: bool,

    /// Number of partition workers (defaults to the CPU count)
    #[arg(short = 'p', long = "partitions", value_name = "N")]
    pub partitions: Option<usize>,

    /// Persist aggregates to this changelog and recover from it on start
    #[arg(long = "changelog", value_name = "PATH")]
    pub changelog: Option<PathBuf>,

    /// Read raw records from a file, or `-` for stdin, instead of generating them
    #[arg(short = 'i', long = "input", value_name = "PATH")]
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub generator: GeneratorArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

/// Synthetic generator overrides
#[derive(Debug, Clone, Default, ClapArgs)]
pub struct GeneratorArgs {
    /// Number of records to generate (0 for no limit)
    #[arg(short = 'n', long = "count", value_name = "N")]
    pub count: Option<u64>,

    /// Delay between generated records in milliseconds
    #[arg(long = "interval-ms", value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Seed for reproducible generated records
    #[arg(long = "seed", value_name = "SEED")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, ClapArgs)]
pub struct ProduceArgs {
    #[command(flatten)]
    pub generator: GeneratorArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct InspectArgs {
    /// Changelog file to replay
    #[arg(long = "changelog", value_name = "PATH")]
    pub changelog: PathBuf,

    /// Print the aggregates as JSON
    #[arg(long = "json")]
    pub json: bool,

    #[command(flatten)]
    pub log: LogArgs,
}

impl Args {
    pub fn log_args(&self) -> LogArgs {
        match &self.command {
            Some(Commands::Run(args)) => args.log.clone(),
            Some(Commands::Produce(args)) => args.log.clone(),
            Some(Commands::Inspect(args)) => args.log.clone(),
            None => LogArgs::default(),
        }
    }
}
