//! Command implementations for the station averages CLI
//!
//! Wires configuration, the aggregate store, the publisher, the partitioned
//! pipeline, the record source and the metrics endpoint together.

use crate::app::adapters::line_source::LineSource;
use crate::app::adapters::metrics_server::MetricsServer;
use crate::app::adapters::synthetic_source::SyntheticSource;
use crate::app::services::aggregate_store::{AggregateStore, Changelog};
use crate::app::services::average_publisher::{
    AveragePublisher, PrometheusGauges, StdoutSink, compute_average,
};
use crate::app::services::pipeline::{PartitionedPipeline, Pipeline};
use crate::app::services::record_processor::StatsSnapshot;
use crate::cli::args::{Args, Commands, GeneratorArgs, InspectArgs, LogArgs, ProduceArgs, RunArgs};
use crate::config::{AggregatorConfig, SourceConfig, SourceKind};
use crate::error::AggregatorError;
use anyhow::{Context, Result, bail};
use colored::*;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Dispatch the selected subcommand
pub async fn run(args: Args, cancel: CancellationToken) -> Result<()> {
    setup_logging(&args.log_args());

    match args.command {
        Some(Commands::Run(run_args)) => run_pipeline(run_args, cancel).await,
        Some(Commands::Produce(produce_args)) => produce(produce_args, cancel).await,
        Some(Commands::Inspect(inspect_args)) => inspect(inspect_args).await,
        None => Ok(()),
    }
}

/// Set up structured logging on stderr
pub fn setup_logging(args: &LogArgs) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("station_averages={}", log_level)));

    let result = if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if result.is_ok() {
        debug!("Logging initialized at level: {}", log_level);
    }
}

/// Build the effective configuration: file, then environment, then flags
pub fn load_configuration(args: &RunArgs) -> Result<AggregatorConfig> {
    let config = match &args.config {
        Some(path) => AggregatorConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AggregatorConfig::default(),
    };

    let config = config
        .apply_env()
        .context("Invalid environment override")?;
    let config = apply_cli_overrides(config, args);

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Apply command-line flags on top of `config`
pub fn apply_cli_overrides(mut config: AggregatorConfig, args: &RunArgs) -> AggregatorConfig {
    if let Some(threshold) = args.threshold {
        config = config.with_threshold(threshold);
    }
    if let Some(partitions) = args.partitions {
        config = config.with_partitions(partitions);
    }
    if let Some(port) = args.metrics_port {
        config.metrics.listen_port = port;
    }
    if args.no_metrics {
        config = config.without_metrics();
    }
    if let Some(path) = &args.changelog {
        config = config.with_changelog(path);
    }
    if let Some(input) = &args.input {
        if input.as_os_str() == "-" {
            config.source.kind = SourceKind::Stdin;
            config.source.path = None;
        } else {
            config.source.kind = SourceKind::File;
            config.source.path = Some(input.clone());
        }
    }
    apply_generator_overrides(&mut config.source, &args.generator);
    config
}

fn apply_generator_overrides(source: &mut SourceConfig, args: &GeneratorArgs) {
    if let Some(count) = args.count {
        source.count = count;
    }
    if let Some(interval_ms) = args.interval_ms {
        source.interval_ms = interval_ms;
    }
    if args.seed.is_some() {
        source.seed = args.seed;
    }
}

async fn run_pipeline(args: RunArgs, cancel: CancellationToken) -> Result<()> {
    let config = load_configuration(&args)?;
    let start = Instant::now();

    info!(
        "{} consuming '{}' from {} (threshold {:.1}°C)",
        config.transport.application_id,
        config.transport.input_stream,
        config.transport.endpoint,
        config.pipeline.temperature_threshold
    );

    let store = match &config.store.changelog_path {
        Some(path) => AggregateStore::open(path, config.store.compact_on_open)
            .await
            .with_context(|| format!("Failed to recover aggregates from {}", path.display()))?,
        None => {
            warn!("No changelog configured; aggregates will not survive a restart");
            AggregateStore::in_memory()
        }
    };
    let store = Arc::new(store);

    let gauges = Arc::new(PrometheusGauges::new().context("Failed to register gauges")?);
    let sink = Arc::new(StdoutSink::new(config.transport.output_stream.clone()));
    let publisher = Arc::new(AveragePublisher::new(sink, gauges.clone()));
    let pipeline = Arc::new(Pipeline::new(
        config.pipeline.temperature_threshold,
        Arc::clone(&store),
        publisher,
    ));
    let stats = Arc::clone(pipeline.stats());

    let metrics_server = if config.metrics.enabled {
        let addr = config.metrics.socket_addr()?;
        Some(
            MetricsServer::start(addr, gauges)
                .await
                .context("Failed to start metrics endpoint")?,
        )
    } else {
        None
    };

    let running = PartitionedPipeline::spawn(
        pipeline,
        config.pipeline.partitions,
        config.pipeline.channel_capacity,
    );

    let fed = match config.source.kind {
        SourceKind::Synthetic => match SyntheticSource::from_config(&config.source) {
            Ok(source) => source.feed(&running, &cancel).await,
            Err(e) => Err(e),
        },
        SourceKind::File => match &config.source.path {
            Some(path) => feed_lines(LineSource::file(path), &running, &cancel).await,
            None => Err(AggregatorError::configuration(
                "file source requires a path",
            )),
        },
        SourceKind::Stdin => feed_lines(LineSource::Stdin, &running, &cancel).await,
    };

    if fed.is_ok() && metrics_server.is_some() && !cancel.is_cancelled() {
        info!("Input exhausted; serving metrics until interrupted");
        cancel.cancelled().await;
    }

    // Drain queued records even when the source failed
    let drained = running.shutdown().await;

    if let Some(server) = metrics_server {
        if let Err(e) = server.stop().await {
            warn!("Metrics endpoint did not stop cleanly: {}", e);
        }
    }

    let fed = fed.context("Record source failed")?;
    drained.context("Pipeline failed while draining")?;

    print_summary(&stats.snapshot(), fed, store.len().await, start.elapsed());
    Ok(())
}

async fn feed_lines(
    source: LineSource,
    running: &PartitionedPipeline,
    cancel: &CancellationToken,
) -> crate::error::Result<u64> {
    info!("Reading records from {}", source.describe());
    source.feed(running, cancel).await
}

async fn produce(args: ProduceArgs, cancel: CancellationToken) -> Result<()> {
    let mut source_config = SourceConfig::default();
    apply_generator_overrides(&mut source_config, &args.generator);

    let source = SyntheticSource::from_config(&source_config)?;
    let stdout = std::io::stdout();

    let produced = source
        .run(&cancel, |record| {
            let written = writeln!(stdout.lock(), "{}", record.value);
            async move { written.map_err(AggregatorError::from) }
        })
        .await?;

    info!("Produced {} records", produced);
    Ok(())
}

async fn inspect(args: InspectArgs) -> Result<()> {
    let path: &Path = &args.changelog;
    if !path.exists() {
        bail!("Changelog {} does not exist", path.display());
    }

    let aggregates = Changelog::replay(path)
        .await
        .with_context(|| format!("Failed to replay {}", path.display()))?;

    let mut stations: Vec<&String> = aggregates.keys().collect();
    stations.sort();

    let mut averages = Vec::with_capacity(stations.len());
    for station in stations {
        let aggregate = &aggregates[station];
        if aggregate.is_empty() {
            continue;
        }
        averages.push((compute_average(station, aggregate)?, aggregate.count()));
    }

    if args.json {
        let published: Vec<_> = averages.iter().map(|(average, _)| average).collect();
        println!("{}", serde_json::to_string_pretty(&published)?);
        return Ok(());
    }

    println!(
        "{} {} stations in {}",
        "Changelog:".bold(),
        averages.len(),
        path.display()
    );
    for (average, count) in &averages {
        println!(
            "  {:<12} {} ({} readings)",
            average.station.cyan(),
            average.to_line(),
            count
        );
    }
    Ok(())
}

fn print_summary(stats: &StatsSnapshot, fed: u64, stations: usize, elapsed: Duration) {
    println!();
    println!("{}", "Pipeline summary".bold().green());
    println!("  Records read:      {}", fed);
    println!("  Processed:         {}", stats.received);
    println!("  Malformed:         {}", stats.malformed.to_string().yellow());
    println!("  Below threshold:   {}", stats.filtered);
    println!("  Published:         {}", stats.published.to_string().green());
    println!("  Acceptance rate:   {:.1}%", stats.acceptance_rate());
    println!("  Stations:          {}", stations);
    if stats.has_side_effect_failures() {
        println!(
            "  {} sink {}, gauges {}",
            "Side-effect failures:".red(),
            stats.sink_failures,
            stats.gauge_failures
        );
    }
    println!("  Elapsed:           {:.2?}", elapsed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["station-averages", "run"];
        full.extend_from_slice(argv);
        match Args::try_parse_from(full).unwrap().command {
            Some(Commands::Run(args)) => args,
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_cli_overrides_win() {
        let config: AggregatorConfig = "[pipeline]\ntemperature_threshold = 10.0\n".parse().unwrap();
        let config = apply_cli_overrides(
            config,
            &run_args(&["--threshold", "35", "--no-metrics", "--input", "-", "--seed", "7"]),
        );

        assert_eq!(config.pipeline.temperature_threshold, 35.0);
        assert!(!config.metrics.enabled);
        assert_eq!(config.source.kind, SourceKind::Stdin);
        assert_eq!(config.source.seed, Some(7));
    }

    #[test]
    fn test_file_input_sets_path() {
        let config = apply_cli_overrides(
            AggregatorConfig::default(),
            &run_args(&["--input", "readings.txt", "--changelog", "state.jsonl"]),
        );
        assert_eq!(config.source.kind, SourceKind::File);
        assert_eq!(config.source.path, Some(PathBuf::from("readings.txt")));
        assert_eq!(config.store.changelog_path, Some(PathBuf::from("state.jsonl")));
    }

    #[test]
    fn test_unset_flags_keep_config() {
        let config: AggregatorConfig = "[source]\ncount = 7\ninterval_ms = 5\n".parse().unwrap();
        let config = apply_cli_overrides(config, &run_args(&[]));
        assert_eq!(config.source.count, 7);
        assert_eq!(config.source.interval_ms, 5);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_load_configuration_rejects_zero_partitions() {
        let result = load_configuration(&run_args(&["--partitions", "0"]));
        assert!(result.is_err());
    }
}
