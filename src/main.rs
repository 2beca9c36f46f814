use clap::Parser;
use station_averages::cli::{args::Args, commands};
use std::process;
use tokio_util::sync::CancellationToken;

fn main() {
    let args = Args::parse();

    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        let cancellation_token = CancellationToken::new();

        // Ctrl-C stops the sources; queued records are still drained
        let signal_token = cancellation_token.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    eprintln!("\nReceived CTRL+C, shutting down gracefully...");
                    signal_token.cancel();
                }
                Err(e) => eprintln!("Failed to install CTRL+C signal handler: {}", e),
            }
        });

        commands::run(args, cancellation_token).await
    });

    if let Err(error) = result {
        eprintln!("Error: {:#}", error);
        process::exit(1);
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("Station Averages - running weather station averages");
    println!("===================================================");
    println!();
    println!("Consume station,temperature,humidity readings, keep a running average per");
    println!("station for readings above a temperature threshold, and publish each update.");
    println!();
    println!("USAGE:");
    println!("    station-averages <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    run         Run the aggregation pipeline");
    println!("    produce     Print synthetic weather records to stdout");
    println!("    inspect     Replay a changelog and print the current averages");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("EXAMPLES:");
    println!("    # Aggregate 100 synthetic readings and serve metrics on :1234");
    println!("    station-averages run");
    println!();
    println!("    # Pipe generated records through a durable pipeline");
    println!("    station-averages produce --interval-ms 10 | \\");
    println!("        station-averages run --input - --changelog state/averages.jsonl --no-metrics");
    println!();
    println!("    # Show the averages recovered from a changelog");
    println!("    station-averages inspect --changelog state/averages.jsonl");
    println!();
    println!("For detailed help on any command, use:");
    println!("    station-averages <COMMAND> --help");
}
