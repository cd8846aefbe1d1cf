//! Flushgate CLI - load generator and batch file inspector.
//!
//! `load` drives a batch gate with concurrent producers and reports what the
//! flusher did; `inspect` reads back a batch file written by `load --output`.

mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Flushgate batching write buffer tool.
#[derive(Parser)]
#[command(name = "flushgate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "table")]
    format: OutputFormat,

    /// Suppress progress and info messages
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

/// Output format options.
#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table format (default for TTY)
    #[default]
    Table,
    /// Machine-readable JSON format
    Json,
}

/// Flush mode as accepted on the command line.
#[derive(Clone, Copy, ValueEnum, Default)]
enum ModeArg {
    /// Hold the lock while the sink runs
    #[default]
    Locked,
    /// Release the lock while the sink runs
    Swap,
}

impl From<ModeArg> for flushgate_core::FlushMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Locked => Self::Locked,
            ModeArg::Swap => Self::Swap,
        }
    }
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run concurrent producers against a batch gate
    Load(LoadArgs),

    /// List the batches in a batch file
    Inspect {
        /// Path to the batch file
        path: PathBuf,

        /// Fail on a damaged frame instead of stopping before it
        #[arg(long)]
        strict: bool,
    },
}

/// Arguments for `load`.
#[derive(clap::Args)]
struct LoadArgs {
    /// Flush threshold in bytes
    #[arg(long, default_value_t = 1024 * 1024)]
    threshold: usize,

    /// Number of producer threads
    #[arg(long, short, default_value_t = 4)]
    producers: usize,

    /// Events appended by each producer
    #[arg(long, short, default_value_t = 10_000)]
    events: usize,

    /// Size of each event in bytes
    #[arg(long, default_value_t = 128)]
    event_size: usize,

    /// Flush mode
    #[arg(long, value_enum, default_value = "locked")]
    mode: ModeArg,

    /// Write batches to this file (discarded if omitted)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Fsync the batch file after every batch
    #[arg(long, requires = "output")]
    sync: bool,

    /// Retries per event after a capacity-exceeded rejection
    #[arg(long, default_value_t = 1000)]
    retries: u32,

    /// Pause between retries, in milliseconds
    #[arg(long, default_value_t = 1)]
    backoff_ms: u64,
}

fn main() {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else if !cli.quiet {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    let result = match cli.command {
        Commands::Load(args) => commands::load::run(&args, cli.format, cli.quiet),
        Commands::Inspect { path, strict } => {
            commands::inspect::run(&path, strict, cli.format, cli.quiet)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
