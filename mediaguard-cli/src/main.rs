//! MediaGuard CLI - Offline media manipulation analysis.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;
mod metrics;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Usage error (no classifier, unknown media kind)
  65  Data error (rejected or undecodable media)
  66  Input file or directory not found
  69  Classifier or ffmpeg unavailable
  74  Cannot write output file";

#[derive(Parser)]
#[command(name = "mediaguard")]
#[command(author, version, about = "Media manipulation analysis", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Suppress human-readable output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable debug logging on stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an image or video for manipulation
    Analyze(commands::analyze::AnalyzeArgs),

    /// Print the SHA3-256 content hash of files
    Hash {
        /// Files to hash
        #[arg(value_name = "FILE", required = true)]
        files: Vec<std::path::PathBuf>,
    },

    /// Score labelled folders of videos and report detection metrics
    Evaluate(commands::evaluate::EvaluateArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<()> = match cli.command {
        Commands::Analyze(args) => commands::analyze::execute(args, cli.quiet).await,
        Commands::Hash { files } => commands::hash::execute(files),
        Commands::Evaluate(args) => commands::evaluate::execute(args, cli.quiet).await,
    };

    if let Err(err) = result {
        let exit = ExitCode::from_anyhow(&err);
        if let Some(message) = exit.message {
            eprintln!("{} {}", "Error:".red().bold(), message);
        }
        std::process::exit(exit.code);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "info,mediaguard=debug,mediaguard_core=debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
