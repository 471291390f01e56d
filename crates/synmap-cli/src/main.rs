//! Synmap CLI - cell-class cross-tabulation of synaptic dynamics.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "synmap")]
#[command(author, version, about = "Synmap - synaptic dynamics by cell class", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: synmap.toml in the current or a parent directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new synmap project
    Init {
        /// Project directory (default: current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Import a JSON dataset into the catalog
    Import {
        /// Dataset file
        input: PathBuf,

        /// Dataset name (default: name from the file's metadata)
        #[arg(short, long)]
        name: Option<String>,

        /// Dataset version (default: version from the file's metadata)
        #[arg(long = "dataset-version")]
        version: Option<String>,

        /// Replace an existing dataset with the same name and version
        #[arg(short, long)]
        force: bool,
    },

    /// Show store statistics
    Stats,

    /// Show how cells distribute over the configured classes
    Classify,

    /// Print the class-by-class matrix for a metric
    Matrix {
        /// Metric column (default: from config)
        #[arg(short, long)]
        metric: Option<String>,

        /// Display order, comma separated (default: from config)
        #[arg(short, long, value_delimiter = ',')]
        order: Option<Vec<String>>,
    },

    /// Export the matrix as a heatmap payload or CSV
    Export {
        /// Output file path
        output: PathBuf,

        /// Export format: json or csv
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Metric column (default: from config)
        #[arg(short, long)]
        metric: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let load = || Config::load(cli.config.as_deref());

    match cli.command {
        Commands::Init { path } => commands::init::run(path),
        Commands::Import { input, name, version, force } => {
            commands::import::run(&load()?, &input, name, version, force)
        }
        Commands::Stats => commands::stats::run(&load()?),
        Commands::Classify => commands::classify::run(&load()?),
        Commands::Matrix { metric, order } => {
            commands::matrix::run(&load()?, metric.as_deref(), order)
        }
        Commands::Export { output, format, metric } => {
            commands::export::run(&load()?, &output, &format, metric.as_deref())
        }
    }
}
