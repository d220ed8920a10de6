mod decode;
mod summary;

use std::fs::File;
use std::io::{stderr, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use meddea::{Apid, MissionConfig, Registry};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Mission configuration JSON file. Any values not provided use the built-in defaults
    /// of 8 pixels per detector, 4 detectors, and the standard MeDDEA APIDs.
    #[arg(short, long, global = true, value_name = "path")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize the packets in a level 0 file.
    Summary {
        /// Input level 0 file
        input: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: summary::Format,
    },
    /// Decode packets and write the records as JSON to stdout.
    Decode {
        /// Input level 0 file
        input: PathBuf,

        /// Only output these APIDs.
        #[arg(short, long, value_delimiter = ',', value_name = "csv")]
        apids: Vec<Apid>,

        /// Include the primary header values in each record.
        #[arg(long, action)]
        headers: bool,
    },
}

fn load_config(path: Option<&Path>) -> Result<MissionConfig> {
    let Some(path) = path else {
        return Ok(MissionConfig::default());
    };
    let file = File::open(path).with_context(|| format!("opening config {path:?}"))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing config {path:?}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_env("MEDDEA_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_deref())?;
    debug!("{config:?}");
    let registry = Registry::new(config).context("building schema registry")?;

    match &cli.command {
        Commands::Summary { input, format } => summary::summary(input, &registry, format),
        Commands::Decode {
            input,
            apids,
            headers,
        } => decode::decode(input, &registry, apids, *headers),
    }
}
