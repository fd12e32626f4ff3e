//! stowage CLI tool

#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use stowage::config::StowageConfig;
use stowage::observability::{self, LogFormat};
use stowage_cli::FilesCommand;

#[derive(Parser)]
#[command(name = "stowage")]
#[command(version)]
#[command(about = "Store, find and delete UUID-addressed files", long_about = None)]
struct Cli {
    /// Configuration file; defaults to the standard search locations
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log output format (pretty, json)
    #[arg(long, global = true, default_value = "pretty")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: FilesCommand,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    observability::init_with(cli.log_format, Some("warn"))?;

    let config = match &cli.config {
        Some(path) => StowageConfig::load_from(&path.to_string_lossy())?,
        None => StowageConfig::load()?,
    };

    cli.command.execute(&config).await
}
