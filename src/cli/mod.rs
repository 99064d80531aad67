//! CLI module for the usage dashboard
//!
//! - `serve`: HTTP API server
//! - `snapshot`: print one snapshot as JSON
//! - `import`: load secrets from a file into the credential store

pub mod import;
pub mod serve;
pub mod snapshot;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Usage Dashboard - aggregated usage across a pool of upstream API keys
#[derive(Parser)]
#[command(name = "usage-dashboard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Fetch usage for every stored credential and print the snapshot as JSON
    Snapshot {
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Import secrets, one per line, into the configured credential store
    Import {
        /// File to read; blank lines and lines starting with '#' are ignored
        file: PathBuf,
    },
}

/// Load `.env`, configuration and logging shared by every subcommand
pub(crate) fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration, using defaults: {}", e);
            AppConfig::default()
        }
    };

    logging::init_logging(&config.logging);
    config
}
