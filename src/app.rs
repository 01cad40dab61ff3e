//! Command-line surface shared by both binaries.

use std::{num::NonZeroUsize, path::PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, DEFAULT_WORKERS};

#[derive(Parser, Debug)]
#[command(version, about = "Per-key min/mean/max over `key;value` rows")]
pub struct Args {
    /// Input file of `key;value` rows
    #[arg(default_value = "measurements.txt")]
    pub path: PathBuf,

    /// Number of byte ranges to split the file into
    #[arg(short, long, env = "BRC_WORKERS", default_value_t = default_workers())]
    pub workers: NonZeroUsize,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

fn default_workers() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_WORKERS).unwrap_or(NonZeroUsize::MIN)
}

impl Args {
    pub fn config(&self) -> Config {
        Config::with_workers(self.workers)
    }
}

/// Logs go to stderr; stdout carries nothing but the report.
/// `RUST_LOG` takes precedence over `-v`.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .with_thread_ids(verbose >= 3)
        .init();
}
