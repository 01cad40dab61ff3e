//! Reference run: the whole file is memory-mapped and tokenized on the main
//! thread, bypassing the planner and the coordinator. Its report must match
//! `multi_threaded` for any worker count.

use std::{
    fs::File,
    io::{self, BufWriter},
    process::ExitCode,
};

use anyhow::Context;
use brc_stats::{
    aggregate_slice,
    app::{self, Args},
    report, AggregationMap, Limits,
};
use clap::Parser;
use tracing::info;

fn run(args: &Args) -> anyhow::Result<()> {
    let file =
        File::open(&args.path).with_context(|| format!("cannot access {}", args.path.display()))?;
    let len = file.metadata()?.len();

    let map = if len == 0 {
        AggregationMap::default()
    } else {
        // SAFETY: the mapping is read-only and the input is not expected to
        // change while it is being aggregated.
        let mmap = unsafe { memmap2::Mmap::map(&file) }
            .with_context(|| format!("mapping {}", args.path.display()))?;
        aggregate_slice(&mmap[..], Limits::DEFAULT)
            .with_context(|| format!("aggregating {}", args.path.display()))?
    };
    drop(file);
    info!(keys = map.len(), "aggregation complete");

    let stdout = io::stdout().lock();
    let mut writer = BufWriter::new(stdout);
    report::write_report(&mut writer, &map).context("writing report")?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    app::init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
