use std::{
    io::{self, BufWriter},
    process::ExitCode,
};

use anyhow::Context;
use brc_stats::{
    app::{self, Args},
    coordinator, report,
};
use clap::Parser;

fn run(args: &Args) -> anyhow::Result<()> {
    let map = coordinator::run(&args.path, &args.config())
        .with_context(|| format!("aggregating {}", args.path.display()))?;

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
