//! Fans planned ranges out to scoped worker threads and merges what comes back.

use std::{
    fs::File,
    panic::{self, AssertUnwindSafe},
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread,
    time::Instant,
};

use tracing::{debug, info, warn};

use crate::{
    config::Config,
    data::{merge_into, AggregationMap},
    error::{Error, Result},
    plan::{plan, ByteRange, SeekProbe},
    tokenize::aggregate_range,
};

/// Plan `path` into ranges and aggregate them in parallel.
pub fn run(path: &Path, config: &Config) -> Result<AggregationMap> {
    let started = Instant::now();

    let ranges = {
        let file = File::open(path).map_err(|e| Error::file_access(path, e))?;
        let size = file
            .metadata()
            .map_err(|e| Error::file_access(path, e))?
            .len();
        plan(
            &mut SeekProbe::new(file, path),
            size,
            config.workers,
            &config.limits,
        )?
    };

    let map = run_ranges(path, &ranges, config)?;
    info!(
        path = %path.display(),
        workers = ranges.len(),
        keys = map.len(),
        elapsed = ?started.elapsed(),
        "aggregation complete"
    );
    Ok(map)
}

/// One worker per range, each running [`aggregate_range`].
pub fn run_ranges(path: &Path, ranges: &[ByteRange], config: &Config) -> Result<AggregationMap> {
    dispatch(ranges, |range, abort| aggregate_range(path, range, config, abort))
}

/// Run `worker` once per range on scoped threads. The global map lives on
/// this thread only and is merged into as each worker's map arrives, in
/// whatever order they finish.
///
/// The first error wins: it raises the shared abort flag, nothing further is
/// merged, and the error is returned once every worker has wound down. A
/// panicking worker counts as an error like any other.
pub fn dispatch<F>(ranges: &[ByteRange], worker: F) -> Result<AggregationMap>
where
    F: Fn(ByteRange, &AtomicBool) -> Result<AggregationMap> + Sync,
{
    let abort = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel::<(ByteRange, Result<AggregationMap>)>();

    thread::scope(|s| {
        for &range in ranges {
            let tx = tx.clone();
            let abort = &abort;
            let worker = &worker;
            s.spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| worker(range, abort)))
                    .unwrap_or_else(|_| {
                        Err(Error::WorkerPanicked {
                            start: range.start,
                            end: range.end,
                        })
                    });
                // The receiver outlives every worker inside the scope.
                let _ = tx.send((range, result));
            });
        }
        drop(tx);

        let mut global = AggregationMap::default();
        let mut failure = None;

        for (range, result) in rx {
            match result {
                Ok(local) if failure.is_none() => {
                    debug!(start = range.start, end = range.end, keys = local.len(), "merging");
                    merge_into(&mut global, local);
                }
                Ok(_) => {}
                Err(e) => {
                    if failure.is_none() {
                        warn!(
                            start = range.start,
                            end = range.end,
                            error = %e,
                            "worker failed, aborting"
                        );
                        abort.store(true, Ordering::Relaxed);
                        failure = Some(e);
                    }
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(global),
        }
    })
}
