use std::io;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use rayon::prelude::*;
use tracing::{debug, warn};

use super::count::{TextEncoding, WordCounts, count_words};
use super::error::{Result, WordFreqError};
use super::plan::{ByteRange, SegmentPlan};
use super::source::RangeReader;

/// How segment workers are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Parallelism {
    /// One scoped OS thread per planned segment.
    #[default]
    PerSegment,
    /// A rayon pool of at most this many threads.
    Pool(NonZeroUsize),
}

/// Receives each segment's table from inside its worker, after counting.
/// An error here fails that segment.
pub trait SegmentSink: Sync {
    fn accept(&self, index: usize, range: ByteRange, counts: &WordCounts) -> io::Result<()>;
}

/// Sink that keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSink;

impl SegmentSink for NoSink {
    fn accept(&self, _: usize, _: ByteRange, _: &WordCounts) -> io::Result<()> {
        Ok(())
    }
}

fn run_segment<R, K>(
    index: usize,
    range: ByteRange,
    reader: &R,
    encoding: TextEncoding,
    sink: &K,
) -> Result<WordCounts>
where
    R: RangeReader + ?Sized,
    K: SegmentSink + ?Sized,
{
    let worker_err = |source| WordFreqError::Worker {
        index,
        range,
        source,
    };

    debug!(index, start = range.start, end = range.end, "segment started");
    let data = reader.read_range(range).map_err(worker_err)?;
    let counts = count_words(&data, encoding);
    sink.accept(index, range, &counts).map_err(worker_err)?;
    debug!(
        index,
        words = counts.total(),
        distinct = counts.len(),
        "segment finished"
    );
    Ok(counts)
}

/// Count every segment of `plan` concurrently.
///
/// Returns one table per plan entry, in plan order, only after every worker
/// has finished. If any worker failed, the first failure in plan order is
/// returned and no tables are.
pub fn execute<R, K>(
    plan: &SegmentPlan,
    reader: &R,
    encoding: TextEncoding,
    parallelism: Parallelism,
    sink: &K,
) -> Result<Vec<WordCounts>>
where
    R: RangeReader + ?Sized,
    K: SegmentSink + ?Sized,
{
    let results = match parallelism {
        Parallelism::PerSegment => execute_threads(plan, reader, encoding, sink),
        Parallelism::Pool(n) => execute_pool(plan, reader, encoding, n, sink)?,
    };
    collect_results(results)
}

/// Thread per segment. Each worker hands its table back through its join
/// handle, so there is no shared result slot to lock.
fn execute_threads<R, K>(
    plan: &SegmentPlan,
    reader: &R,
    encoding: TextEncoding,
    sink: &K,
) -> Vec<Result<WordCounts>>
where
    R: RangeReader + ?Sized,
    K: SegmentSink + ?Sized,
{
    thread::scope(|s| {
        let handles: Vec<_> = plan
            .iter()
            .enumerate()
            .map(|(index, &range)| {
                thread::Builder::new()
                    .name(format!("segment-{}", index))
                    .spawn_scoped(s, move || run_segment(index, range, reader, encoding, sink))
                    .map_err(|source| WordFreqError::Worker {
                        index,
                        range,
                        source,
                    })
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(index, h)| match h {
                Ok(h) => h
                    .join()
                    .unwrap_or(Err(WordFreqError::WorkerPanicked { index })),
                Err(e) => Err(e),
            })
            .collect()
    })
}

/// Bounded pool. The ordered `collect` keeps results keyed by plan index
/// and does not return until every segment is done.
fn execute_pool<R, K>(
    plan: &SegmentPlan,
    reader: &R,
    encoding: TextEncoding,
    threads: NonZeroUsize,
    sink: &K,
) -> Result<Vec<Result<WordCounts>>>
where
    R: RangeReader + ?Sized,
    K: SegmentSink + ?Sized,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.get())
        .thread_name(|i| format!("segment-pool-{}", i))
        .build()?;

    Ok(pool.install(|| {
        plan.ranges()
            .par_iter()
            .enumerate()
            .map(|(index, &range)| {
                panic::catch_unwind(AssertUnwindSafe(|| {
                    run_segment(index, range, reader, encoding, sink)
                }))
                .unwrap_or(Err(WordFreqError::WorkerPanicked { index }))
            })
            .collect()
    }))
}

fn collect_results(results: Vec<Result<WordCounts>>) -> Result<Vec<WordCounts>> {
    let mut tables = Vec::with_capacity(results.len());
    let mut first_err = None;
    for r in results {
        match r {
            Ok(c) => tables.push(c),
            Err(e) => {
                warn!("{}", e);
                first_err.get_or_insert(e);
            }
        }
    }
    match first_err {
        Some(e) => Err(e),
        None => Ok(tables),
    }
}
