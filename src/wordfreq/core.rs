use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::aggregate::merge;
use super::count::{TextEncoding, WordCounts};
use super::error::{Result, WordFreqError};
use super::exec::{NoSink, Parallelism, execute};
use super::plan::{SegmentPlan, plan_segments};
use super::report::IntermediateDir;
use super::source::{ByteSource, FileProbe, FileSource, RangeReader};

/// Configuration for one word-frequency run.
#[derive(Debug, Clone)]
pub struct WordFreqConfig {
    /// Requested number of segments. Must be > 0.
    pub segments: usize,
    pub parallelism: Parallelism,
    pub encoding: TextEncoding,
    /// Where per-segment tables are written, if anywhere.
    pub intermediate_dir: Option<PathBuf>,
}

impl Default for WordFreqConfig {
    fn default() -> Self {
        Self {
            segments: 1,
            parallelism: Parallelism::PerSegment,
            encoding: TextEncoding::Utf8,
            intermediate_dir: None,
        }
    }
}

/// Everything a run produced.
#[derive(Debug)]
pub struct RunReport {
    pub plan: SegmentPlan,
    /// One table per plan entry, in plan order.
    pub segments: Vec<WordCounts>,
    pub total: WordCounts,
    pub intermediate: Option<IntermediateDir>,
}

fn validate(cfg: &WordFreqConfig) -> Result<()> {
    if cfg.segments == 0 {
        return Err(WordFreqError::InvalidArgument(
            "number of segments must be > 0".to_string(),
        ));
    }
    Ok(())
}

/// Open `path` for planning. Fails before any worker exists.
fn open_input(path: &Path) -> Result<FileProbe> {
    FileProbe::open(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => WordFreqError::InputNotFound {
            path: path.to_path_buf(),
        },
        _ => WordFreqError::InputUnreadable {
            path: path.to_path_buf(),
            source,
        },
    })
}

fn run<S, R>(source: &S, reader: &R, cfg: &WordFreqConfig) -> Result<RunReport>
where
    S: ByteSource + ?Sized,
    R: RangeReader + ?Sized,
{
    let plan = plan_segments(source, cfg.segments)?;

    let intermediate = match &cfg.intermediate_dir {
        Some(dir) => Some(IntermediateDir::create(dir)?),
        None => None,
    };

    info!(
        file_size = plan.file_size(),
        segments = plan.len(),
        "counting segments"
    );

    let segments = match &intermediate {
        Some(sink) => execute(&plan, reader, cfg.encoding, cfg.parallelism, sink)?,
        None => execute(&plan, reader, cfg.encoding, cfg.parallelism, &NoSink)?,
    };

    // Every worker has been joined by now
    let total = merge(&segments);
    debug!(
        words = total.total(),
        distinct = total.len(),
        "segments merged"
    );

    Ok(RunReport {
        plan,
        segments,
        total,
        intermediate,
    })
}

/// Count the words of the file at `path`, one worker per planned segment.
pub fn count_file(path: &Path, cfg: &WordFreqConfig) -> Result<RunReport> {
    validate(cfg)?;
    let probe = open_input(path)?;
    let reader = FileSource::new(path, probe.size());
    run(&probe, &reader, cfg)
}

/// Same pipeline over an in-memory buffer.
pub fn count_bytes(data: &[u8], cfg: &WordFreqConfig) -> Result<RunReport> {
    validate(cfg)?;
    run(data, data, cfg)
}
