use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::common::io_error_msg;

use super::plan::ByteRange;

/// Errors surfaced by a word-frequency run.
///
/// Argument and input errors are raised before any worker starts.
/// Worker errors are raised only after every worker has been joined.
#[derive(Debug, Error)]
pub enum WordFreqError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("input file not found: {}", .path.display())]
    InputNotFound { path: PathBuf },

    #[error("cannot open '{}' for reading: {}", .path.display(), io_error_msg(.source))]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("segment {index} {range} failed: {}", io_error_msg(.source))]
    Worker {
        index: usize,
        range: ByteRange,
        #[source]
        source: io::Error,
    },

    #[error("segment {index} worker panicked")]
    WorkerPanicked { index: usize },

    #[error("cannot start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("{}", io_error_msg(.0))]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, WordFreqError>;
