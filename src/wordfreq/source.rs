use std::cell::RefCell;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::common::io::{FileData, open_noatime, read_exact_at, read_window};

use super::plan::ByteRange;

/// Random access to single bytes, used by the planner to find boundaries.
pub trait ByteSource {
    /// Total number of addressable bytes.
    fn size(&self) -> u64;

    /// The byte at `offset`. `offset` must be `< size()`.
    fn byte_at(&self, offset: u64) -> io::Result<u8>;
}

/// Reads one planned window. Shared by all workers, so it must be `Sync`;
/// implementations must not keep per-call cursor state.
pub trait RangeReader: Sync {
    fn read_range(&self, range: ByteRange) -> io::Result<FileData>;
}

fn out_of_bounds(offset: u64, size: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("offset {} is past the end of a {}-byte input", offset, size),
    )
}

impl ByteSource for [u8] {
    #[inline]
    fn size(&self) -> u64 {
        self.len() as u64
    }

    #[inline]
    fn byte_at(&self, offset: u64) -> io::Result<u8> {
        self.get(offset as usize)
            .copied()
            .ok_or_else(|| out_of_bounds(offset, self.len() as u64))
    }
}

impl RangeReader for [u8] {
    fn read_range(&self, range: ByteRange) -> io::Result<FileData> {
        let end = range.end as usize;
        if end > self.len() {
            return Err(out_of_bounds(range.end, self.len() as u64));
        }
        Ok(FileData::Owned(self[range.start as usize..end].to_vec()))
    }
}

/// Bytes read ahead per probe miss. Boundary scans walk forward a few bytes
/// at a time, so one window usually answers a whole scan.
const PROBE_WINDOW: usize = 4096;

struct Window {
    start: u64,
    buf: Vec<u8>,
}

/// Planner-side view of a file: one handle plus a small read-ahead window,
/// so boundary adjustment costs one pread per window instead of one per byte.
pub struct FileProbe {
    file: File,
    size: u64,
    window: RefCell<Window>,
}

impl FileProbe {
    /// Open `path` for planning. Directories are refused.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = open_noatime(path)?;
        let meta = file.metadata()?;
        if meta.is_dir() {
            return Err(io::Error::from(io::ErrorKind::IsADirectory));
        }
        Ok(Self::new(file, meta.len()))
    }

    pub fn new(file: File, size: u64) -> Self {
        FileProbe {
            file,
            size,
            window: RefCell::new(Window {
                start: 0,
                buf: Vec::new(),
            }),
        }
    }
}

impl ByteSource for FileProbe {
    fn size(&self) -> u64 {
        self.size
    }

    fn byte_at(&self, offset: u64) -> io::Result<u8> {
        if offset >= self.size {
            return Err(out_of_bounds(offset, self.size));
        }
        let mut w = self.window.borrow_mut();
        let hit = offset >= w.start && offset < w.start + w.buf.len() as u64;
        if !hit {
            let len = (self.size - offset).min(PROBE_WINDOW as u64) as usize;
            w.buf.resize(len, 0);
            w.start = offset;
            if let Err(e) = read_exact_at(&self.file, &mut w.buf, offset) {
                w.buf.clear();
                return Err(e);
            }
        }
        Ok(w.buf[(offset - w.start) as usize])
    }
}

/// Worker-side view of a file: every `read_range` opens its own handle and
/// reads only the requested window.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    size: u64,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        FileSource {
            path: path.into(),
            size,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RangeReader for FileSource {
    fn read_range(&self, range: ByteRange) -> io::Result<FileData> {
        if range.end > self.size {
            return Err(out_of_bounds(range.end, self.size));
        }
        let file = open_noatime(&self.path)?;
        read_window(&file, range.start, range.len())
    }
}
