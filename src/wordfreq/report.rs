use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::count::WordCounts;
use super::exec::SegmentSink;
use super::plan::{ByteRange, SegmentPlan};

/// Write `word<TAB>count` lines, descending count then ascending word.
pub fn write_table(out: &mut impl Write, counts: &WordCounts) -> io::Result<()> {
    let mut num = itoa::Buffer::new();
    for (word, n) in counts.sorted() {
        out.write_all(word.as_bytes())?;
        out.write_all(b"\t")?;
        out.write_all(num.format(n).as_bytes())?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Diagnostic listing of the planned ranges.
pub fn write_plan(out: &mut impl Write, plan: &SegmentPlan) -> io::Result<()> {
    writeln!(out, "[INFO] File size: {} bytes", plan.file_size())?;
    writeln!(out, "[INFO] Segments (byte ranges):")?;
    for (i, r) in plan.iter().enumerate() {
        writeln!(out, "  Thread {}: {} length={}", i, r, r.len())?;
    }
    Ok(())
}

/// Per-segment tables persisted as `thread_<i>_counts.txt` under one directory.
#[derive(Debug, Clone)]
pub struct IntermediateDir {
    dir: PathBuf,
}

impl IntermediateDir {
    /// Create `dir` (and parents) if missing.
    pub fn create(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(IntermediateDir { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir.join(format!("thread_{}_counts.txt", index))
    }
}

impl SegmentSink for IntermediateDir {
    fn accept(&self, index: usize, _range: ByteRange, counts: &WordCounts) -> io::Result<()> {
        let mut w = BufWriter::new(File::create(self.path_for(index))?);
        write_table(&mut w, counts)?;
        w.flush()
    }
}
