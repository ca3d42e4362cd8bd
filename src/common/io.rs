use std::fs::{self, File};
use std::io;
use std::ops::Deref;
use std::path::Path;

#[cfg(target_os = "linux")]
use std::sync::atomic::{AtomicBool, Ordering};

use memmap2::{Mmap, MmapOptions};

/// Holds a window of file data — either zero-copy mmap or an owned Vec.
/// Dereferences to `&[u8]` for transparent use.
#[derive(Debug)]
pub enum FileData {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Deref for FileData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            FileData::Mmap(m) => m,
            FileData::Owned(v) => v,
        }
    }
}

/// Windows below this size are read with pread() instead of mmap.
/// mmap setup/teardown (page tables, TLB flush on munmap) costs more than
/// a copy for small windows.
pub const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Track whether O_NOATIME is supported to avoid repeated failed open() attempts.
/// After the first EPERM, we never try O_NOATIME again.
#[cfg(target_os = "linux")]
static NOATIME_SUPPORTED: AtomicBool = AtomicBool::new(true);

/// Open a file with O_NOATIME on Linux to avoid atime inode writes.
/// Every segment worker opens its own handle, so this runs once per segment.
#[cfg(target_os = "linux")]
pub fn open_noatime(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    if NOATIME_SUPPORTED.load(Ordering::Relaxed) {
        match fs::OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NOATIME)
            .open(path)
        {
            Ok(f) => return Ok(f),
            Err(ref e) if e.raw_os_error() == Some(libc::EPERM) => {
                // O_NOATIME requires file ownership or CAP_FOWNER — disable globally
                NOATIME_SUPPORTED.store(false, Ordering::Relaxed);
            }
            Err(e) => return Err(e),
        }
    }
    File::open(path)
}

#[cfg(not(target_os = "linux"))]
pub fn open_noatime(path: &Path) -> io::Result<File> {
    File::open(path)
}

/// Positioned read that never touches the handle's cursor.
/// Concurrent callers on disjoint windows share no file-position state.
#[cfg(unix)]
pub fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(windows)]
pub fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}

/// Fill `buf` from `offset`, retrying on partial reads.
/// Returns `UnexpectedEof` if the file ends before the buffer is full
/// (e.g. it was truncated after the segments were planned).
pub fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    let mut total = 0;
    while total < buf.len() {
        match read_at(file, &mut buf[total..], offset + total as u64) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "short read: expected {} bytes at offset {}, got {}",
                        buf.len(),
                        offset,
                        total
                    ),
                ));
            }
            Ok(n) => total += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Read the window `[offset, offset + len)` of an already-open file.
/// Large windows are mapped (memmap2 handles the page alignment of `offset`);
/// small ones are copied with pread into an exact-size buffer.
pub fn read_window(file: &File, offset: u64, len: u64) -> io::Result<FileData> {
    if len == 0 {
        return Ok(FileData::Owned(Vec::new()));
    }

    if len >= MMAP_THRESHOLD {
        let file_len = file.metadata()?.len();
        if offset + len <= file_len {
            // SAFETY: Read-only mapping of a range that exists in the file.
            // Mutation of the file by another process during the run is outside
            // our control, same as for any mmap-based reader.
            if let Ok(mmap) = unsafe {
                MmapOptions::new()
                    .offset(offset)
                    .len(len as usize)
                    .map(file)
            } {
                #[cfg(target_os = "linux")]
                {
                    if len >= 2 * 1024 * 1024 {
                        let _ = mmap.advise(memmap2::Advice::HugePage);
                    }
                    let _ = mmap.advise(memmap2::Advice::Sequential);
                    let _ = mmap.advise(memmap2::Advice::WillNeed);
                }
                return Ok(FileData::Mmap(mmap));
            }
            // mmap failed — fall back to pread
        }
    }

    let mut buf = vec![0u8; len as usize];
    read_exact_at(file, &mut buf, offset)?;
    Ok(FileData::Owned(buf))
}
