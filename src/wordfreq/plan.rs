use std::fmt;
use std::ops::Deref;

use tracing::debug;

use super::classify::is_word_byte;
use super::error::{Result, WordFreqError};
use super::source::ByteSource;

/// Half-open byte interval `[start, end)` over the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    #[inline]
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end);
        ByteRange { start, end }
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Ordered, word-aligned ranges covering `[0, file_size)`.
/// The position of a range is the identity of the worker that counts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentPlan {
    file_size: u64,
    requested: usize,
    ranges: Vec<ByteRange>,
}

impl SegmentPlan {
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Segment count the caller asked for. `len()` may be smaller.
    pub fn requested(&self) -> usize {
        self.requested
    }

    pub fn ranges(&self) -> &[ByteRange] {
        &self.ranges
    }
}

impl Deref for SegmentPlan {
    type Target = [ByteRange];

    fn deref(&self) -> &[ByteRange] {
        &self.ranges
    }
}

impl<'a> IntoIterator for &'a SegmentPlan {
    type Item = &'a ByteRange;
    type IntoIter = std::slice::Iter<'a, ByteRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

/// Move `pos` forward until the byte before it is not a word byte.
/// Offsets 0 and `size` are always boundaries.
fn advance_past_word<S: ByteSource + ?Sized>(source: &S, mut pos: u64, size: u64) -> Result<u64> {
    if pos == 0 {
        return Ok(0);
    }
    while pos < size && is_word_byte(source.byte_at(pos - 1)?) {
        pos += 1;
    }
    Ok(pos.min(size))
}

/// Split `source` into at most `segment_count` word-aligned byte ranges.
///
/// Each naive boundary `i * (size / segment_count)` is pushed forward past
/// any word it lands in, so the word belongs wholly to the earlier segment.
/// Ranges that collapse to zero length are folded into their predecessor;
/// an empty input yields the single range `[0, 0)`.
pub fn plan_segments<S: ByteSource + ?Sized>(
    source: &S,
    segment_count: usize,
) -> Result<SegmentPlan> {
    if segment_count == 0 {
        return Err(WordFreqError::InvalidArgument(
            "number of segments must be > 0".to_string(),
        ));
    }

    let size = source.size();
    if size == 0 {
        return Ok(SegmentPlan {
            file_size: 0,
            requested: segment_count,
            ranges: vec![ByteRange::new(0, 0)],
        });
    }

    let n = segment_count as u64;
    let approx = size / n;

    // More segments than bytes: every naive bound but the last is 0
    let ranges = if approx == 0 {
        vec![ByteRange::new(0, size)]
    } else {
        aligned_ranges(source, n, approx, size)?
    };

    debug!(
        file_size = size,
        requested = segment_count,
        planned = ranges.len(),
        "segment plan computed"
    );

    Ok(SegmentPlan {
        file_size: size,
        requested: segment_count,
        ranges,
    })
}

/// Naive bounds, start/end adjustment, then a left-to-right merge that
/// drops empty ranges and clamps each start to the previous end.
/// `approx` must be > 0, so `n <= size`.
fn aligned_ranges<S: ByteSource + ?Sized>(
    source: &S,
    n: u64,
    approx: u64,
    size: u64,
) -> Result<Vec<ByteRange>> {
    let mut adjusted = Vec::with_capacity(n as usize);
    for i in 0..n {
        let mut start = i * approx;
        let mut end = if i == n - 1 { size } else { (i + 1) * approx };

        if start > 0 {
            start = advance_past_word(source, start, size)?;
        }
        if end < size {
            end = advance_past_word(source, end, size)?;
        }
        adjusted.push((start, end));
    }

    let mut ranges: Vec<ByteRange> = Vec::with_capacity(adjusted.len());
    for (start, end) in adjusted {
        let floor = ranges.last().map_or(0, |r| r.end);
        let start = start.max(floor).min(end.max(floor));
        let end = end.max(start);
        if start == end {
            if let Some(prev) = ranges.last_mut() {
                prev.end = prev.end.max(end);
            }
            continue;
        }
        ranges.push(ByteRange::new(start, end));
    }
    Ok(ranges)
}
