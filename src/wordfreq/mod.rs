mod aggregate;
mod classify;
mod core;
mod count;
mod error;
mod exec;
mod plan;
mod report;
mod source;


pub use self::aggregate::merge;
pub use self::classify::is_word_byte;
pub use self::core::{RunReport, WordFreqConfig, count_bytes, count_file};
pub use self::count::{TextEncoding, WordCounts, count_words, tokenize};
pub use self::error::{Result, WordFreqError};
pub use self::exec::{NoSink, Parallelism, SegmentSink, execute};
pub use self::plan::{ByteRange, SegmentPlan, plan_segments};
pub use self::report::{IntermediateDir, write_plan, write_table};
pub use self::source::{ByteSource, FileProbe, FileSource, RangeReader};
