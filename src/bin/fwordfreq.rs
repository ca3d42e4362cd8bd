use std::io::{self, BufWriter, Write};
#[cfg(unix)]
use std::mem::ManuallyDrop;
use std::num::NonZeroUsize;
#[cfg(unix)]
use std::os::unix::io::FromRawFd;
use std::path::PathBuf;
use std::process;

use anyhow::anyhow;
use clap::{ArgAction, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use wordfreq_rs::common::io_error_msg;
use wordfreq_rs::wordfreq::{
    self, Parallelism, RunReport, TextEncoding, WordFreqConfig, WordFreqError,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Encoding {
    Utf8,
    Latin1,
}

impl From<Encoding> for TextEncoding {
    fn from(e: Encoding) -> Self {
        match e {
            Encoding::Utf8 => TextEncoding::Utf8,
            Encoding::Latin1 => TextEncoding::Latin1,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "wordfreq",
    about = "Count word frequencies in FILE by splitting it into word-aligned segments counted in parallel"
)]
struct Cli {
    /// Path to the input text file
    #[arg(long = "file", value_name = "PATH")]
    file: PathBuf,

    /// Number of segments (one worker each)
    #[arg(long = "segments", value_name = "N", allow_negative_numbers = true)]
    segments: i64,

    /// Directory for per-segment outputs
    #[arg(
        long = "intermediate-dir",
        alias = "intermediate_dir",
        value_name = "DIR",
        default_value = "intermediate"
    )]
    intermediate_dir: PathBuf,

    /// Do not write per-segment outputs
    #[arg(long = "no-intermediate")]
    no_intermediate: bool,

    /// Run segments on a pool of at most N threads instead of one thread each
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    jobs: Option<NonZeroUsize>,

    /// How segment bytes are decoded before counting
    #[arg(long = "encoding", value_enum, default_value = "utf8")]
    encoding: Encoding,

    /// Print only the final word/count table
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Log more to stderr (repeat for more detail)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

/// Install the stderr log subscriber. RUST_LOG overrides `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(verbose >= 2)
        .with_thread_names(verbose >= 2)
        .init();
}

fn config_from(cli: &Cli) -> Result<WordFreqConfig, WordFreqError> {
    let segments = usize::try_from(cli.segments)
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| {
            WordFreqError::InvalidArgument(format!(
                "number of segments must be > 0, got {}",
                cli.segments
            ))
        })?;

    Ok(WordFreqConfig {
        segments,
        parallelism: cli.jobs.map_or(Parallelism::PerSegment, Parallelism::Pool),
        encoding: cli.encoding.into(),
        intermediate_dir: (!cli.no_intermediate).then(|| cli.intermediate_dir.clone()),
    })
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = config_from(cli)?;
    let report = wordfreq::count_file(&cli.file, &config)?;

    // Raw fd stdout; the table can be large
    #[cfg(unix)]
    let mut raw = unsafe { ManuallyDrop::new(std::fs::File::from_raw_fd(1)) };
    #[cfg(unix)]
    let mut out = BufWriter::with_capacity(64 * 1024, &mut *raw);
    #[cfg(not(unix))]
    let mut out = BufWriter::with_capacity(64 * 1024, io::stdout().lock());

    write_report(&mut out, &report, cli.quiet)
        .map_err(|e| anyhow!("write error: {}", io_error_msg(&e)))
}

/// Plan listing, intermediate paths, then the final table.
/// `quiet` keeps only the table.
fn write_report(out: &mut impl Write, report: &RunReport, quiet: bool) -> io::Result<()> {
    if !quiet {
        wordfreq::write_plan(out, &report.plan)?;
        if let Some(inter) = &report.intermediate {
            writeln!(out, "\n[INFO] Intermediate per-thread outputs written to:")?;
            for i in 0..report.plan.len() {
                writeln!(out, "  {}", inter.path_for(i).display())?;
            }
        }
        writeln!(out, "\n[FINAL CONSOLIDATED WORD FREQUENCY]")?;
    }
    wordfreq::write_table(out, &report.total)?;
    out.flush()
}

fn main() {
    wordfreq_rs::common::reset_sigpipe();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("wordfreq: {}", e);
        process::exit(1);
    }
}
