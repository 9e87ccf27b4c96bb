//! Aggregate statistics over the corpus
//!
//! Every Java member contributes one fixed-shape `Summary` and they are simply added up, so the
//! order files finish in doesn't matter and a run can stop at any point with a usable total.
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::panic;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use crate::archive::{JavaArchive, Outcome, SourceFile};
use crate::codec::{self, Codec, DEFAULT_CODECS};
use crate::errors::*;
use crate::lexer;
use crate::pool::{WorkerPool, DEFAULT_CHUNKSIZE};

/// Counters for one file, or for many added together
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub files: u64,
    pub tokens: u64,
    pub lines: u64,
    pub bad_syntax: u64,
    pub empty: u64,
    pub library_errors: u64,
}

impl Summary {
    /// A single file with nothing else counted yet
    pub fn file() -> Self {
        Summary { files: 1, ..Default::default() }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Add for Summary {
    type Output = Summary;

    fn add(mut self, other: Summary) -> Summary {
        self += other;
        self
    }
}

impl AddAssign for Summary {
    fn add_assign(&mut self, other: Summary) {
        self.files += other.files;
        self.tokens += other.tokens;
        self.lines += other.lines;
        self.bad_syntax += other.bad_syntax;
        self.empty += other.empty;
        self.library_errors += other.library_errors;
    }
}

impl Sum for Summary {
    fn sum<I: Iterator<Item = Summary>>(iter: I) -> Summary {
        iter.fold(Summary::default(), Add::add)
    }
}

/// Get the number of tokens and lines of one file, or why there aren't any
pub fn process_source(file: &SourceFile, codecs: &[Codec]) -> Summary {
    let code = match codec::decode(&file.name, &file.bytes, codecs) {
        Ok(code) => code,
        Err(err) => {
            debug!("{}", err);
            return Summary { library_errors: 1, ..Summary::file() };
        }
    };
    // Escapes are resolved first here, unlike the token cache which keeps them as written
    let lexed = panic::catch_unwind(|| {
        let code = lexer::translate_unicode_escapes(&code)?;
        let tokens = lexer::tokenize(&code)?;
        Ok::<_, lexer::LexError>((tokens.len(), tokens.last().map_or(0, |t| t.position.line)))
    });
    match lexed {
        Ok(Ok((0, _))) => Summary { empty: 1, ..Summary::file() },
        Ok(Ok((tokens, last_line))) => Summary {
            tokens: tokens as u64,
            lines: last_line as u64,
            ..Summary::file()
        },
        Ok(Err(err)) => {
            debug!("{}: {}", file.name, err);
            Summary { bad_syntax: 1, ..Summary::file() }
        }
        Err(_) => {
            warn!("The lexer panicked on {}", file.name);
            Summary { library_errors: 1, ..Summary::file() }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummaryOptions {
    /// Worker threads, one per core if None
    pub workers: Option<usize>,
    /// Files in each batch sent to a worker
    pub chunksize: usize,
    pub codecs: Vec<Codec>,
    /// Draw a spinner on stderr
    pub progress: bool,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        SummaryOptions {
            workers: None,
            chunksize: DEFAULT_CHUNKSIZE,
            codecs: DEFAULT_CODECS.to_vec(),
            progress: false,
        }
    }
}

/// Totals plus whether every file was seen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryRun {
    pub summary: Summary,
    pub complete: bool,
}

fn progress_bar(enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner} Processing files: {human_pos} files [{elapsed_precise}, {per_sec}]") {
        bar.set_style(style);
    }
    bar.enable_steady_tick(Duration::from_millis(200));
    bar
}

/// Process every .java file found in the archive and extract aggregated info
///
/// If `stop` gets set the run ends after the batch in flight and the partial totals are returned
/// with `complete == false`.
pub fn summarize<P: AsRef<Path>>(path: P, options: &SummaryOptions, stop: &AtomicBool)
    -> Result<SummaryRun>
{
    if options.chunksize == 0 {
        return Err(Error::InvalidArgument("chunksize must be positive".to_owned()));
    }
    let archive = JavaArchive::open(path)?;
    let pool = WorkerPool::new(options.workers)?;
    info!("Summarizing {} with {} workers, {} files per chunk",
        archive.path().display(), pool.workers(), options.chunksize);

    let bar = progress_bar(options.progress);
    let mut summary = Summary::default();
    let outcome = archive.for_each_batch(pool.workers() * options.chunksize, Some(stop), |batch| {
        let per_file = pool.map_chunked(&batch, options.chunksize,
            |file| process_source(file, &options.codecs))?;
        summary += per_file.into_iter().sum();
        bar.inc(batch.len() as u64);
        Ok(())
    })?;
    bar.finish();

    let complete = outcome == Outcome::Completed;
    if !complete {
        warn!("Stopped after {} files", summary.files);
    }
    Ok(SummaryRun { summary, complete })
}
