//! The java-large corpus as a stream of token sentences
//!
//! The first pass tokenizes every Java file in the archive and stores the result in a flat cache
//! next to it. Later passes (and later runs) read the cache instead, which is much faster than
//! decompressing and lexing a few million files again.
use std::path::{Path, PathBuf};

use crate::archive::{JavaArchive, SourceFile};
use crate::cache::{self, CacheWriter};
use crate::codec::{self, Codec, DEFAULT_CODECS};
use crate::errors::*;
use crate::lexer;
use crate::pool::{WorkerPool, DEFAULT_CHUNKSIZE};

pub const ARCHIVE_NAME: &str = "java-large.tar.gz";
pub const CACHE_NAME: &str = "java-large-preprocessed.txt";

/// Anything that can be iterated as sentences, once per call
pub trait Sentences {
    fn sentences(&self) -> Result<Box<dyn Iterator<Item = Result<Vec<String>>> + '_>>;
}

impl Sentences for Vec<Vec<String>> {
    fn sentences(&self) -> Result<Box<dyn Iterator<Item = Result<Vec<String>>> + '_>> {
        Ok(Box::new(self.iter().cloned().map(Ok::<Vec<String>, Error>)))
    }
}

/// What preprocessing did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreprocessReport {
    /// Java members seen
    pub files: usize,
    /// Lines written to the cache
    pub written: usize,
    /// Empty or unlexable files
    pub skipped: usize,
}

/// Expects the data directory to contain the java-large tarball
#[derive(Debug, Clone)]
pub struct JavaCorpus {
    archive_path: PathBuf,
    cache_path: PathBuf,
    max_sentences: Option<usize>,
    workers: Option<usize>,
    chunksize: usize,
    codecs: Vec<Codec>,
}

impl JavaCorpus {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        let data_dir = data_dir.as_ref();
        JavaCorpus {
            archive_path: data_dir.join(ARCHIVE_NAME),
            cache_path: data_dir.join(CACHE_NAME),
            max_sentences: None,
            workers: None,
            chunksize: DEFAULT_CHUNKSIZE,
            codecs: DEFAULT_CODECS.to_vec(),
        }
    }

    /// Yield at most this many sentences per pass (None for all)
    pub fn max_sentences(mut self, max_sentences: Option<usize>) -> Self {
        self.max_sentences = max_sentences;
        self
    }

    pub fn workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    pub fn chunksize(mut self, chunksize: usize) -> Self {
        self.chunksize = chunksize;
        self
    }

    pub fn codecs(mut self, codecs: Vec<Codec>) -> Self {
        self.codecs = codecs;
        self
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Token values of one file, or nothing if it doesn't lex
    pub fn process_code(code: &str) -> Vec<String> {
        match lexer::tokenize(code) {
            Ok(tokens) => tokens.into_iter().map(|t| t.value.to_owned()).collect(),
            Err(_) => vec![],
        }
    }

    fn check_chunksize(&self) -> Result<()> {
        if self.chunksize == 0 {
            return Err(Error::InvalidArgument("chunksize must be positive".to_owned()));
        }
        Ok(())
    }

    fn process_file(file: &SourceFile, codecs: &[Codec]) -> Result<Vec<String>> {
        let code = codec::decode(&file.name, &file.bytes, codecs)?;
        Ok(Self::process_code(&code))
    }

    /// Tokenize the whole archive into the cache, replacing any existing one
    pub fn preprocess(&self) -> Result<PreprocessReport> {
        self.check_chunksize()?;
        let archive = JavaArchive::open(&self.archive_path)?;
        let pool = WorkerPool::new(self.workers)?;
        let chunksize = self.chunksize;
        let batch_len = pool.workers() * chunksize;
        let codecs = &self.codecs;
        let mut writer = CacheWriter::create(&self.cache_path)?;
        let mut report = PreprocessReport::default();

        archive.for_each_batch(batch_len, None, |batch| {
            let results = pool.map_chunked(&batch, chunksize, |file| Self::process_file(file, codecs))?;
            for tokens in results {
                let tokens = tokens?;
                report.files += 1;
                // The file might be empty or have bad syntax, in which case there are no tokens
                if tokens.is_empty() {
                    report.skipped += 1;
                } else {
                    writer.write_sentence(&tokens)?;
                    report.written += 1;
                }
            }
            if report.files % 100_000 < batch.len() {
                info!("Preprocessed {} files, {} kept", report.files, report.written);
            }
            Ok(())
        })?;
        writer.commit()?;
        info!("Preprocessing done: {} files, {} written, {} skipped",
            report.files, report.written, report.skipped);
        Ok(report)
    }
}

impl Sentences for JavaCorpus {
    fn sentences(&self) -> Result<Box<dyn Iterator<Item = Result<Vec<String>>> + '_>> {
        self.check_chunksize()?;
        if self.cache_path.exists() {
            info!("Found preprocessed file {}, skipping preprocessing of java-large",
                self.cache_path.display());
        } else {
            info!("Preprocessing corpus, this pass might take longer");
            info!("Storing preprocessed files to {}", self.cache_path.display());
            self.preprocess()?;
        }
        let lines = cache::read_cache(&self.cache_path)?;
        Ok(Box::new(lines.take(self.max_sentences.unwrap_or(usize::MAX))))
    }
}
