//! Train word2vec embeddings for Java tokens
//!
//! The first run tokenizes `<DATADIR>/java-large.tar.gz` into
//! `<DATADIR>/java-large-preprocessed.txt`, one file per line. Later runs reuse that cache. The
//! trained vectors are written to `<DATADIR>/model.vec` in word2vec format.
//!

// argument parsing
#[macro_use] extern crate clap;
// logging
#[macro_use] extern crate log;

use std::path::Path;
use std::time::Instant;

use javavec::codec::parse_codecs;
use javavec::corpus::JavaCorpus;
use javavec::errors::*;
use javavec::logging;
use javavec::pool::DEFAULT_CHUNKSIZE;
use javavec::word2vec::{Architecture, Word2Vec, Word2VecConfig};

pub fn main() {
    // Main can't return a Result, and the ? operator needs the enclosing function to return Result
    inner_main().expect("Could not recover. Exiting.");
}
pub fn inner_main() -> Result<()> {
    logging::init();
    let args = app_from_crate!()
        .arg_from_usage("<DATADIR> 'directory holding java-large.tar.gz; the cache and model go here too'")
        .arg_from_usage("--max-sentences [N] 'train on at most this many files'")
        .arg_from_usage("--workers [N] 'worker threads, one per core by default'")
        .arg_from_usage("--chunksize [N] 'files handed to a worker at a time while preprocessing (default 100)'")
        .arg_from_usage("--codecs [LIST] 'comma separated encodings to try in order (default utf-8,iso-8859-1)'")
        .arg_from_usage("--size [N] 'dimensions of each vector (default 100)'")
        .arg_from_usage("--window [N] 'maximum distance to a context token (default 5)'")
        .arg_from_usage("--min-count [N] 'ignore tokens seen fewer times than this (default 5)'")
        .arg_from_usage("--negative [N] 'noise tokens drawn per positive example (default 5)'")
        .arg_from_usage("--epochs [N] 'passes over the corpus (default 5)'")
        .arg_from_usage("--sg 'use skip-gram instead of CBOW'")
        .arg_from_usage("--seed [N] 'random seed (default 1)'")
        .arg_from_usage("--binary 'write the binary word2vec format instead of text'")
        .get_matches();

    // Only override the defaults for flags that were given
    let optional = |name: &str| -> Result<Option<usize>> {
        if args.is_present(name) {
            Ok(Some(value_t!(args, name, usize)?))
        } else {
            Ok(None)
        }
    };

    let data_dir = Path::new(args.value_of("DATADIR").unwrap_or_default());
    let workers = optional("workers")?;
    let mut corpus = JavaCorpus::new(data_dir)
        .max_sentences(optional("max-sentences")?)
        .workers(workers)
        .chunksize(optional("chunksize")?.unwrap_or(DEFAULT_CHUNKSIZE));
    if let Some(list) = args.value_of("codecs") {
        corpus = corpus.codecs(parse_codecs(list)?);
    }

    let mut config = Word2VecConfig { workers, ..Default::default() };
    if let Some(size) = optional("size")? { config.vector_size = size; }
    if let Some(window) = optional("window")? { config.window = window; }
    if let Some(min_count) = optional("min-count")? { config.min_count = min_count as u64; }
    if let Some(negative) = optional("negative")? { config.negative = negative; }
    if let Some(epochs) = optional("epochs")? { config.epochs = epochs; }
    if args.is_present("seed") {
        config.seed = value_t!(args, "seed", u64)?;
    }
    if args.is_present("sg") {
        config.architecture = Architecture::SkipGram;
    }

    let started = Instant::now();
    let mut model = Word2Vec::new(config)?;
    model.build_vocab(&corpus)?;
    let report = model.train(&corpus)?;
    info!("Trained {} epochs over {} tokens in {:.1}s",
        report.epochs, report.raw_words, started.elapsed().as_secs_f64());

    let output = data_dir.join("model.vec");
    model.vectors()?.save_word2vec_format(&output, args.is_present("binary"))?;
    println!("{}", output.display());
    Ok(())
}
