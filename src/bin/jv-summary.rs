//! Corpus statistics for java-large
//!
//! Walks every `.java` file in the archive, lexes it, and prints a JSON object counting files,
//! tokens, lines, files that failed to lex, empty files, and files the decoders or lexer choked
//! on. Ctrl-C stops early and still prints what was counted so far.
//!

// argument parsing
#[macro_use] extern crate clap;
// logging
#[macro_use] extern crate log;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use clap::Arg;

use javavec::codec::{parse_codecs, DEFAULT_CODECS};
use javavec::errors::*;
use javavec::logging;
use javavec::summary::{summarize, SummaryOptions};

pub fn main() {
    // Main can't return a Result, and the ? operator needs the enclosing function to return Result
    inner_main().expect("Could not recover. Exiting.");
}
pub fn inner_main() -> Result<()> {
    logging::init();
    let args = app_from_crate!()
        .arg_from_usage("<file> 'the java-large tar.gz archive'")
        .arg_from_usage("--num-workers [N] 'worker threads, one per core by default'")
        .arg(Arg::from_usage("--chunksize [N] 'files handed to a worker at a time'")
            .default_value("100"))
        .arg_from_usage("--codecs [LIST] 'comma separated encodings to try in order (default utf-8,iso-8859-1)'")
        .arg_from_usage("--no-progress 'do not draw a progress spinner'")
        .get_matches();

    let options = SummaryOptions {
        workers: if args.is_present("num-workers") {
            Some(value_t!(args, "num-workers", usize)?)
        } else {
            None
        },
        chunksize: value_t!(args, "chunksize", usize).unwrap_or_else(|e| e.exit()),
        codecs: match args.value_of("codecs") {
            Some(list) => parse_codecs(list)?,
            None => DEFAULT_CODECS.to_vec(),
        },
        progress: !args.is_present("no-progress"),
    };

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || handler_stop.store(true, Ordering::SeqCst))
        .map_err(|err| Error::Other(format!("Could not install the Ctrl-C handler: {}", err)))?;

    let path = args.value_of("file").unwrap_or_default();
    let run = summarize(path, &options, &stop)?;
    if !run.complete {
        eprintln!("Stopping early, summary might be incomplete");
    }
    debug!("{:?}", run.summary);
    println!("{}", run.summary.to_json()?);
    Ok(())
}
