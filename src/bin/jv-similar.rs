//! Print the nearest tokens in a trained embedding
//!

// argument parsing
#[macro_use] extern crate clap;

use clap::Arg;

use javavec::errors::*;
use javavec::logging;
use javavec::vectors::KeyedVectors;

pub fn main() {
    // Main can't return a Result, and the ? operator needs the enclosing function to return Result
    inner_main().expect("Could not recover. Exiting.");
}
pub fn inner_main() -> Result<()> {
    logging::init();
    let args = app_from_crate!()
        .arg_from_usage("<model> 'vectors in word2vec format, as written by jv-train'")
        .arg_from_usage("<token>... 'tokens to look up'")
        .arg(Arg::from_usage("--topn [N] 'how many neighbors to show'").default_value("10"))
        .arg_from_usage("--binary 'the model is in the binary word2vec format'")
        .get_matches();

    let topn = value_t!(args, "topn", usize).unwrap_or_else(|e| e.exit());
    let vectors = KeyedVectors::load_word2vec_format(
        args.value_of("model").unwrap_or_default(), args.is_present("binary"))?;

    for token in args.values_of("token").into_iter().flatten() {
        match vectors.most_similar(token, topn) {
            Some(neighbors) => {
                println!("{}", token);
                for (neighbor, score) in neighbors {
                    println!("\t{:.4}\t{}", score, neighbor);
                }
            }
            None => println!("{}\t(not in vocabulary)", token),
        }
    }
    Ok(())
}
