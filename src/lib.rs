//! Java token embeddings from the java-large corpus
//!
//! The pipeline is linear: stream `.java` members out of the archive, decode them, lex them into
//! tokens, cache one line of tokens per file, and train word2vec over the cached sentences. The
//! same archive walk also feeds the corpus statistics in `summary`.
//!
//! The binaries in `src/bin` are thin wrappers around these modules.

#[macro_use] extern crate log;

pub mod errors;
pub mod farm;
pub mod logging;
pub mod lexer;
pub mod codec;
pub mod archive;
pub mod cache;
pub mod pool;
pub mod corpus;
pub mod summary;
pub mod vectors;
pub mod word2vec;
