//
// Errors
//
use std::error;
use std::fmt;
use std::io;
use std::num;
use std::result;


/// Type alias for javavec errors
pub type Result<X> = result::Result<X, Error>;

/// Wrapper for many kinds of errors occuring while reading the corpus or training
#[derive(Debug)]
pub enum Error {
    IOError(io::Error),
    JsonError(serde_json::Error),
    ThreadPoolError(rayon::ThreadPoolBuildError),
    ParseIntError(num::ParseIntError),
    ParseFloatError(num::ParseFloatError),
    MissingFile(&'static str, Option<io::Error>),
    Undecodable(String),
    InvalidArgument(String),
    ArgumentError(clap::Error),
    EmptyVocabulary,
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::IOError(ref err) => write!(f, "IO error: {}", err),
            Error::JsonError(ref err) => write!(f, "JSON error: {}", err),
            Error::ThreadPoolError(ref err) => write!(f, "Could not start worker pool: {}", err),
            Error::ParseIntError(ref err) => write!(f, "Error parsing integer: {}", err),
            Error::ParseFloatError(ref err) => write!(f, "Error parsing float: {}", err),
            Error::MissingFile(ref info, ref opt_err) => {
                write!(f,
                    "The {} must already exist at this point but there was a problem opening it. \
                    Wrong directory? Maybe missed a step? The OS error was: ",
                    info)?;
                if let Some(ref err) = *opt_err { write!(f, "{}", err) }
                else { write!(f, "Unknown") }
            },
            Error::Undecodable(ref name) => {
                write!(f, "Cannot decode file {} with any of the configured codecs", name)
            }
            Error::InvalidArgument(ref info) => write!(f, "Invalid argument: {}", info),
            Error::ArgumentError(ref err) => write!(f, "{}", err),
            Error::EmptyVocabulary => {
                write!(f, "The vocabulary is empty. Build it from a non-empty corpus \
                    (or lower min_count) before training.")
            }
            Error::Other(ref info) => write!(f, "{}", info),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::IOError(ref err) => Some(err),
            Error::JsonError(ref err) => Some(err),
            Error::ThreadPoolError(ref err) => Some(err),
            Error::ParseIntError(ref err) => Some(err),
            Error::ParseFloatError(ref err) => Some(err),
            Error::MissingFile(_, Some(ref err)) => Some(err),
            Error::MissingFile(_, None) => None,
            Error::Undecodable(_) => None,
            Error::InvalidArgument(_) => None,
            Error::ArgumentError(ref err) => Some(err),
            Error::EmptyVocabulary => None,
            Error::Other(_) => None,
        }
    }
}
//
// Convert everything else into Error
//
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::IOError(err)
    }
}
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::JsonError(err)
    }
}
impl From<rayon::ThreadPoolBuildError> for Error {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Error::ThreadPoolError(err)
    }
}
impl From<num::ParseIntError> for Error {
    fn from(err: num::ParseIntError) -> Self {
        Error::ParseIntError(err)
    }
}
impl From<num::ParseFloatError> for Error {
    fn from(err: num::ParseFloatError) -> Self {
        Error::ParseFloatError(err)
    }
}
impl From<clap::Error> for Error {
    fn from(err: clap::Error) -> Self {
        Error::ArgumentError(err)
    }
}

//
// Convert Error into a general io Error
//
impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::IOError(err) => err,
            other => io::Error::new(io::ErrorKind::Other, other),
        }
    }
}
