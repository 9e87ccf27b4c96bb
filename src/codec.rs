//! Turning archive bytes into source text
//!
//! Most of java-large is UTF-8 but a fair share is Latin-1, so decoding walks a fallback list.
use std::fmt;
use std::str::{self, FromStr};

use crate::errors::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Utf8,
    Latin1,
}

/// Tried in order; Latin-1 accepts any byte sequence so this list never fails
pub const DEFAULT_CODECS: [Codec; 2] = [Codec::Utf8, Codec::Latin1];

impl Codec {
    pub fn name(self) -> &'static str {
        match self {
            Codec::Utf8 => "utf-8",
            Codec::Latin1 => "iso-8859-1",
        }
    }

    /// Decode, or None if the bytes aren't valid in this encoding
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Codec::Utf8 => {
                let text = str::from_utf8(bytes).ok()?;
                Some(text.strip_prefix('\u{feff}').unwrap_or(text).to_owned())
            }
            // Latin-1 code points are exactly the byte values
            Codec::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Codec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Codec::Utf8),
            "iso-8859-1" | "latin-1" | "latin1" => Ok(Codec::Latin1),
            other => Err(Error::InvalidArgument(format!(
                "unknown codec {:?}, expected utf-8 or iso-8859-1", other))),
        }
    }
}

/// Parse a comma separated codec list like "utf-8,iso-8859-1"
pub fn parse_codecs(list: &str) -> Result<Vec<Codec>> {
    let codecs = list.split(',')
        .filter(|name| !name.trim().is_empty())
        .map(str::parse)
        .collect::<Result<Vec<Codec>>>()?;
    if codecs.is_empty() {
        return Err(Error::InvalidArgument("at least one codec is needed".to_owned()));
    }
    Ok(codecs)
}

/// Decode with the first codec that accepts the bytes
///
/// `name` is only used to say which member was the problem.
pub fn decode(name: &str, bytes: &[u8], codecs: &[Codec]) -> Result<String> {
    for codec in codecs {
        if let Some(text) = codec.decode(bytes) {
            return Ok(text);
        }
        debug!("{} is not valid {}, trying the next codec", name, codec);
    }
    Err(Error::Undecodable(name.to_owned()))
}
