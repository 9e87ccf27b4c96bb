//! Flat text cache of tokenized files
//!
//! One line per source file, tokens separated by single spaces. The cache is written under a
//! temporary name and renamed into place on commit, so a half-written cache is never mistaken
//! for a finished one.
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::errors::*;

const BUFFER_CAPACITY: usize = 1 << 20;

pub struct CacheWriter {
    path: PathBuf,
    partial: PathBuf,
    writer: BufWriter<File>,
    lines: usize,
}

impl CacheWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut partial = path.clone().into_os_string();
        partial.push(".partial");
        let partial = PathBuf::from(partial);
        let writer = BufWriter::with_capacity(BUFFER_CAPACITY, File::create(&partial)?);
        Ok(CacheWriter { path, partial, writer, lines: 0 })
    }

    /// Write one file's tokens as a line.
    ///
    /// Tokens are split at inner whitespace (string literals, text blocks) so the line structure
    /// survives; readers split on whitespace anyway.
    pub fn write_sentence<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<()> {
        let mut first = true;
        for piece in tokens.iter().flat_map(|t| t.as_ref().split_whitespace()) {
            if !first {
                self.writer.write_all(b" ")?;
            }
            self.writer.write_all(piece.as_bytes())?;
            first = false;
        }
        self.writer.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Flush and move the cache into its final place
    pub fn commit(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        fs::rename(&self.partial, &self.path)?;
        Ok(self.path.clone())
    }
}

impl Drop for CacheWriter {
    fn drop(&mut self) {
        // Already renamed if committed; otherwise don't leave the partial cache lying around
        let _ = fs::remove_file(&self.partial);
    }
}

/// Stream the cached sentences back
pub fn read_cache<P: AsRef<Path>>(path: P) -> Result<impl Iterator<Item = Result<Vec<String>>>> {
    let reader = BufReader::with_capacity(BUFFER_CAPACITY, File::open(path)?);
    Ok(reader.lines().map(|line| -> Result<Vec<String>> {
        Ok(line?.split_whitespace().map(str::to_owned).collect())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn nothing_visible_until_commit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.txt");
        let mut writer = CacheWriter::create(&path).unwrap();
        writer.write_sentence(&["class", "A", "{", "}"]).unwrap();
        assert!(!path.exists());
        assert_eq!(writer.lines(), 1);
        assert_eq!(writer.commit().unwrap(), path);
        assert_eq!(fs::read_to_string(&path).unwrap(), "class A { }\n");
        assert!(!dir.path().join("cache.txt.partial").exists());
    }

    #[test]
    fn abandoned_writer_cleans_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.txt");
        {
            let mut writer = CacheWriter::create(&path).unwrap();
            writer.write_sentence(&["int"]).unwrap();
        }
        assert!(!path.exists());
        assert!(!dir.path().join("cache.txt.partial").exists());
    }

    #[test]
    fn whitespace_inside_tokens_stays_on_the_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.txt");
        let mut writer = CacheWriter::create(&path).unwrap();
        writer.write_sentence(&["s", "=", "\"a b\"", "\"\"\"\n  x\n\"\"\""]).unwrap();
        writer.write_sentence(&["int"]).unwrap();
        writer.commit().unwrap();
        let lines: Vec<Vec<String>> = read_cache(&path).unwrap().map(|l| l.unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], vec!["s", "=", "\"a", "b\"", "\"\"\"", "x", "\"\"\""]);
        assert_eq!(lines[1], vec!["int"]);
    }
}
