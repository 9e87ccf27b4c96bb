//! Stream `.java` members out of the corpus tarball
//!
//! The archive is read front to back exactly once per pass. Members are handed out in batches so
//! the caller can farm each batch out to workers; reading resumes once the caller returns.
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tar::{Archive, EntryType};

use crate::errors::*;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Largest member buffer reserved from the tar header alone
const MAX_RESERVE: u64 = 16 << 20;

/// One archive member, still undecoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// How a pass over the archive ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Interrupted,
}

/// Only regular files named *.java are sources
pub fn is_java_file(name: &str, entry_type: EntryType) -> bool {
    name.ends_with(".java") && entry_type.is_file()
}

/// A tar (optionally gzipped) full of Java sources
#[derive(Debug, Clone)]
pub struct JavaArchive {
    path: PathBuf,
}

impl JavaArchive {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        File::open(path).map_err(|err| Error::MissingFile("java-large archive", Some(err)))?;
        Ok(JavaArchive { path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sniff the gzip magic rather than trusting the extension
    fn reader(&self) -> Result<Box<dyn Read>> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        let gzipped = reader.fill_buf()?.starts_with(&GZIP_MAGIC);
        if gzipped {
            Ok(Box::new(GzDecoder::new(reader)))
        } else {
            Ok(Box::new(reader))
        }
    }

    /// Read every Java member in archive order, calling `f` with batches of up to `batch_len`.
    ///
    /// The stop flag is polled before each member. Once it is set the pending batch is dropped
    /// and the pass ends as `Interrupted`.
    pub fn for_each_batch<F>(&self, batch_len: usize, stop: Option<&AtomicBool>, mut f: F)
        -> Result<Outcome>
        where F: FnMut(Vec<SourceFile>) -> Result<()>
    {
        let batch_len = batch_len.max(1);
        let mut archive = Archive::new(self.reader()?);
        let mut batch = Vec::with_capacity(batch_len);
        for entry in archive.entries()? {
            if stop.map_or(false, |flag| flag.load(Ordering::SeqCst)) {
                return Ok(Outcome::Interrupted);
            }
            let mut entry = entry?;
            let name = entry.path()?.to_string_lossy().into_owned();
            if !is_java_file(&name, entry.header().entry_type()) {
                continue;
            }
            let mut bytes = Vec::with_capacity(entry.size().min(MAX_RESERVE) as usize);
            entry.read_to_end(&mut bytes)?;
            batch.push(SourceFile { name, bytes });
            if batch.len() == batch_len {
                f(mem::replace(&mut batch, Vec::with_capacity(batch_len)))?;
            }
        }
        if !batch.is_empty() {
            f(batch)?;
        }
        Ok(Outcome::Completed)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::fs::File;
    use std::io::{self, Write};
    use std::path::Path;
    use tar::{Builder, EntryType, Header};

    fn fill<W: Write>(builder: &mut Builder<W>, files: &[(&str, &[u8])]) {
        let mut dir = Header::new_gnu();
        dir.set_entry_type(EntryType::Directory);
        dir.set_size(0);
        dir.set_mode(0o755);
        builder.append_data(&mut dir, "project/", io::empty()).unwrap();
        for &(name, body) in files {
            let mut header = Header::new_gnu();
            header.set_entry_type(EntryType::Regular);
            header.set_size(body.len() as u64);
            header.set_mode(0o644);
            builder.append_data(&mut header, name, body).unwrap();
        }
    }

    /// Write a small corpus archive for tests
    pub fn write_archive(path: &Path, files: &[(&str, &[u8])], gzip: bool) {
        let file = File::create(path).unwrap();
        if gzip {
            let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));
            fill(&mut builder, files);
            builder.into_inner().unwrap().finish().unwrap();
        } else {
            let mut builder = Builder::new(file);
            fill(&mut builder, files);
            builder.into_inner().unwrap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::write_archive;
    use super::*;
    use tempfile::tempdir;

    fn names(archive: &JavaArchive, batch_len: usize) -> (Vec<Vec<String>>, Outcome) {
        let mut batches = vec![];
        let outcome = archive.for_each_batch(batch_len, None, |batch| {
            batches.push(batch.into_iter().map(|f| f.name).collect());
            Ok(())
        }).unwrap();
        (batches, outcome)
    }

    #[test]
    fn java_files_only() {
        assert!(is_java_file("a/B.java", EntryType::Regular));
        assert!(!is_java_file("a/B.java", EntryType::Directory));
        assert!(!is_java_file("a/B.java", EntryType::Symlink));
        assert!(!is_java_file("a/B.class", EntryType::Regular));
        assert!(!is_java_file("a/B.java.orig", EntryType::Regular));
    }

    #[test]
    fn batches_in_archive_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("java-large.tar.gz");
        write_archive(&path, &[
            ("project/A.java", b"class A {}"),
            ("project/README.md", b"# readme"),
            ("project/B.java", b"class B {}"),
            ("project/C.java", b"class C {}"),
        ], true);
        let archive = JavaArchive::open(&path).unwrap();
        let (batches, outcome) = names(&archive, 2);
        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(batches, vec![
            vec!["project/A.java".to_owned(), "project/B.java".to_owned()],
            vec!["project/C.java".to_owned()],
        ]);
    }

    #[test]
    fn plain_tar_works_too() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corpus.tar");
        write_archive(&path, &[("X.java", b"class X {}")], false);
        let archive = JavaArchive::open(&path).unwrap();
        let mut files = vec![];
        archive.for_each_batch(10, None, |batch| { files.extend(batch); Ok(()) }).unwrap();
        assert_eq!(files, vec![SourceFile { name: "X.java".into(), bytes: b"class X {}".to_vec() }]);
    }

    #[test]
    fn stop_flag_interrupts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("java-large.tar.gz");
        write_archive(&path, &[("A.java", b"class A {}")], true);
        let stop = AtomicBool::new(true);
        let archive = JavaArchive::open(&path).unwrap();
        let mut calls = 0;
        let outcome = archive.for_each_batch(1, Some(&stop), |_| { calls += 1; Ok(()) }).unwrap();
        assert_eq!(outcome, Outcome::Interrupted);
        assert_eq!(calls, 0);
    }

    #[test]
    fn truncated_member_with_a_huge_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("java-large.tar");
        let mut header = tar::Header::new_gnu();
        header.set_path("x/Huge.java").unwrap();
        header.set_entry_type(EntryType::Regular);
        header.set_size(1 << 36);
        header.set_mode(0o644);
        header.set_cksum();
        let mut raw = header.as_bytes().to_vec();
        raw.extend_from_slice(b"class Huge {}");
        std::fs::write(&path, raw).unwrap();

        let archive = JavaArchive::open(&path).unwrap();
        assert!(archive.for_each_batch(4, None, |_| Ok(())).is_err());
    }

    #[test]
    fn missing_archive() {
        let dir = tempdir().unwrap();
        match JavaArchive::open(dir.path().join("nope.tar.gz")) {
            Err(Error::MissingFile(what, Some(_))) => assert_eq!(what, "java-large archive"),
            other => panic!("expected MissingFile, got {:?}", other),
        }
    }
}
