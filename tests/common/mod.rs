use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::path::Path;
use tar::{Builder, EntryType, Header};

/// A tiny java-large lookalike: `<dir>/java-large.tar.gz` holding `files`
pub fn write_corpus(dir: &Path, files: &[(&str, &[u8])]) {
    let file = File::create(dir.join("java-large.tar.gz")).unwrap();
    let mut builder = Builder::new(GzEncoder::new(file, Compression::fast()));
    for &(name, body) in files {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        builder.append_data(&mut header, name, body).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

/// Many copies of a few small classes, enough for every token to clear min_count
pub fn repetitive_corpus(copies: usize) -> Vec<(String, Vec<u8>)> {
    let bodies: [&[u8]; 3] = [
        b"public class Point { private int x; private int y; }",
        b"public class Name { private String first; private String last; }",
        b"class Loop { void run() { for (int i = 0; i < 10; i++) { tick(i); } } }",
    ];
    (0..copies)
        .flat_map(|i| bodies.iter().enumerate()
            .map(move |(j, body)| (format!("repo{}/src/File{}.java", i, j), body.to_vec())))
        .collect()
}
