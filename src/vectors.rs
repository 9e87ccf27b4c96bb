//! Trained token vectors, and reading/writing them in word2vec format
//!
//! The text format is a `<count> <dimensions>` header followed by one `token v1 v2 ...` line per
//! token. The binary format has the same header, then each token, a space, `dimensions`
//! little-endian f32s and a newline.
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use ndarray::prelude::*;
use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::errors::*;
use crate::farm::{new_farm, FarmMap};

/// Most elements reserved up front when loading
const MAX_RESERVE: usize = 1 << 20;

#[derive(Debug, Clone)]
pub struct KeyedVectors {
    words: Vec<String>,
    counts: Vec<u64>,
    index: FarmMap<String, usize>,
    vectors: Array2<f32>,
}

fn norm(v: ArrayView1<f32>) -> f32 {
    v.dot(&v).sqrt()
}

impl KeyedVectors {
    /// Row i of `vectors` belongs to `words[i]`, which was seen `counts[i]` times
    pub fn new(words: Vec<String>, counts: Vec<u64>, vectors: Array2<f32>) -> Result<Self> {
        if words.len() != vectors.nrows() || counts.len() != words.len() {
            return Err(Error::InvalidArgument(format!(
                "{} tokens and {} counts for {} vectors",
                words.len(), counts.len(), vectors.nrows())));
        }
        let mut index = new_farm();
        for (i, word) in words.iter().enumerate() {
            index.insert(word.clone(), i);
        }
        Ok(KeyedVectors { words, counts, index, vectors })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.vectors.ncols()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn matrix(&self) -> &Array2<f32> {
        &self.vectors
    }

    pub fn get(&self, word: &str) -> Option<ArrayView1<f32>> {
        self.index.get(word).map(|&i| self.vectors.row(i))
    }

    /// Cosine similarity, 0 if either vector is all zeros
    pub fn similarity(&self, a: &str, b: &str) -> Option<f32> {
        let (a, b) = (self.get(a)?, self.get(b)?);
        let denominator = norm(a) * norm(b);
        if denominator == 0.0 {
            Some(0.0)
        } else {
            Some(a.dot(&b) / denominator)
        }
    }

    /// The `topn` tokens closest to `word` by cosine similarity, best first.
    ///
    /// None if the token is unknown. Equal scores go to the more frequent token.
    pub fn most_similar(&self, word: &str, topn: usize) -> Option<Vec<(String, f32)>> {
        let &query_idx = self.index.get(word)?;
        // Cosine similarity is just a dot product once the magnitudes are all one.
        // Zero vectors can't be normalized; they stay 0 and so do their similarities.
        let mut unit = self.vectors.clone();
        for mut row in unit.outer_iter_mut() {
            let n = norm(row.view());
            if n != 0.0 {
                row.mapv_inplace(|x| x / n);
            }
        }
        let scores = unit.dot(&unit.row(query_idx));
        let mut ranked: Vec<(usize, f32)> = scores.iter()
            .cloned()
            .enumerate()
            .filter(|&(i, _)| i != query_idx)
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
        Some(ranked.into_iter()
            .take(topn)
            .map(|(i, score)| (self.words[i].clone(), score))
            .collect())
    }

    pub fn save_word2vec_format<P: AsRef<Path>>(&self, path: P, binary: bool) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        writeln!(writer, "{} {}", self.len(), self.dim())?;
        for (word, row) in self.words.iter().zip(self.vectors.outer_iter()) {
            writer.write_all(word.as_bytes())?;
            if binary {
                writer.write_all(b" ")?;
                for &x in row.iter() {
                    writer.write_f32::<LittleEndian>(x)?;
                }
            } else {
                for x in row.iter() {
                    write!(writer, " {}", x)?;
                }
            }
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        info!("Saved {} vectors of {} dimensions to {}", self.len(), self.dim(),
            path.as_ref().display());
        Ok(())
    }

    /// Counts aren't stored in the file, so tokens get descending placeholder counts by rank
    pub fn load_word2vec_format<P: AsRef<Path>>(path: P, binary: bool) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path.as_ref())
            .map_err(|err| Error::MissingFile("word2vec model", Some(err)))?);
        let mut header = String::new();
        reader.read_line(&mut header)?;
        let mut fields = header.split_whitespace();
        let (count, dim): (usize, usize) = match (fields.next(), fields.next()) {
            (Some(count), Some(dim)) => (count.parse()?, dim.parse()?),
            _ => return Err(Error::Other(format!(
                "{} does not start with a '<count> <dimensions>' header", path.as_ref().display()))),
        };

        let total = count.checked_mul(dim).ok_or_else(|| Error::Other(format!(
            "A {} by {} embedding is too large", count, dim)))?;
        // The header is only trusted so far; anything beyond this grows as vectors arrive
        let mut words = Vec::with_capacity(count.min(MAX_RESERVE));
        let mut values = Vec::with_capacity(total.min(MAX_RESERVE));
        if binary {
            for _ in 0..count {
                let mut word = vec![];
                reader.read_until(b' ', &mut word)?;
                if word.pop() != Some(b' ') {
                    return Err(Error::Other("Binary vector file ended in the middle of a token".into()));
                }
                // The newline closing the previous vector
                let start = word.iter().position(|&b| b != b'\n').unwrap_or(word.len());
                words.push(String::from_utf8_lossy(&word[start..]).into_owned());
                for _ in 0..dim {
                    values.push(reader.read_f32::<LittleEndian>()?);
                }
            }
        } else {
            for line in reader.lines().take(count) {
                let line = line?;
                let mut fields = line.split_whitespace();
                let word = fields.next().unwrap_or_default().to_owned();
                let before = values.len();
                for field in fields {
                    values.push(field.parse::<f32>()?);
                }
                if values.len() - before != dim {
                    return Err(Error::Other(format!(
                        "Token {:?} has {} values, expected {}", word, values.len() - before, dim)));
                }
                words.push(word);
            }
        }
        if words.len() != count {
            return Err(Error::Other(format!("Expected {} vectors but found {}", count, words.len())));
        }
        let vectors = Array2::from_shape_vec((count, dim), values)
            .map_err(|err| Error::Other(format!("Embedding has the wrong shape: {}", err)))?;
        let counts = (0..count as u64).rev().map(|c| c + 1).collect();
        KeyedVectors::new(words, counts, vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::tempdir;

    fn sample() -> KeyedVectors {
        KeyedVectors::new(
            vec!["int".into(), "long".into(), "class".into(), "zero".into()],
            vec![40, 30, 20, 10],
            array![[1.0, 0.0], [0.9, 0.1], [0.0, 1.0], [0.0, 0.0]],
        ).unwrap()
    }

    #[test]
    fn lookups() {
        let kv = sample();
        assert_eq!(kv.len(), 4);
        assert_eq!(kv.dim(), 2);
        assert_eq!(kv.get("class").unwrap().to_vec(), vec![0.0, 1.0]);
        assert!(kv.get("void").is_none());
        assert_eq!(kv.similarity("int", "class"), Some(0.0));
        assert_eq!(kv.similarity("int", "zero"), Some(0.0));
        assert!((kv.similarity("int", "int").unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn most_similar_excludes_the_query() {
        let kv = sample();
        let near = kv.most_similar("int", 2).unwrap();
        assert_eq!(near[0].0, "long");
        // class and zero both score 0, the more frequent one wins
        assert_eq!(near[1].0, "class");
        assert_eq!(near.len(), 2);
        assert!(kv.most_similar("void", 3).is_none());
    }

    #[test]
    fn mismatched_lengths() {
        assert!(KeyedVectors::new(vec!["a".into()], vec![1], Array2::zeros((2, 3))).is_err());
    }

    #[test]
    fn text_and_binary_files() {
        let dir = tempdir().unwrap();
        let kv = sample();
        for &binary in [false, true].iter() {
            let path = dir.path().join(if binary { "model.bin" } else { "model.vec" });
            kv.save_word2vec_format(&path, binary).unwrap();
            let back = KeyedVectors::load_word2vec_format(&path, binary).unwrap();
            assert_eq!(back.words(), kv.words());
            assert_eq!(back.matrix(), kv.matrix());
            assert_eq!(back.counts(), &[4, 3, 2, 1]);
        }
        let text = std::fs::read_to_string(dir.path().join("model.vec")).unwrap();
        assert!(text.starts_with("4 2\nint 1 0\nlong 0.9 0.1\n"));
    }

    #[test]
    fn bad_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.vec");
        std::fs::write(&path, "2 3\nint 1 2 3\nlong 1 2\n").unwrap();
        assert!(KeyedVectors::load_word2vec_format(&path, false).is_err());
        std::fs::write(&path, "18446744073709551615 2\na 1 2\n").unwrap();
        assert!(KeyedVectors::load_word2vec_format(&path, false).is_err());
        assert!(KeyedVectors::load_word2vec_format(&path, true).is_err());
        std::fs::write(&path, "3000000 4\na 1 2 3 4\n").unwrap();
        assert!(KeyedVectors::load_word2vec_format(&path, false).is_err());
        std::fs::write(&path, "garbage\n").unwrap();
        assert!(KeyedVectors::load_word2vec_format(&path, false).is_err());
        assert!(KeyedVectors::load_word2vec_format(dir.path().join("nope.vec"), false).is_err());
    }
}
