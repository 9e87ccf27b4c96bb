//! Word2vec over token sentences
//!
//! CBOW or skip-gram, both trained with negative sampling. The defaults follow the usual
//! word2vec/gensim settings. Workers share the weight matrices without locks (Hogwild): updates
//! go through relaxed atomics, so racing writes can be lost but never torn, and SGD doesn't mind.
use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::{SmallRng, StdRng};
use rand::{Rng, SeedableRng};
use std::mem;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

use crate::corpus::Sentences;
use crate::errors::*;
use crate::farm::{new_farm, FarmMap};
use crate::pool::WorkerPool;
use crate::vectors::KeyedVectors;

/// Beyond this the sigmoid is taken to be exactly 0 or 1
const MAX_EXP: f32 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    /// Predict the center token from the mean of its context
    Cbow,
    /// Predict the center token from each context token
    SkipGram,
}

#[derive(Debug, Clone)]
pub struct Word2VecConfig {
    pub vector_size: usize,
    /// Maximum distance between the center and a context token
    pub window: usize,
    /// Tokens seen fewer times are dropped from the vocabulary
    pub min_count: u64,
    /// Noise tokens drawn per positive example
    pub negative: usize,
    /// Downsampling threshold for frequent tokens, 0 to disable
    pub sample: f64,
    pub alpha: f32,
    pub min_alpha: f32,
    pub epochs: usize,
    pub architecture: Architecture,
    /// Average (rather than sum) the context vectors in CBOW
    pub cbow_mean: bool,
    /// One per core if None
    pub workers: Option<usize>,
    pub seed: u64,
    /// Raw tokens per job handed to a worker
    pub batch_words: usize,
}

impl Default for Word2VecConfig {
    fn default() -> Self {
        Word2VecConfig {
            vector_size: 100,
            window: 5,
            min_count: 5,
            negative: 5,
            sample: 1e-3,
            alpha: 0.025,
            min_alpha: 0.0001,
            epochs: 5,
            architecture: Architecture::Cbow,
            cbow_mean: true,
            workers: None,
            seed: 1,
            batch_words: 10_000,
        }
    }
}

impl Word2VecConfig {
    pub fn validate(&self) -> Result<()> {
        let complaint = if self.vector_size == 0 {
            "vector_size must be positive"
        } else if self.window == 0 {
            "window must be positive"
        } else if self.negative == 0 {
            "negative must be positive, hierarchical softmax is not supported"
        } else if self.epochs == 0 {
            "epochs must be positive"
        } else if self.batch_words == 0 {
            "batch_words must be positive"
        } else if !(self.alpha > 0.0) || !(self.min_alpha > 0.0) || self.min_alpha > self.alpha {
            "learning rates must satisfy 0 < min_alpha <= alpha"
        } else if !(self.sample >= 0.0) {
            "sample must not be negative"
        } else if self.workers == Some(0) {
            "need at least one worker"
        } else {
            return Ok(());
        };
        Err(Error::InvalidArgument(complaint.to_owned()))
    }
}

/// Tokens kept for training, most frequent first
#[derive(Debug, Clone)]
pub struct Vocab {
    words: Vec<String>,
    counts: Vec<u64>,
    index: FarmMap<String, u32>,
    /// Probability of keeping each occurrence when downsampling
    keep_probs: Vec<f32>,
    /// Unigram^0.75 distribution for drawing noise tokens
    negatives: WeightedIndex<f64>,
    /// Raw tokens in the corpus, including those under min_count
    corpus_words: u64,
    sentences: u64,
}

impl Vocab {
    pub fn build<S: Sentences + ?Sized>(source: &S, min_count: u64, sample: f64) -> Result<Self> {
        let mut raw: FarmMap<String, u64> = new_farm();
        let mut corpus_words = 0u64;
        let mut sentences = 0u64;
        for sentence in source.sentences()? {
            let sentence = sentence?;
            sentences += 1;
            corpus_words += sentence.len() as u64;
            for token in sentence {
                *raw.entry(token).or_insert(0) += 1;
            }
        }
        info!("Collected {} token types from a corpus of {} raw tokens and {} sentences",
            raw.len(), corpus_words, sentences);

        let mut kept: Vec<(String, u64)> = raw.into_iter()
            .filter(|&(_, count)| count >= min_count)
            .collect();
        if kept.is_empty() {
            return Err(Error::EmptyVocabulary);
        }
        kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let retained: u64 = kept.iter().map(|&(_, count)| count).sum();
        info!("min_count={} retains {} unique tokens ({} of the raw tokens)",
            min_count, kept.len(), retained);

        let threshold = if sample <= 0.0 {
            retained as f64
        } else if sample < 1.0 {
            sample * retained as f64
        } else {
            sample * (3.0 + 5f64.sqrt()) / 2.0
        };
        let keep_probs = kept.iter()
            .map(|&(_, count)| {
                let count = count as f64;
                (((count / threshold).sqrt() + 1.0) * threshold / count).min(1.0) as f32
            })
            .collect();
        let negatives = WeightedIndex::new(kept.iter().map(|&(_, count)| (count as f64).powf(0.75)))
            .map_err(|err| Error::Other(format!("Cannot build the noise distribution: {}", err)))?;

        let mut index = new_farm();
        let mut words = Vec::with_capacity(kept.len());
        let mut counts = Vec::with_capacity(kept.len());
        for (id, (word, count)) in kept.into_iter().enumerate() {
            index.insert(word.clone(), id as u32);
            words.push(word);
            counts.push(count);
        }
        Ok(Vocab { words, counts, index, keep_probs, negatives, corpus_words, sentences })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn id(&self, word: &str) -> Option<u32> {
        self.index.get(word).cloned()
    }

    pub fn word(&self, id: u32) -> &str {
        &self.words[id as usize]
    }

    pub fn count(&self, id: u32) -> u64 {
        self.counts[id as usize]
    }

    pub fn corpus_words(&self) -> u64 {
        self.corpus_words
    }

    pub fn sentences(&self) -> u64 {
        self.sentences
    }
}

fn load(cell: &AtomicU32) -> f32 {
    f32::from_bits(cell.load(Ordering::Relaxed))
}

fn add(cell: &AtomicU32, delta: f32) {
    cell.store((load(cell) + delta).to_bits(), Ordering::Relaxed);
}

/// Row-major matrix that workers read and update concurrently
struct SharedMatrix {
    rows: usize,
    cols: usize,
    data: Vec<AtomicU32>,
}

impl SharedMatrix {
    fn from_array(array: &Array2<f32>) -> Self {
        SharedMatrix {
            rows: array.nrows(),
            cols: array.ncols(),
            data: array.iter().map(|x| AtomicU32::new(x.to_bits())).collect(),
        }
    }

    fn zeros(rows: usize, cols: usize) -> Self {
        SharedMatrix { rows, cols, data: (0..rows * cols).map(|_| AtomicU32::new(0)).collect() }
    }

    fn row(&self, row: u32) -> &[AtomicU32] {
        let start = row as usize * self.cols;
        &self.data[start..start + self.cols]
    }

    fn to_array(&self) -> Result<Array2<f32>> {
        let values = self.data.iter().map(load).collect();
        Array2::from_shape_vec((self.rows, self.cols), values)
            .map_err(|err| Error::Other(format!("Embedding has the wrong shape: {}", err)))
    }
}

fn dot(row: &[AtomicU32], v: &[f32]) -> f32 {
    row.iter().zip(v).map(|(a, b)| load(a) * b).sum()
}

/// row += g * v
fn axpy(row: &[AtomicU32], g: f32, v: &[f32]) {
    for (a, b) in row.iter().zip(v) {
        add(a, g * b);
    }
}

/// out += g * row
fn accumulate(out: &mut [f32], g: f32, row: &[AtomicU32]) {
    for (o, a) in out.iter_mut().zip(row) {
        *o += g * load(a);
    }
}

fn sigmoid(f: f32) -> f32 {
    if f <= -MAX_EXP {
        0.0
    } else if f >= MAX_EXP {
        1.0
    } else {
        1.0 / (1.0 + (-f).exp())
    }
}

/// Linear decay from alpha to min_alpha over the whole run
fn learning_rate(alpha: f32, min_alpha: f32, done: u64, total: u64) -> f32 {
    let progress = if total == 0 { 0.0 } else { (done as f64 / total as f64).min(1.0) };
    (alpha - (alpha - min_alpha) * progress as f32).max(min_alpha)
}

/// A slice of the corpus trained by one worker in one go
#[derive(Default)]
struct Job {
    serial: u64,
    sentences: Vec<Vec<u32>>,
    raw_words: u64,
}

struct Model {
    vocab: Vocab,
    syn0: SharedMatrix,
    syn1neg: SharedMatrix,
}

/// Per-job scratch space
struct Scratch {
    rng: SmallRng,
    neu1: Vec<f32>,
    work: Vec<f32>,
    kept: Vec<u32>,
}

/// Totals over all epochs of a `train` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrainReport {
    pub epochs: usize,
    pub raw_words: u64,
    pub effective_words: u64,
}

pub struct Word2Vec {
    config: Word2VecConfig,
    model: Option<Model>,
}

impl Word2Vec {
    pub fn new(config: Word2VecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Word2Vec { config, model: None })
    }

    pub fn config(&self) -> &Word2VecConfig {
        &self.config
    }

    pub fn vocab(&self) -> Option<&Vocab> {
        self.model.as_ref().map(|m| &m.vocab)
    }

    /// Scan the corpus once to collect the vocabulary and reset the weights
    pub fn build_vocab<S: Sentences + ?Sized>(&mut self, source: &S) -> Result<()> {
        let vocab = Vocab::build(source, self.config.min_count, self.config.sample)?;
        let dim = self.config.vector_size;
        let bound = 0.5 / dim as f32;
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let syn0 = Array2::random_using((vocab.len(), dim), Uniform::new(-bound, bound), &mut rng);
        self.model = Some(Model {
            syn0: SharedMatrix::from_array(&syn0),
            syn1neg: SharedMatrix::zeros(vocab.len(), dim),
            vocab,
        });
        Ok(())
    }

    /// Run every epoch over the corpus; `build_vocab` must come first
    pub fn train<S: Sentences + ?Sized>(&mut self, source: &S) -> Result<TrainReport> {
        let model = self.model.as_ref().ok_or(Error::EmptyVocabulary)?;
        let config = &self.config;
        let pool = WorkerPool::new(config.workers)?;
        let queue_len = pool.workers() * 2;
        let total_words = model.vocab.corpus_words * config.epochs as u64;
        let words_done = AtomicU64::new(0);
        let mut serial = 0u64;
        let mut report = TrainReport { epochs: config.epochs, ..Default::default() };
        info!("Training {:?} with {} workers on {} tokens, {} dimensions, window {}, {} negatives",
            config.architecture, pool.workers(), model.vocab.len(), config.vector_size,
            config.window, config.negative);

        for epoch in 0..config.epochs {
            let started = Instant::now();
            let mut raw_words = 0u64;
            let mut effective_words = 0u64;
            let mut jobs: Vec<Job> = Vec::with_capacity(queue_len);
            let mut current = Job { serial, ..Default::default() };

            let mut run = |jobs: &mut Vec<Job>| -> Result<()> {
                let done = pool.map_chunked(jobs.as_slice(), 1,
                    |job| train_job(config, model, job, &words_done, total_words))?;
                effective_words += done.iter().sum::<u64>();
                raw_words += jobs.iter().map(|job| job.raw_words).sum::<u64>();
                jobs.clear();
                Ok(())
            };

            for sentence in source.sentences()? {
                let sentence = sentence?;
                for piece in sentence.chunks(config.batch_words) {
                    if current.raw_words + piece.len() as u64 > config.batch_words as u64 {
                        serial += 1;
                        let next = Job { serial, ..Default::default() };
                        jobs.push(mem::replace(&mut current, next));
                        if jobs.len() >= queue_len {
                            run(&mut jobs)?;
                        }
                    }
                    current.sentences.push(piece.iter().filter_map(|t| model.vocab.id(t)).collect());
                    current.raw_words += piece.len() as u64;
                }
            }
            if current.raw_words > 0 {
                jobs.push(current);
            }
            run(&mut jobs)?;
            serial += 1;

            info!("EPOCH {} - trained on {} raw tokens ({} effective) in {:.1}s, alpha now {:.5}",
                epoch + 1, raw_words, effective_words, started.elapsed().as_secs_f64(),
                learning_rate(config.alpha, config.min_alpha,
                    words_done.load(Ordering::Relaxed), total_words));
            report.raw_words += raw_words;
            report.effective_words += effective_words;
        }
        Ok(report)
    }

    /// Snapshot of the input vectors
    pub fn vectors(&self) -> Result<KeyedVectors> {
        let model = self.model.as_ref().ok_or(Error::EmptyVocabulary)?;
        KeyedVectors::new(model.vocab.words.clone(), model.vocab.counts.clone(),
            model.syn0.to_array()?)
    }
}

/// Train one job; returns how many tokens survived downsampling
fn train_job(config: &Word2VecConfig, model: &Model, job: &Job, words_done: &AtomicU64,
    total_words: u64) -> u64
{
    let alpha = learning_rate(config.alpha, config.min_alpha,
        words_done.load(Ordering::Relaxed), total_words);
    let mut scratch = Scratch {
        rng: SmallRng::seed_from_u64(config.seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ job.serial),
        neu1: vec![0.0; config.vector_size],
        work: vec![0.0; config.vector_size],
        kept: vec![],
    };
    let mut effective = 0u64;
    for sentence in &job.sentences {
        let Scratch { ref mut rng, ref mut kept, .. } = scratch;
        kept.clear();
        for &id in sentence {
            let keep = model.vocab.keep_probs[id as usize];
            if keep >= 1.0 || rng.gen::<f32>() < keep {
                kept.push(id);
            }
        }
        effective += kept.len() as u64;
        match config.architecture {
            Architecture::Cbow => cbow_sentence(config, model, &mut scratch, alpha),
            Architecture::SkipGram => skipgram_sentence(config, model, &mut scratch, alpha),
        }
    }
    words_done.fetch_add(job.raw_words, Ordering::Relaxed);
    effective
}

/// Context span around `pos` with a randomly shrunk window
fn context(config: &Word2VecConfig, rng: &mut SmallRng, pos: usize, len: usize) -> (usize, usize) {
    let span = config.window - rng.gen_range(0..config.window);
    (pos.saturating_sub(span), (pos + span + 1).min(len))
}

/// One positive and `negative` noise updates of the output layer for hidden vector `l1`.
/// The gradient for `l1` is accumulated into `work`.
fn negative_sampling(config: &Word2VecConfig, model: &Model, target: u32, l1: &[f32],
    work: &mut [f32], alpha: f32, rng: &mut SmallRng)
{
    for d in 0..=config.negative {
        let (word, label) = if d == 0 {
            (target, 1.0)
        } else {
            let noise = model.vocab.negatives.sample(rng) as u32;
            if noise == target {
                continue;
            }
            (noise, 0.0)
        };
        let row = model.syn1neg.row(word);
        let g = (label - sigmoid(dot(row, l1))) * alpha;
        accumulate(work, g, row);
        axpy(row, g, l1);
    }
}

fn cbow_sentence(config: &Word2VecConfig, model: &Model, scratch: &mut Scratch, alpha: f32) {
    let Scratch { ref mut rng, ref mut neu1, ref mut work, ref kept } = *scratch;
    for pos in 0..kept.len() {
        let (start, end) = context(config, rng, pos, kept.len());
        neu1.iter_mut().for_each(|x| *x = 0.0);
        let mut count = 0usize;
        for c in (start..end).filter(|&c| c != pos) {
            accumulate(neu1, 1.0, model.syn0.row(kept[c]));
            count += 1;
        }
        if count == 0 {
            continue;
        }
        let inv_count = 1.0 / count as f32;
        if config.cbow_mean {
            neu1.iter_mut().for_each(|x| *x *= inv_count);
        }
        work.iter_mut().for_each(|x| *x = 0.0);
        negative_sampling(config, model, kept[pos], neu1, work, alpha, rng);
        if !config.cbow_mean {
            work.iter_mut().for_each(|x| *x *= inv_count);
        }
        for c in (start..end).filter(|&c| c != pos) {
            axpy(model.syn0.row(kept[c]), 1.0, work);
        }
    }
}

fn skipgram_sentence(config: &Word2VecConfig, model: &Model, scratch: &mut Scratch, alpha: f32) {
    let Scratch { ref mut rng, ref mut neu1, ref mut work, ref kept } = *scratch;
    for pos in 0..kept.len() {
        let (start, end) = context(config, rng, pos, kept.len());
        for c in (start..end).filter(|&c| c != pos) {
            let l1 = model.syn0.row(kept[c]);
            for (n, a) in neu1.iter_mut().zip(l1) {
                *n = load(a);
            }
            work.iter_mut().for_each(|x| *x = 0.0);
            negative_sampling(config, model, kept[pos], neu1, work, alpha, rng);
            axpy(l1, 1.0, work);
        }
    }
}
