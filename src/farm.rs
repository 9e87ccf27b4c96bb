//! Faster (but not DoS-resistant) hashmap for token tables
use std::collections::HashMap;
use std::hash::{BuildHasherDefault, Hash, Hasher};

/// Farmhash as a streaming Hasher
///
/// Farmhash isn't streaming, so each write is hashed with the state so far as the seed. `str`
/// keys do two writes (the bytes, then a 0xff terminator) and both end up in the result.
#[derive(Default)]
pub struct FarmHasher(u64);

impl Hasher for FarmHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        self.0 = farmhash::hash64_with_seed(bytes, self.0);
    }
}

pub type Farm = BuildHasherDefault<FarmHasher>;
pub type FarmMap<X, Y> = HashMap<X, Y, Farm>;

pub fn new_farm<X: Hash + Eq, Y>() -> FarmMap<X, Y> {
    Default::default()
}
