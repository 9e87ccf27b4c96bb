//! Bounded worker pool for the per-file work
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::errors::*;

/// Files handed to a worker at a time
pub const DEFAULT_CHUNKSIZE: usize = 100;

pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    /// `None` means one worker per core
    pub fn new(workers: Option<usize>) -> Result<Self> {
        if workers == Some(0) {
            return Err(Error::InvalidArgument("need at least one worker".to_owned()));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.unwrap_or(0))
            .thread_name(|i| format!("jv-worker-{}", i))
            .build()?;
        Ok(WorkerPool { pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Map `f` over `items` in chunks of `chunksize`, keeping input order
    pub fn map_chunked<T, R, F>(&self, items: &[T], chunksize: usize, f: F) -> Result<Vec<R>>
        where T: Sync, R: Send, F: Fn(&T) -> R + Sync
    {
        if chunksize == 0 {
            return Err(Error::InvalidArgument("chunksize must be positive".to_owned()));
        }
        let chunks: Vec<Vec<R>> = self.pool.install(|| {
            items.par_chunks(chunksize)
                .map(|chunk| chunk.iter().map(&f).collect())
                .collect()
        });
        Ok(chunks.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_order() {
        let pool = WorkerPool::new(Some(3)).unwrap();
        assert_eq!(pool.workers(), 3);
        let items: Vec<usize> = (0..1000).collect();
        let doubled = pool.map_chunked(&items, 7, |x| x * 2).unwrap();
        assert_eq!(doubled, items.iter().map(|x| x * 2).collect::<Vec<_>>());
    }

    #[test]
    fn rejects_degenerate_sizes() {
        assert!(WorkerPool::new(Some(0)).is_err());
        let pool = WorkerPool::new(Some(1)).unwrap();
        assert!(pool.map_chunked(&[1, 2, 3], 0, |x| *x).is_err());
        assert!(pool.map_chunked(&[] as &[u8], 5, |x| *x).unwrap().is_empty());
    }
}
