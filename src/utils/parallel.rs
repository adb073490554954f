//! Index-range parallel map
//!
//! Every parallel phase of the pipeline has the same shape: for each column
//! index, read shared immutable inputs and produce the value for that index.
//! [`ParallelMap`] runs such a closure over `0..len` and collects the results
//! in index order, with an explicit degree of parallelism.
//!
//! # Example
//!
//! ```rust
//! use optout_proof::utils::ParallelMap;
//!
//! let map = ParallelMap::new(2)?;
//! let squares = map.map(5, |i| i * i);
//! assert_eq!(squares, vec![0, 1, 4, 9, 16]);
//! # Ok::<(), optout_proof::error::OptOutError>(())
//! ```

use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPool;

use crate::error::Result;

/// Parallel map over an index range
#[derive(Clone)]
pub struct ParallelMap {
    threads: usize,
    pool: Option<Arc<ThreadPool>>,
}

impl std::fmt::Debug for ParallelMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelMap")
            .field("threads", &self.threads)
            .finish()
    }
}

impl ParallelMap {
    /// Create a parallel map
    ///
    /// # Arguments
    /// * `threads` - 0 uses the global rayon pool, 1 runs sequentially on the
    ///   calling thread, n > 1 builds a dedicated pool of n threads
    pub fn new(threads: usize) -> Result<Self> {
        let pool = if threads > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|i| format!("optout-worker-{i}"))
                .build()?;
            Some(Arc::new(pool))
        } else {
            None
        };
        Ok(Self { threads, pool })
    }

    /// Sequential map on the calling thread
    pub fn sequential() -> Self {
        Self {
            threads: 1,
            pool: None,
        }
    }

    /// Effective number of worker threads
    pub fn threads(&self) -> usize {
        match self.threads {
            0 => rayon::current_num_threads(),
            n => n,
        }
    }

    /// Apply `f` to every index in `0..len`, results in index order
    pub fn map<T, F>(&self, len: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        match (&self.pool, self.threads) {
            (_, 1) => (0..len).map(f).collect(),
            (Some(pool), _) => pool.install(|| (0..len).into_par_iter().map(f).collect()),
            (None, _) => (0..len).into_par_iter().map(f).collect(),
        }
    }

    /// Fallible variant of [`ParallelMap::map`]
    ///
    /// Returns the first error encountered; which index wins when several
    /// fail concurrently is unspecified.
    pub fn try_map<T, F>(&self, len: usize, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize) -> Result<T> + Sync + Send,
    {
        match (&self.pool, self.threads) {
            (_, 1) => (0..len).map(f).collect(),
            (Some(pool), _) => pool.install(|| (0..len).into_par_iter().map(f).collect()),
            (None, _) => (0..len).into_par_iter().map(f).collect(),
        }
    }
}

impl Default for ParallelMap {
    fn default() -> Self {
        Self {
            threads: 0,
            pool: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OptOutError;

    #[test]
    fn test_map_preserves_order() {
        for threads in [0, 1, 3] {
            let map = ParallelMap::new(threads).unwrap();
            let out = map.map(100, |i| i as u64 * 3);
            assert_eq!(out, (0..100).map(|i| i as u64 * 3).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_try_map_propagates_error() {
        let map = ParallelMap::new(4).unwrap();
        let result = map.try_map(10, |i| {
            if i == 7 {
                Err(OptOutError::RowOutOfRange { index: i, n_rows: 7 })
            } else {
                Ok(i)
            }
        });
        assert!(matches!(result, Err(OptOutError::RowOutOfRange { index: 7, .. })));
    }

    #[test]
    fn test_empty_range() {
        let map = ParallelMap::default();
        assert!(map.map(0, |i| i).is_empty());
        assert!(map.try_map(0, Ok).unwrap().is_empty());
    }

    #[test]
    fn test_threads() {
        assert_eq!(ParallelMap::sequential().threads(), 1);
        assert_eq!(ParallelMap::new(3).unwrap().threads(), 3);
        assert!(ParallelMap::new(0).unwrap().threads() >= 1);
    }
}
