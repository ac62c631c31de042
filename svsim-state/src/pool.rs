//! Worker pools keyed by thread count
//!
//! Every parallel kernel call names an exact worker count. Pools are built on
//! first use and shared for the rest of the process.

use crate::error::{Result, StateError};
use ahash::AHashMap;
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::{Arc, LazyLock};

static POOLS: LazyLock<Mutex<AHashMap<usize, Arc<ThreadPool>>>> =
    LazyLock::new(|| Mutex::new(AHashMap::new()));

/// Shared pool with exactly `threads` workers
pub fn pool(threads: usize) -> Result<Arc<ThreadPool>> {
    let mut pools = POOLS.lock();
    if let Some(existing) = pools.get(&threads) {
        return Ok(Arc::clone(existing));
    }
    let built = ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(move |i| format!("svsim-{}-{}", threads, i))
        .build()
        .map_err(|e| StateError::ThreadPool(e.to_string()))?;
    log::debug!("created worker pool with {} threads", threads);
    let built = Arc::new(built);
    pools.insert(threads, Arc::clone(&built));
    Ok(built)
}

/// Number of hardware threads, at least 1
pub fn available_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_is_cached() {
        let a = pool(2).unwrap();
        let b = pool(2).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.current_num_threads(), 2);
    }

    #[test]
    fn test_available_threads_positive() {
        assert!(available_threads() >= 1);
    }
}
