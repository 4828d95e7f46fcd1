// src/infrastructure/worker_pool.rs
//
// One-shot bulk loader.
//
// Items are dealt round-robin into one chunk per worker; each worker builds
// its chunk independently and the call returns only after every worker is
// done. Callers never observe partial results.

use rayon::prelude::*;

use crate::error::AppResult;

/// Host parallelism, falling back to a single worker.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Deal `items` into `workers` chunks: chunk `i` holds items `i, i + workers, ...`
pub fn round_robin<T>(items: Vec<T>, workers: usize) -> Vec<Vec<T>> {
    let workers = workers.max(1);
    let mut chunks: Vec<Vec<T>> = (0..workers).map(|_| Vec::new()).collect();
    for (idx, item) in items.into_iter().enumerate() {
        chunks[idx % workers].push(item);
    }
    chunks
}

/// Build every item on a fixed pool of `workers` threads.
///
/// The first error from any worker fails the whole load.
pub fn build_all<T, R, F>(items: Vec<T>, workers: usize, build: F) -> AppResult<Vec<R>>
where
    T: Send,
    R: Send,
    F: Fn(T) -> AppResult<R> + Sync,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let workers = workers.clamp(1, items.len());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|idx| format!("mapvault-loader-{}", idx))
        .build()?;

    let chunks = round_robin(items, workers);
    let built: Vec<Vec<R>> = pool.install(|| {
        chunks
            .into_par_iter()
            .map(|chunk| chunk.into_iter().map(&build).collect::<AppResult<Vec<R>>>())
            .collect::<AppResult<Vec<Vec<R>>>>()
    })?;

    Ok(built.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[test]
    fn test_round_robin_deals_evenly() {
        let chunks = round_robin((0..7).collect(), 3);
        assert_eq!(chunks, vec![vec![0, 3, 6], vec![1, 4], vec![2, 5]]);
    }

    #[test]
    fn test_round_robin_zero_workers_means_one() {
        let chunks = round_robin(vec![1, 2], 0);
        assert_eq!(chunks, vec![vec![1, 2]]);
    }

    #[test]
    fn test_build_all_collects_every_item() {
        let threads = Mutex::new(HashSet::new());
        let out = build_all((0..64).collect(), 4, |n: u32| {
            threads
                .lock()
                .unwrap()
                .insert(std::thread::current().name().map(str::to_string));
            Ok(n * 2)
        })
        .unwrap();

        let mut sorted = out.clone();
        sorted.sort();
        assert_eq!(sorted, (0..64).map(|n| n * 2).collect::<Vec<_>>());
        assert!(threads.lock().unwrap().len() <= 4);
    }

    #[test]
    fn test_build_all_fails_on_any_error() {
        let result = build_all((0..10).collect(), 3, |n: u32| {
            if n == 7 {
                Err(AppError::Other("broken".to_string()))
            } else {
                Ok(n)
            }
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_build_all_empty() {
        let out: Vec<u32> = build_all(Vec::<u32>::new(), 8, Ok).unwrap();
        assert!(out.is_empty());
    }
}
