// src/services/search/searcher.rs
//
// Memoizing search front.
//
// CRITICAL RULES:
// - Results are memoized per (query, limit) in a bounded LRU cache
// - The cache is dropped whenever the corpus generation moves, so a
//   mutation is never answered from a stale ranking

use std::sync::Arc;

use parking_lot::Mutex;

use super::strategies::{SearchCorpus, SearchStrategy};
use crate::infrastructure::LruCache;

/// Anything a searcher can rank over.
pub trait CorpusSource: Send + Sync {
    /// Bumped on every change to the corpus
    fn generation(&self) -> u64;

    /// Current read-only snapshot
    fn corpus(&self) -> Arc<SearchCorpus>;
}

type SearchKey = (String, Option<usize>);

struct SearchMemo {
    generation: u64,
    results: LruCache<SearchKey, Vec<String>>,
}

pub struct Searcher {
    strategy: Box<dyn SearchStrategy>,
    source: Arc<dyn CorpusSource>,
    memo: Mutex<SearchMemo>,
}

impl Searcher {
    pub fn new(
        strategy: Box<dyn SearchStrategy>,
        source: Arc<dyn CorpusSource>,
        cache_capacity: usize,
    ) -> Self {
        let generation = source.generation();
        Self {
            strategy,
            source,
            memo: Mutex::new(SearchMemo {
                generation,
                results: LruCache::new(cache_capacity),
            }),
        }
    }

    /// Ranked names for `query`; `None` returns every match.
    pub fn search(&self, query: &str, limit: Option<usize>) -> Vec<String> {
        let key = (query.to_string(), limit);
        let generation = self.source.generation();

        {
            let mut memo = self.memo.lock();
            if memo.generation != generation {
                log::debug!(
                    "Corpus moved to generation {}, dropping {} memoized searches",
                    generation,
                    memo.results.len()
                );
                memo.results.clear();
                memo.generation = generation;
            }
            if let Some(hit) = memo.results.get(&key) {
                return hit;
            }
        }

        let corpus = self.source.corpus();
        let results = self.strategy.search(&corpus, query, limit);
        log::debug!(
            "[{}] {:?} -> {} results",
            self.strategy.name(),
            query,
            results.len()
        );

        let mut memo = self.memo.lock();
        if memo.generation == generation {
            memo.results.insert(key, results.clone());
        }
        results
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn cached_queries(&self) -> usize {
        self.memo.lock().results.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    struct FixedSource {
        generation: AtomicU64,
        corpus: Mutex<Arc<SearchCorpus>>,
    }

    impl FixedSource {
        fn new(names: &[&str]) -> Self {
            Self {
                generation: AtomicU64::new(0),
                corpus: Mutex::new(Arc::new(SearchCorpus::from_names(
                    names.iter().map(|n| n.to_string()).collect(),
                ))),
            }
        }

        fn replace(&self, names: &[&str]) {
            *self.corpus.lock() = Arc::new(SearchCorpus::from_names(
                names.iter().map(|n| n.to_string()).collect(),
            ));
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl CorpusSource for FixedSource {
        fn generation(&self) -> u64 {
            self.generation.load(Ordering::SeqCst)
        }

        fn corpus(&self) -> Arc<SearchCorpus> {
            self.corpus.lock().clone()
        }
    }

    /// Returns names in reverse and counts how often it actually ran
    struct CountingStrategy {
        runs: Arc<AtomicUsize>,
    }

    impl SearchStrategy for CountingStrategy {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn rank(&self, corpus: &SearchCorpus, _query: &str) -> Vec<String> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            corpus.names.iter().rev().cloned().collect()
        }
    }

    fn searcher(source: Arc<FixedSource>) -> (Searcher, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let strategy = CountingStrategy { runs: Arc::clone(&runs) };
        (Searcher::new(Box::new(strategy), source, 16), runs)
    }

    #[test]
    fn test_repeated_query_is_memoized() {
        let source = Arc::new(FixedSource::new(&["Alpha", "Beta"]));
        let (searcher, runs) = searcher(source);

        assert_eq!(searcher.search("x", None), vec!["Beta", "Alpha"]);
        assert_eq!(searcher.search("x", None), vec!["Beta", "Alpha"]);
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // different limit is a different key
        assert_eq!(searcher.search("x", Some(1)), vec!["Beta"]);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(searcher.cached_queries(), 2);
    }

    #[test]
    fn test_generation_change_invalidates() {
        let source = Arc::new(FixedSource::new(&["Alpha", "Beta"]));
        let (searcher, runs) = searcher(Arc::clone(&source));

        searcher.search("x", None);
        source.replace(&["Alpha", "Beta", "Gamma"]);

        assert_eq!(searcher.search("x", None), vec!["Gamma", "Beta", "Alpha"]);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_blank_query_returns_sorted_names() {
        let source = Arc::new(FixedSource::new(&["Beta", "Alpha"]));
        let (searcher, runs) = searcher(source);

        assert_eq!(searcher.search("", None), vec!["Alpha", "Beta"]);
        assert_eq!(searcher.search("  ", Some(1)), vec!["Alpha"]);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
