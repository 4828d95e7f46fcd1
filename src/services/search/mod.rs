// src/services/search/mod.rs
//
// Search Engine
//
// Interchangeable ranking strategies behind a memoizing Searcher.

pub mod searcher;
pub mod similarity;
pub mod strategies;

pub use searcher::{CorpusSource, Searcher};
pub use similarity::{close_matches, ratio};
pub use strategies::{
    ScoredMapStrategy, ScoredTokenStrategy, SearchCorpus, SearchStrategy, TagCutoffStrategy,
};
