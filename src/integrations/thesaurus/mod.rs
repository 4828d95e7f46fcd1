// src/integrations/thesaurus/mod.rs
//
// Synonym lookup seam. An empty set is a valid answer.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::domain::normalize_tag;
use crate::error::AppResult;

#[cfg_attr(test, mockall::automock)]
pub trait Thesaurus: Send + Sync {
    /// Words lexically related to `word`
    fn synonyms(&self, word: &str) -> BTreeSet<String>;
}

/// Knows no synonyms at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoThesaurus;

impl Thesaurus for NoThesaurus {
    fn synonyms(&self, _word: &str) -> BTreeSet<String> {
        BTreeSet::new()
    }
}

/// Synonym groups loaded from a JSON object of `word -> [synonym, ...]`.
///
/// Links are made symmetric and every group contains its own head word,
/// the same shape a lemma lookup returns.
#[derive(Debug, Default, Clone)]
pub struct WordListThesaurus {
    groups: HashMap<String, BTreeSet<String>>,
}

impl WordListThesaurus {
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let raw: HashMap<String, Vec<String>> = serde_json::from_str(&content)?;
        let thesaurus = Self::from_pairs(raw);
        log::info!(
            "Loaded thesaurus with {} words from {:?}",
            thesaurus.len(),
            path
        );
        Ok(thesaurus)
    }

    pub fn from_pairs<I, W, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (W, Vec<S>)>,
        W: AsRef<str>,
        S: AsRef<str>,
    {
        let mut groups: HashMap<String, BTreeSet<String>> = HashMap::new();
        for (word, synonyms) in pairs {
            let word = normalize_tag(word.as_ref());
            if word.is_empty() {
                continue;
            }
            groups.entry(word.clone()).or_default().insert(word.clone());
            for synonym in synonyms {
                let synonym = normalize_tag(synonym.as_ref());
                if synonym.is_empty() {
                    continue;
                }
                groups.entry(word.clone()).or_default().insert(synonym.clone());
                let reverse = groups.entry(synonym.clone()).or_default();
                reverse.insert(synonym);
                reverse.insert(word.clone());
            }
        }
        Self { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Thesaurus for WordListThesaurus {
    fn synonyms(&self, word: &str) -> BTreeSet<String> {
        self.groups
            .get(&normalize_tag(word))
            .cloned()
            .unwrap_or_default()
    }
}
