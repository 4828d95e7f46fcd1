// src/services/search/strategies.rs
//
// Ranking strategies.
//
// CRITICAL RULES:
// - Strategies are read-only over a corpus snapshot
// - An empty or whitespace-only query returns the corpus names unranked
// - Equal scores are ordered by name ascending

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use super::similarity::{close_matches, ratio};
use crate::domain::{title_case, tokenize};
use crate::integrations::Thesaurus;

/// What a strategy ranks over.
///
/// Token corpora carry names only; their tag index and vocabulary are empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCorpus {
    /// Alphabetically sorted asset names
    pub names: Vec<String>,
    /// tag -> names carrying it
    pub tag_index: BTreeMap<String, BTreeSet<String>>,
    /// Global tag set offered to query matching
    pub vocabulary: BTreeSet<String>,
}

impl SearchCorpus {
    pub fn from_names(mut names: Vec<String>) -> Self {
        names.sort();
        Self {
            names,
            ..Self::default()
        }
    }
}

pub trait SearchStrategy: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Rank every relevant name for a non-blank query
    fn rank(&self, corpus: &SearchCorpus, query: &str) -> Vec<String>;

    /// `rank`, with the blank-query contract and the limit applied
    fn search(&self, corpus: &SearchCorpus, query: &str, limit: Option<usize>) -> Vec<String> {
        let mut results = if query.trim().is_empty() {
            corpus.names.clone()
        } else {
            self.rank(corpus, query)
        };
        if let Some(limit) = limit {
            results.truncate(limit);
        }
        results
    }
}

/// Lower-cased word tokens of a trimmed query
fn query_tokens(query: &str) -> Vec<String> {
    tokenize(&query.trim().to_lowercase())
}

/// Add `score` to every holder of a tag
fn credit_holders<'a>(
    scores: &mut HashMap<&'a str, f64>,
    holders: &'a BTreeSet<String>,
    score: f64,
) {
    for name in holders {
        *scores.entry(name.as_str()).or_insert(0.0) += score;
    }
}

/// Order `names` by score descending, name ascending
fn order_by_score<F>(names: &[String], score: F) -> Vec<String>
where
    F: Fn(&str) -> f64,
{
    let mut scored: Vec<(f64, &String)> = names.iter().map(|n| (score(n), n)).collect();
    scored.sort_by(|x, y| y.0.total_cmp(&x.0).then_with(|| x.1.cmp(y.1)));
    scored.into_iter().map(|(_, n)| n.clone()).collect()
}

// ============================================================================
// SCORED MAP STRATEGY
// ============================================================================

/// Name, tag and synonym scoring for maps.
///
/// `total = 0.6 * name + 0.4 * tag + 0.1 * synonym`
pub struct ScoredMapStrategy {
    thesaurus: Arc<dyn Thesaurus>,
}

impl ScoredMapStrategy {
    const NAME_WEIGHT: f64 = 0.6;
    const TAG_WEIGHT: f64 = 0.4;
    const SYNONYM_WEIGHT: f64 = 0.1;

    pub fn new(thesaurus: Arc<dyn Thesaurus>) -> Self {
        Self { thesaurus }
    }

    fn tag_scores<'a>(corpus: &'a SearchCorpus, tokens: &[String]) -> HashMap<&'a str, f64> {
        let mut scores = HashMap::new();
        for token in tokens {
            for (tag, holders) in &corpus.tag_index {
                credit_holders(&mut scores, holders, ratio(token, tag));
            }
        }
        scores
    }

    fn name_score(query: &str, name: &str) -> f64 {
        title_case(query)
            .split_whitespace()
            .map(|word| ratio(word, name))
            .sum()
    }

    fn synonym_scores<'a>(&self, corpus: &'a SearchCorpus, tokens: &[String]) -> HashMap<&'a str, f64> {
        let mut scores = HashMap::new();
        for token in tokens {
            for synonym in self.thesaurus.synonyms(token) {
                for (tag, holders) in &corpus.tag_index {
                    credit_holders(&mut scores, holders, ratio(&synonym, tag));
                }
            }
        }
        scores
    }
}

impl SearchStrategy for ScoredMapStrategy {
    fn name(&self) -> &'static str {
        "scored-map"
    }

    fn rank(&self, corpus: &SearchCorpus, query: &str) -> Vec<String> {
        let query = query.trim().to_lowercase();
        let tokens = query_tokens(&query);
        let tag_scores = Self::tag_scores(corpus, &tokens);
        let synonym_scores = self.synonym_scores(corpus, &tokens);

        order_by_score(&corpus.names, |name| {
            Self::NAME_WEIGHT * Self::name_score(&query, name)
                + Self::TAG_WEIGHT * tag_scores.get(name).copied().unwrap_or(0.0)
                + Self::SYNONYM_WEIGHT * synonym_scores.get(name).copied().unwrap_or(0.0)
        })
    }
}

// ============================================================================
// SCORED TOKEN STRATEGY
// ============================================================================

/// Name and synonym scoring for tokens, which carry no tags.
///
/// `total = 0.9 * name + 0.1 * synonym`
pub struct ScoredTokenStrategy {
    thesaurus: Arc<dyn Thesaurus>,
}

impl ScoredTokenStrategy {
    const NAME_WEIGHT: f64 = 0.9;
    const SYNONYM_WEIGHT: f64 = 0.1;

    pub fn new(thesaurus: Arc<dyn Thesaurus>) -> Self {
        Self { thesaurus }
    }
}

impl SearchStrategy for ScoredTokenStrategy {
    fn name(&self) -> &'static str {
        "scored-token"
    }

    fn rank(&self, corpus: &SearchCorpus, query: &str) -> Vec<String> {
        let tokens = query_tokens(query);
        let synonyms: Vec<String> = tokens
            .iter()
            .flat_map(|token| self.thesaurus.synonyms(token))
            .collect();

        order_by_score(&corpus.names, |name| {
            let name_score: f64 = tokens.iter().map(|t| ratio(t, name)).sum();
            let synonym_score: f64 = synonyms.iter().map(|s| ratio(s, name)).sum();
            Self::NAME_WEIGHT * name_score + Self::SYNONYM_WEIGHT * synonym_score
        })
    }
}

// ============================================================================
// TAG CUTOFF STRATEGY
// ============================================================================

/// Widening-cutoff tag matching.
///
/// Each query word is matched against the tag vocabulary at cutoffs
/// `1.0, 1.0 - accuracy, ...` until something matches. Maps are ranked by
/// matched tag count, then name, then stably re-ranked by their average
/// similarity to the matched tags.
pub struct TagCutoffStrategy {
    accuracy: f64,
}

impl TagCutoffStrategy {
    const MATCHES_PER_WORD: usize = 5;
    const MIN_ACCURACY: f64 = 0.01;

    /// `accuracy` is the cutoff step, clamped into `[0.01, 1]`. Zero,
    /// negative and NaN steps fall back to the smallest step.
    pub fn new(accuracy: f64) -> Self {
        let accuracy = if accuracy.is_nan() {
            Self::MIN_ACCURACY
        } else {
            accuracy.clamp(Self::MIN_ACCURACY, 1.0)
        };
        Self { accuracy }
    }

    fn tries(&self) -> usize {
        (1.0 / self.accuracy) as usize + 1
    }

    fn matched_tags(&self, corpus: &SearchCorpus, query: &str) -> BTreeSet<String> {
        let words: BTreeSet<String> = query
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();

        let mut matched = BTreeSet::new();
        for word in &words {
            for attempt in 0..self.tries() {
                let cutoff = 1.0 - self.accuracy * attempt as f64;
                let found = close_matches(
                    word,
                    &corpus.vocabulary,
                    Self::MATCHES_PER_WORD,
                    cutoff,
                );
                if !found.is_empty() {
                    matched.extend(found);
                    break;
                }
            }
        }
        matched
    }
}

impl Default for TagCutoffStrategy {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl SearchStrategy for TagCutoffStrategy {
    fn name(&self) -> &'static str {
        "tag-cutoff"
    }

    fn rank(&self, corpus: &SearchCorpus, query: &str) -> Vec<String> {
        let matched = self.matched_tags(corpus, query);
        if matched.is_empty() {
            return Vec::new();
        }

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for tag in &matched {
            if let Some(holders) = corpus.tag_index.get(tag) {
                for name in holders {
                    *counts.entry(name.as_str()).or_insert(0) += 1;
                }
            }
        }

        let mut candidates: Vec<(&str, usize)> = counts.into_iter().collect();
        candidates.sort_by(|x, y| y.1.cmp(&x.1).then_with(|| x.0.cmp(y.0)));

        let mut ranked: Vec<(&str, f64)> = candidates
            .into_iter()
            .map(|(name, _)| {
                let total: f64 = matched.iter().map(|tag| ratio(tag, name)).sum();
                (name, total / matched.len() as f64)
            })
            .collect();
        ranked.sort_by(|x, y| y.1.total_cmp(&x.1));

        ranked.into_iter().map(|(name, _)| name.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::thesaurus::MockThesaurus;
    use crate::integrations::{NoThesaurus, WordListThesaurus};

    fn corpus(maps: &[(&str, &[&str])]) -> SearchCorpus {
        let mut tag_index: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (name, tags) in maps {
            for tag in *tags {
                tag_index
                    .entry(tag.to_string())
                    .or_default()
                    .insert(name.to_string());
            }
        }
        SearchCorpus {
            names: SearchCorpus::from_names(maps.iter().map(|(n, _)| n.to_string()).collect())
                .names,
            vocabulary: tag_index.keys().cloned().collect(),
            tag_index,
        }
    }

    fn ruins_and_lair() -> SearchCorpus {
        corpus(&[
            ("Ancient Ruins", &["ruins", "stone", "outdoor"]),
            ("Dragon Lair", &["dragon", "cave", "fire"]),
        ])
    }

    #[test]
    fn test_scored_map_ranks_tag_and_name_match_first() {
        let strategy = ScoredMapStrategy::new(Arc::new(NoThesaurus));
        let results = strategy.search(&ruins_and_lair(), "dragon", None);
        assert_eq!(results, vec!["Dragon Lair", "Ancient Ruins"]);
    }

    #[test]
    fn test_blank_query_returns_names_in_order() {
        let strategy = ScoredMapStrategy::new(Arc::new(NoThesaurus));
        let corpus = ruins_and_lair();

        assert_eq!(strategy.search(&corpus, "   ", None), corpus.names);
        assert_eq!(strategy.search(&corpus, "", Some(1)), vec!["Ancient Ruins"]);
        assert!(strategy.search(&corpus, "", Some(0)).is_empty());
    }

    #[test]
    fn test_limit_truncates_ranking() {
        let strategy = ScoredMapStrategy::new(Arc::new(NoThesaurus));
        assert_eq!(
            strategy.search(&ruins_and_lair(), "stone ruins", Some(1)),
            vec!["Ancient Ruins"]
        );
    }

    #[test]
    fn test_scored_map_uses_synonyms_of_each_token() {
        let mut thesaurus = MockThesaurus::new();
        thesaurus.expect_synonyms().returning(|word| {
            if word == "wyrm" {
                ["dragon".to_string()].into_iter().collect()
            } else {
                BTreeSet::new()
            }
        });

        let corpus = corpus(&[
            ("Aaa", &["stone"]),
            ("Bbb", &["dragon"]),
        ]);
        let strategy = ScoredMapStrategy::new(Arc::new(thesaurus));

        assert_eq!(strategy.search(&corpus, "wyrm", None), vec!["Bbb", "Aaa"]);
    }

    #[test]
    fn test_scored_ties_break_by_name() {
        let strategy = ScoredMapStrategy::new(Arc::new(NoThesaurus));
        let corpus = corpus(&[("Bbb", &[]), ("Aaa", &[]), ("Ccc", &[])]);

        assert_eq!(
            strategy.search(&corpus, "zzz", None),
            vec!["Aaa", "Bbb", "Ccc"]
        );
    }

    #[test]
    fn test_scored_token_strategy() {
        let thesaurus = WordListThesaurus::from_pairs(vec![("wyrm", vec!["dragon"])]);
        let strategy = ScoredTokenStrategy::new(Arc::new(thesaurus));
        let corpus = SearchCorpus::from_names(vec![
            "Goblin".to_string(),
            "Red Dragon".to_string(),
            "Skeleton".to_string(),
        ]);

        assert_eq!(strategy.search(&corpus, "dragon", None)[0], "Red Dragon");
        assert_eq!(strategy.search(&corpus, "wyrm", Some(1)), vec!["Red Dragon"]);
        assert!(corpus.tag_index.is_empty());
    }

    #[test]
    fn test_tag_cutoff_widens_until_match() {
        let strategy = TagCutoffStrategy::default();
        assert_eq!(strategy.tries(), 3);

        let corpus = ruins_and_lair();
        // exact hit at cutoff 1.0
        assert_eq!(
            strategy.matched_tags(&corpus, "CAVE"),
            BTreeSet::from(["cave".to_string()])
        );
        // no exact hit, widened to 0.5
        let widened = strategy.matched_tags(&corpus, "caves");
        assert!(widened.contains("cave"));
    }

    #[test]
    fn test_tag_cutoff_ranks_by_matched_count() {
        let strategy = TagCutoffStrategy::new(0.5);
        let corpus = corpus(&[
            ("Ash Cave", &["cave"]),
            ("Burning Cave", &["cave", "fire"]),
            ("Meadow", &["grass"]),
        ]);

        let results = strategy.search(&corpus, "cave fire", None);

        assert_eq!(results.len(), 2);
        assert!(!results.contains(&"Meadow".to_string()));
    }

    #[test]
    fn test_tag_cutoff_accuracy_is_clamped() {
        for accuracy in [0.0, -3.0, f64::NAN] {
            let tries = TagCutoffStrategy::new(accuracy).tries();
            assert!((100..=101).contains(&tries), "{} -> {}", accuracy, tries);
        }
        assert_eq!(TagCutoffStrategy::new(7.0).tries(), 2);

        let corpus = ruins_and_lair();
        let matched = TagCutoffStrategy::new(0.0).matched_tags(&corpus, "zzzz");
        assert!(matched.len() <= TagCutoffStrategy::MATCHES_PER_WORD);
    }

    #[test]
    fn test_tag_cutoff_with_empty_vocabulary() {
        let strategy = TagCutoffStrategy::default();
        let corpus = SearchCorpus::from_names(vec!["Lonely".to_string()]);
        assert!(strategy.search(&corpus, "anything", None).is_empty());
    }
}
