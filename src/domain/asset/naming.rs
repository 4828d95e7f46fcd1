// src/domain/asset/naming.rs
//
// Name and tag normalization.
//
// RULES:
// - Asset names are keyed in title case
// - Tags are lower-case and trimmed
// - Query tokenization and tag tokenization share one word pattern

use std::sync::OnceLock;

use regex::Regex;

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\w+(?:['\-]\w+)*|[^\w\s]").expect("static word pattern is valid")
    })
}

/// Title-case a string: a letter following a non-letter is upper-cased,
/// every other letter is lower-cased. A letter whose upper case spans
/// several characters keeps only the first one upper-cased, so the result
/// is stable under a second pass.
///
/// ```
/// use mapvault::domain::title_case;
/// assert_eq!(title_case("ancient RUINS"), "Ancient Ruins");
/// assert_eq!(title_case("dragon's lair"), "Dragon'S Lair");
/// ```
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                let mut upper = ch.to_uppercase();
                out.extend(upper.next());
                out.extend(upper.flat_map(char::to_lowercase));
            }
            previous_is_letter = true;
        } else {
            out.push(ch);
            previous_is_letter = false;
        }
    }
    out
}

/// Canonical catalog key for a user supplied name.
pub fn normalize_name(name: &str) -> String {
    title_case(name.trim())
}

pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Split free text into word and punctuation tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    word_pattern()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Tokenize free text into normalized tag words, dropping punctuation and
/// duplicates while keeping first-seen order.
pub fn tag_words(text: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for token in tokenize(text) {
        if !token.chars().any(char::is_alphanumeric) {
            continue;
        }
        let tag = normalize_tag(&token);
        if !words.contains(&tag) {
            words.push(tag);
        }
    }
    words
}

/// Strip non-ASCII characters.
pub fn ascii_clean(text: &str) -> String {
    text.chars().filter(char::is_ascii).collect()
}
