//! Identifier-aware tokenizer for the search index.
//!
//! Text is split on non-alphanumeric delimiters first, then on camelCase
//! boundaries inside each piece; snake_case falls out of the delimiter
//! split. A compound identifier contributes both the whole word and its
//! parts, so exact-identifier queries stay strong.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Tokens must start with a letter; bare numbers are noise.
fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[A-Za-z][A-Za-z0-9]*").expect("static pattern"))
}

const MIN_TOKEN_LEN: usize = 3;

const STOP_WORDS: &[&str] = &[
    "the", "and", "are", "was", "were", "been", "being", "have", "has", "had", "does", "did",
    "will", "would", "could", "should", "may", "might", "must", "shall", "can", "not", "for",
    "with", "from", "into", "through", "during", "before", "after", "above", "below", "between",
    "under", "again", "further", "then", "once", "self", "this", "that", "these", "those", "def",
    "class", "return", "returns", "none", "true", "false", "void", "null",
];

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Split one identifier piece at camelCase boundaries: `getUserName` ->
/// `get`, `user`, `name`. Runs of capitals stay together (`HTTPServer` ->
/// `http`, `server`).
pub fn split_camel(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let mut parts = Vec::new();
    let mut start = 0;

    for i in 1..chars.len() {
        let boundary = (chars[i].is_uppercase() && chars[i - 1].is_lowercase())
            || (chars[i].is_uppercase()
                && chars[i - 1].is_uppercase()
                && chars.get(i + 1).is_some_and(|c| c.is_lowercase()))
            || (chars[i].is_alphabetic() && chars[i - 1].is_numeric());
        if boundary {
            parts.push(chars[start..i].iter().collect::<String>());
            start = i;
        }
    }
    parts.push(chars[start..].iter().collect::<String>());
    parts
}

/// Tokenize free text into lowercase search terms.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for word in word_pattern().find_iter(text) {
        let word = word.as_str();
        let parts = split_camel(word);
        // The whole identifier, plus its parts when it actually splits.
        let mut emit = vec![word.to_lowercase()];
        if parts.len() > 1 {
            emit.extend(parts.into_iter().map(|p| p.to_lowercase()));
        }
        for token in emit {
            if token.len() >= MIN_TOKEN_LEN && !is_stop_word(&token) {
                tokens.push(token);
            }
        }
    }
    tokens
}

/// Deduplicated query tokens in stable order, for scoring and cache keys.
pub fn query_terms(query: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tokenize(query)
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Term-frequency vector for one document. Name, signature, and docstring
/// buckets are equally weighted. BTreeMap keeps insertion order stable for
/// deterministic writes.
pub fn document_terms(
    name: &str,
    signature: Option<&str>,
    docstring: Option<&str>,
) -> BTreeMap<String, i64> {
    let mut counts: BTreeMap<String, i64> = BTreeMap::new();
    for token in tokenize(name) {
        *counts.entry(token).or_insert(0) += 1;
    }
    if let Some(signature) = signature {
        for token in tokenize(signature) {
            *counts.entry(token).or_insert(0) += 1;
        }
    }
    if let Some(docstring) = docstring {
        for token in tokenize(docstring) {
            *counts.entry(token).or_insert(0) += 1;
        }
    }
    counts
}
