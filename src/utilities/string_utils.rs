//! String utilities for tokenization and text heuristics.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

static WORD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{Alphabetic}\p{N}]+(?:'[\p{Alphabetic}]+)?").unwrap());

/// Split text into lowercase word tokens (unicode-aware, apostrophes kept
/// inside contractions).
pub fn tokenize(text: &str) -> Vec<String> {
    WORD_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Tokenize into a deduplicated, ordered set.
pub fn token_set(text: &str) -> BTreeSet<String> {
    tokenize(text).into_iter().collect()
}

/// Whether `text` contains `word` as a whole word, case-insensitively.
pub fn contains_word(text: &str, word: &str) -> bool {
    let needle = word.to_lowercase();
    tokenize(text).iter().any(|t| *t == needle)
}

/// Fraction of words written entirely in uppercase (ignoring one-letter
/// words, which are capitalized in ordinary prose).
pub fn caps_ratio(text: &str) -> f64 {
    let words: Vec<&str> = text.split_whitespace().collect();
    let eligible: Vec<&&str> = words
        .iter()
        .filter(|w| w.chars().filter(|c| c.is_alphabetic()).count() > 1)
        .collect();
    if eligible.is_empty() {
        return 0.0;
    }
    let caps = eligible
        .iter()
        .filter(|w| {
            w.chars()
                .filter(|c| c.is_alphabetic())
                .all(|c| c.is_uppercase())
        })
        .count();
    caps as f64 / eligible.len() as f64
}

/// Trailing `n` characters of `text`, used as a repetition key for closings.
pub fn trailing_key(text: &str, n: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    let start = chars.len().saturating_sub(n);
    chars[start..].iter().collect()
}

/// Word count of `text`.
pub fn word_count(text: &str) -> usize {
    tokenize(text).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_splits() {
        assert_eq!(
            tokenize("I feel Anxious, overwhelmed!"),
            vec!["i", "feel", "anxious", "overwhelmed"]
        );
    }

    #[test]
    fn test_tokenize_keeps_contractions() {
        assert_eq!(tokenize("don't stop"), vec!["don't", "stop"]);
    }

    #[test]
    fn test_tokenize_is_unicode_aware() {
        assert_eq!(tokenize("très fatigué"), vec!["très", "fatigué"]);
    }

    #[test]
    fn test_contains_word_respects_boundaries() {
        assert!(contains_word("I feel sad today", "sad"));
        assert!(!contains_word("sadness lingers", "sad"));
    }

    #[test]
    fn test_caps_ratio() {
        assert!(caps_ratio("I AM SO FINE right now") > 0.5);
        assert_eq!(caps_ratio("all lowercase here"), 0.0);
        assert_eq!(caps_ratio(""), 0.0);
    }

    #[test]
    fn test_trailing_key_short_string() {
        assert_eq!(trailing_key("hi", 20), "hi");
        assert_eq!(trailing_key("abcdefgh", 3), "fgh");
    }
}
