//! Thai word list used for longest-match segmentation.

use crate::normalizer::{is_thai_combining, is_thai_leading_vowel, normalize};
use lazy_static::lazy_static;
use std::collections::HashSet;

const DEFAULT_WORDS: &str = include_str!("../data/thai_words.txt");

lazy_static! {
    static ref DEFAULT_DICTIONARY: Dictionary = Dictionary::from_words(default_words());
}

fn default_words() -> impl Iterator<Item = &'static str> {
    DEFAULT_WORDS
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Immutable set of known words. Built once, shared read-only.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    words: HashSet<String>,
    max_chars: usize,
}

impl Dictionary {
    /// The embedded word list.
    pub fn default_ref() -> &'static Dictionary {
        &DEFAULT_DICTIONARY
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dictionary = Dictionary::default();
        for word in words {
            dictionary.insert(word.as_ref());
        }
        dictionary
    }

    /// The embedded word list plus `extra` words.
    pub fn with_extra_words<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dictionary = DEFAULT_DICTIONARY.clone();
        for word in extra {
            dictionary.insert(word.as_ref());
        }
        dictionary
    }

    fn insert(&mut self, word: &str) {
        let word = normalize(word);
        if word.is_empty() || word.contains(' ') {
            return;
        }
        self.max_chars = self.max_chars.max(word.chars().count());
        self.words.insert(word);
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Byte length of the longest word that starts `text` and ends on a
    /// valid syllable boundary.
    pub fn longest_match(&self, text: &str) -> Option<usize> {
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(idx, _)| idx)
            .skip(1)
            .chain(std::iter::once(text.len()))
            .take(self.max_chars)
            .collect();

        boundaries.into_iter().rev().find(|&end| {
            self.words.contains(&text[..end]) && is_valid_boundary(text, end)
        })
    }
}

fn is_valid_boundary(text: &str, end: usize) -> bool {
    let ends_with_leading_vowel = text[..end]
        .chars()
        .next_back()
        .is_some_and(is_thai_leading_vowel);
    let splits_cluster = text[end..].chars().next().is_some_and(is_thai_combining);
    !ends_with_leading_vowel && !splits_cluster
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dictionary_loaded() {
        let dict = Dictionary::default_ref();
        assert!(dict.contains("คลิก"));
        assert!(dict.contains("ปุ่ม"));
        assert!(!dict.contains("# verbs"));
    }

    #[test]
    fn test_longest_match_prefers_longer_word() {
        let dict = Dictionary::from_words(["ค้น", "ค้นหา", "หา"]);
        assert_eq!(dict.longest_match("ค้นหาสินค้า"), Some("ค้นหา".len()));
    }

    #[test]
    fn test_longest_match_respects_clusters() {
        // "ที" must not match inside "ที่" (tone mark follows).
        let dict = Dictionary::from_words(["ที"]);
        assert_eq!(dict.longest_match("ที่นี่"), None);
    }

    #[test]
    fn test_no_match() {
        let dict = Dictionary::from_words(["ปุ่ม"]);
        assert_eq!(dict.longest_match("xyz"), None);
        assert_eq!(dict.longest_match(""), None);
    }

    #[test]
    fn test_extra_words() {
        let dict = Dictionary::with_extra_words(["กระเป๋า"]);
        assert!(dict.contains("กระเป๋า"));
        assert!(dict.contains("คลิก"));
    }
}
