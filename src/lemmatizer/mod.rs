//! Text normalization: tokens to lemma occurrence counts.
//!
//! The same normalizer runs over crawled page text and over query text, so
//! index terms and query terms always agree.

mod stopwords;

use std::collections::{HashMap, HashSet};

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

use stopwords::{ENGLISH_STOP_WORDS, RUSSIAN_STOP_WORDS};

/// Maximal runs of Latin or Cyrillic letters.
const WORD_PATTERN: &str = "[a-zA-Zа-яёА-ЯЁ]+";

/// True when every character of the word is a Latin letter.
pub fn is_latin(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_alphabetic())
}

/// True when every character of the word is a Cyrillic letter.
pub fn is_cyrillic(word: &str) -> bool {
    !word.is_empty()
        && word
            .chars()
            .all(|c| matches!(c, 'а'..='я' | 'А'..='Я' | 'ё' | 'Ё'))
}

/// Tokenizes text, filters stop-words, and resolves tokens to canonical
/// lemmas via the language-appropriate morphological analyzer.
pub struct TextNormalizer {
    word_pattern: Regex,
    english: Stemmer,
    russian: Stemmer,
    english_stops: HashSet<&'static str>,
    russian_stops: HashSet<&'static str>,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self {
            word_pattern: Regex::new(WORD_PATTERN).expect("valid word pattern"),
            english: Stemmer::create(Algorithm::English),
            russian: Stemmer::create(Algorithm::Russian),
            english_stops: ENGLISH_STOP_WORDS.iter().copied().collect(),
            russian_stops: RUSSIAN_STOP_WORDS.iter().copied().collect(),
        }
    }

    /// Map of lemma to occurrence count for a unit of text.
    ///
    /// Single-letter tokens, stop-words and mixed-script tokens are
    /// dropped. Pure: shared unchanged by indexing and query processing.
    pub fn normalize(&self, text: &str) -> HashMap<String, f32> {
        let mut counts: HashMap<String, f32> = HashMap::new();
        for token in self.word_pattern.find_iter(text) {
            let word = token.as_str().to_lowercase();
            if word.chars().count() < 2 {
                continue;
            }
            if is_cyrillic(&word) {
                if self.russian_stops.contains(word.as_str()) {
                    continue;
                }
            } else if is_latin(&word) {
                if self.english_stops.contains(word.as_str()) {
                    continue;
                }
            } else {
                // Mixed-script token: matches neither language.
                continue;
            }
            match self.normal_forms(&word).into_iter().next() {
                Some(lemma) => *counts.entry(lemma).or_insert(0.0) += 1.0,
                None => tracing::debug!(token = %word, "no normal form, token skipped"),
            }
        }
        counts
    }

    /// Normal forms of a single lowercased word; empty when the word fits
    /// neither letter class.
    pub fn normal_forms(&self, word: &str) -> Vec<String> {
        if is_cyrillic(word) {
            vec![self.russian.stem(word).into_owned()]
        } else if is_latin(word) {
            vec![self.english.stem(word).into_owned()]
        } else {
            Vec::new()
        }
    }
}
