//! Body similarity metrics

use serde::{Deserialize, Serialize};
use similar::TextDiff;
use std::collections::HashMap;
use std::fmt;

/// Shortest word that can match another word as a typo variant
const MIN_TYPO_LEN: usize = 4;

/// How two bodies are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Dice overlap of lower-cased word tokens, counting typo variants
    #[default]
    Tokens,
    /// Word-level diff ratio
    Edit,
}

/// A body prepared for scoring. Build once per document and reuse it for
/// every pair.
#[derive(Debug, Clone)]
pub struct Profile<'a> {
    text: &'a str,
    /// Token -> occurrences
    words: HashMap<String, usize>,
    total: usize,
}

impl<'a> Profile<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut words: HashMap<String, usize> = HashMap::new();
        let mut total = 0;
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            *words.entry(token.to_lowercase()).or_insert(0) += 1;
            total += 1;
        }
        Self { text, words, total }
    }

    /// Empty or whitespace-only body
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Tokens => "tokens",
            Metric::Edit => "edit",
        }
    }

    /// Score two bodies in `[0, 1]`.
    ///
    /// Two empty bodies score 1.0, an empty and a non-empty body 0.0.
    pub fn score(&self, a: &str, b: &str) -> f64 {
        self.compare(&Profile::new(a), &Profile::new(b))
    }

    /// Score two prepared bodies, same rules as [`Metric::score`]
    pub fn compare(&self, a: &Profile<'_>, b: &Profile<'_>) -> f64 {
        match (a.is_empty(), b.is_empty()) {
            (true, true) => 1.0,
            (true, false) | (false, true) => 0.0,
            (false, false) => match self {
                Metric::Tokens => word_overlap(a, b),
                Metric::Edit => edit_ratio(a.text, b.text),
            },
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// `2 * matched / total` over word tokens, where a word also matches a
/// typo variant of itself
pub fn token_overlap(a: &str, b: &str) -> f64 {
    word_overlap(&Profile::new(a), &Profile::new(b))
}

fn word_overlap(a: &Profile<'_>, b: &Profile<'_>) -> f64 {
    let total = a.total + b.total;
    if total == 0 {
        // Punctuation-only bodies
        return if a.text.trim() == b.text.trim() { 1.0 } else { 0.0 };
    }

    let mut exact = 0;
    let mut a_left: HashMap<&str, usize> = HashMap::new();
    for (word, &count) in &a.words {
        let shared = count.min(b.words.get(word).copied().unwrap_or(0));
        exact += shared;
        if count > shared {
            a_left.insert(word.as_str(), count - shared);
        }
    }
    let b_left: HashMap<&str, usize> = b
        .words
        .iter()
        .filter_map(|(word, &count)| {
            let shared = count.min(a.words.get(word).copied().unwrap_or(0));
            (count > shared).then(|| (word.as_str(), count - shared))
        })
        .collect();

    // Greedy matching depends on which side drives it
    let typos = typo_matches(&a_left, &b_left).min(typo_matches(&b_left, &a_left));

    (2 * (exact + typos)) as f64 / total as f64
}

/// The word itself and every single-character deletion of it.
/// Two words are typo variants when their variant sets intersect.
fn variants(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    if chars.len() < MIN_TYPO_LEN {
        return Vec::new();
    }

    let mut out = vec![word.to_string()];
    for skip in 0..chars.len() {
        let deleted: String = chars
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != skip)
            .map(|(_, c)| c)
            .collect();
        if !out.contains(&deleted) {
            out.push(deleted);
        }
    }
    out
}

/// Pair leftover words of `left` with typo variants in `right`
fn typo_matches(left: &HashMap<&str, usize>, right: &HashMap<&str, usize>) -> usize {
    if left.is_empty() || right.is_empty() {
        return 0;
    }

    let mut index: HashMap<String, Vec<&str>> = HashMap::new();
    for &word in right.keys() {
        for key in variants(word) {
            index.entry(key).or_default().push(word);
        }
    }
    for candidates in index.values_mut() {
        candidates.sort_unstable();
        candidates.dedup();
    }

    let mut remaining = right.clone();
    let mut words: Vec<(&str, usize)> = left.iter().map(|(&w, &c)| (w, c)).collect();
    words.sort_unstable();

    let mut matched = 0;
    for (word, mut count) in words {
        for key in variants(word) {
            for candidate in index.get(&key).into_iter().flatten() {
                if count == 0 {
                    break;
                }
                if let Some(available) = remaining.get_mut(candidate) {
                    let take = count.min(*available);
                    *available -= take;
                    count -= take;
                    matched += take;
                }
            }
        }
    }
    matched
}

/// `2 * matched / total` over word tokens
pub fn edit_ratio(a: &str, b: &str) -> f64 {
    // The diff is not guaranteed to be symmetric, so fix the argument order
    let (old, new) = if a <= b { (a, b) } else { (b, a) };
    let ratio = TextDiff::from_words(old, new).ratio();
    f64::from(ratio).clamp(0.0, 1.0)
}
