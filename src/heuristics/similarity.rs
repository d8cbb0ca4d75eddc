use rphonetic::{DoubleMetaphone, Encoder};
use strsim::levenshtein;

/// Lowercase a phrase and collapse its whitespace to single spaces
pub fn normalize_phrase(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Number of whitespace-separated words
pub fn phrase_word_count(phrase: &str) -> usize {
    phrase.split_whitespace().count()
}

/// Levenshtein distance over characters divided by the longer length (0 = identical)
pub fn normalized_edit_distance(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 0.0;
    }
    levenshtein(a, b) as f64 / max_len as f64
}

/// Cheap lower bound on `normalized_edit_distance` from the length difference alone
pub fn length_lower_bound(a: &str, b: &str) -> f64 {
    let (la, lb) = (a.chars().count(), b.chars().count());
    let max_len = la.max(lb);
    if max_len == 0 {
        return 0.0;
    }
    la.abs_diff(lb) as f64 / max_len as f64
}

/// Number of leading characters two strings share, compared case-insensitively
pub fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars()
        .flat_map(char::to_lowercase)
        .zip(b.chars().flat_map(char::to_lowercase))
        .take_while(|(x, y)| x == y)
        .count()
}

/// Double Metaphone codes (primary and alternate) for one word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneticKey {
    primary: String,
    alternate: String,
}

impl PhoneticKey {
    pub fn of(encoder: &DoubleMetaphone, word: &str) -> Self {
        let letters: String = word.chars().filter(|c| c.is_alphabetic()).collect();
        if letters.is_empty() {
            return Self {
                primary: String::new(),
                alternate: String::new(),
            };
        }
        Self {
            primary: encoder.encode(&letters),
            alternate: encoder.encode_alternate(&letters),
        }
    }

    /// Words without letters (numbers) have no phonetic representation
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    /// Whether any code of one key equals any code of the other
    pub fn matches(&self, other: &PhoneticKey) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let mine = [&self.primary, &self.alternate];
        let theirs = [&other.primary, &other.alternate];
        mine.iter()
            .filter(|c| !c.is_empty())
            .any(|c| theirs.iter().any(|o| !o.is_empty() && o == c))
    }
}

/// Per-word phonetic keys of a phrase
pub fn phrase_keys(encoder: &DoubleMetaphone, phrase: &str) -> Vec<PhoneticKey> {
    phrase
        .split_whitespace()
        .map(|w| PhoneticKey::of(encoder, w))
        .collect()
}

/// Word-by-word phonetic agreement; a word with no code on either side is not held against the pair
pub fn phonetically_compatible(a: &[PhoneticKey], b: &[PhoneticKey]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| x.is_empty() || y.is_empty() || x.matches(y))
}
