//! Tokenization and trigram generation.

use std::fmt;

use serde::{Serialize, Serializer};

use super::normalize::Normalizer;

/// Tokens shorter than this (in characters) are dropped.
pub const MIN_TOKEN_CHARS: usize = 3;

/// A three-character window over a space-padded token.
///
/// Stored as chars rather than bytes so Cyrillic and accented Latin text
/// produce real character trigrams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Trigram([char; 3]);

impl Trigram {
    /// Create a trigram from three characters.
    pub const fn new(chars: [char; 3]) -> Self {
        Self(chars)
    }

    /// The three characters of this trigram.
    pub fn chars(&self) -> [char; 3] {
        self.0
    }

    /// Whether this trigram sits on a word boundary (starts or ends with padding).
    pub fn is_boundary(&self) -> bool {
        self.0[0] == ' ' || self.0[2] == ' '
    }
}

impl fmt::Display for Trigram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.0[0], self.0[1], self.0[2])
    }
}

impl Serialize for Trigram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Split normalized text into tokens of at least [`MIN_TOKEN_CHARS`] characters.
pub fn tokenize(normalizer: &Normalizer, text: &str) -> Vec<String> {
    normalizer
        .normalize(text)
        .split(' ')
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

/// Generate the padded trigrams of a single token, left to right.
///
/// `"cat"` is padded to `" cat "` and yields `" ca"`, `"cat"`, `"at "`.
/// Duplicates are kept; tokens shorter than three characters yield nothing.
pub fn generate_trigrams(token: &str) -> Vec<Trigram> {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() < MIN_TOKEN_CHARS {
        return Vec::new();
    }

    let mut padded = Vec::with_capacity(chars.len() + 2);
    padded.push(' ');
    padded.extend_from_slice(&chars);
    padded.push(' ');

    padded
        .windows(3)
        .map(|w| Trigram([w[0], w[1], w[2]]))
        .collect()
}

/// Tokenize text and concatenate the trigrams of every token.
pub fn text_trigrams(normalizer: &Normalizer, text: &str) -> Vec<Trigram> {
    tokenize(normalizer, text)
        .iter()
        .flat_map(|token| generate_trigrams(token))
        .collect()
}
