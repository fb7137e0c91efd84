//! Text normalization for indexing and querying.
//!
//! Both sides of the index see text through the same [`Normalizer`], so a
//! record and a query only need to agree after normalization:
//!
//! 1. Lower-case.
//! 2. Fold configured variants (default: Cyrillic `ё` to `е`).
//! 3. Replace anything that is not a Latin or Cyrillic letter, an ASCII
//!    digit, or whitespace with a space.
//! 4. Collapse whitespace runs and trim.

use std::collections::{BTreeMap, HashMap};

/// Default fold table: `ё` is written as `е` in most Russian text.
pub const DEFAULT_FOLDS: &[(char, char)] = &[('ё', 'е')];

/// Normalizes text into the canonical form the trigram index stores.
#[derive(Debug, Clone)]
pub struct Normalizer {
    folds: HashMap<char, char>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::with_folds(DEFAULT_FOLDS.iter().copied())
    }
}

impl Normalizer {
    /// Create a normalizer that applies no variant folding.
    pub fn without_folds() -> Self {
        Self {
            folds: HashMap::new(),
        }
    }

    /// Create a normalizer with a custom fold table.
    ///
    /// Both sides of every pair are lower-cased. Chains such as `a -> b`,
    /// `b -> c` are resolved to `a -> c`, and every member of a cycle folds
    /// to the cycle's smallest character, so a second pass over normalized
    /// text changes nothing.
    pub fn with_folds(pairs: impl IntoIterator<Item = (char, char)>) -> Self {
        let raw: HashMap<char, char> = pairs
            .into_iter()
            .map(|(from, to)| (lower_char(from), lower_char(to)))
            .filter(|(from, to)| from != to)
            .collect();

        let mut folds = HashMap::with_capacity(raw.len());
        for (&from, &first) in &raw {
            let target = resolve_fold(&raw, from, first);
            if target != from {
                folds.insert(from, target);
            }
        }

        Self { folds }
    }

    /// Build a normalizer from a config-style string table.
    ///
    /// Entries whose key or value is not exactly one character are skipped
    /// with a warning.
    pub fn from_table(table: &BTreeMap<String, String>) -> Self {
        let pairs = table.iter().filter_map(|(from, to)| {
            match (single_char(from), single_char(to)) {
                (Some(f), Some(t)) => Some((f, t)),
                _ => {
                    tracing::warn!(from = %from, to = %to, "ignoring fold entry that is not a single character pair");
                    None
                }
            }
        });
        Self::with_folds(pairs)
    }

    /// Number of active fold rules.
    pub fn fold_count(&self) -> usize {
        self.folds.len()
    }

    /// Normalize text to its canonical indexed form.
    ///
    /// Empty input normalizes to the empty string.
    pub fn normalize(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let mut out = String::with_capacity(text.len());
        let mut pending_space = false;

        for c in text.chars().flat_map(char::to_lowercase) {
            let c = self.folds.get(&c).copied().unwrap_or(c);
            if is_indexable(c) {
                if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                out.push(c);
            } else {
                pending_space = true;
            }
        }

        out
    }
}

/// Follow a fold chain from `from` to a character no rule rewrites.
///
/// A chain that runs into a cycle ends at the cycle's smallest member.
fn resolve_fold(raw: &HashMap<char, char>, from: char, first: char) -> char {
    let mut path = vec![from];
    let mut target = first;
    while let Some(&next) = raw.get(&target) {
        if let Some(start) = path.iter().position(|&c| c == target) {
            return path[start..].iter().copied().min().unwrap_or(target);
        }
        path.push(target);
        target = next;
    }
    target
}

/// Whether a lower-cased character survives normalization as itself.
///
/// Whitespace is deliberately excluded: it only separates tokens and is
/// re-emitted as a single space.
fn is_indexable(c: char) -> bool {
    if c.is_ascii_digit() {
        return true;
    }
    if !c.is_alphabetic() {
        return false;
    }
    let cp = c as u32;
    // Latin (Basic, Latin-1 Supplement, Extended-A/B) and the Cyrillic block.
    cp <= 0x024F || (0x0400..=0x04FF).contains(&cp)
}

fn lower_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Normalize text with the default fold table.
pub fn normalize(text: &str) -> String {
    Normalizer::default().normalize(text)
}
