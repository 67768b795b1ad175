//! Alignment quality filter.
//!
//! A segment produced by forced alignment carries both its reference transcript (`text`)
//! and what the acoustic model heard (`model_output`).
//! When both diverge too much, the segment boundaries are likely wrong and the segment is dropped.
use itertools::Itertools;
use unicode_segmentation::UnicodeSegmentation;

use super::Filter;

const DEFAULT_MAX_CER: f64 = 0.2;

/// Keeps `(reference, hypothesis)` pairs whose character error rate is at most `max_cer`.
///
/// Both sides are lowercased and reduced to their words before comparison,
/// so punctuation and spacing do not count as errors.
/// Pairs where either side has no words are rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentFilter {
    max_cer: f64,
}

impl AlignmentFilter {
    pub fn new(max_cer: f64) -> Self {
        Self { max_cer }
    }

    pub fn max_cer(&self) -> f64 {
        self.max_cer
    }

    /// Character error rate of `hypothesis` against `reference`, on normalized text.
    ///
    /// Returns [None] if the normalized reference is empty.
    pub fn cer(reference: &str, hypothesis: &str) -> Option<f64> {
        let reference = normalize(reference);
        let hypothesis = normalize(hypothesis);

        let reference: Vec<&str> = reference.graphemes(true).collect();
        let hypothesis: Vec<&str> = hypothesis.graphemes(true).collect();

        if reference.is_empty() {
            return None;
        }

        Some(levenshtein(&reference, &hypothesis) as f64 / reference.len() as f64)
    }
}

impl Default for AlignmentFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CER)
    }
}

impl Filter<(&str, &str)> for AlignmentFilter {
    fn detect(&self, (reference, hypothesis): (&str, &str)) -> bool {
        if normalize(hypothesis).is_empty() {
            return false;
        }
        match Self::cer(reference, hypothesis) {
            Some(cer) => cer <= self.max_cer,
            None => false,
        }
    }
}

/// lowercase, keep words only, single-space separated.
fn normalize(text: &str) -> String {
    text.unicode_words().map(str::to_lowercase).join(" ")
}

/// Edit distance (insertions, deletions, substitutions all cost 1).
fn levenshtein<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, x) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, y) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(x != y);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
