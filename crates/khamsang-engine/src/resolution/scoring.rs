//! Text similarity between a target description and recognized text.

use khamsang_parser::comparison_key;

/// Shorter keys only count as contained through edit distance.
const MIN_CONTAINED_CHARS: usize = 3;

/// Similarity in `[0, 1]`, insensitive to case, spacing, Thai tone marks
/// and Latin diacritics.
pub fn similarity(description: &str, text: &str) -> f32 {
    similarity_of_keys(&comparison_key(description), &comparison_key(text))
}

pub(crate) fn similarity_of_keys(a: &str, b: &str) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    let (len_a, len_b) = (a.chars().count(), b.chars().count());
    let shorter = len_a.min(len_b);
    if shorter >= MIN_CONTAINED_CHARS && (a.contains(b) || b.contains(a)) {
        // sqrt of the coverage: a short key in a long line scores low
        let ratio = shorter as f32 / len_a.max(len_b) as f32;
        return ratio.sqrt();
    }
    strsim::normalized_levenshtein(a, b) as f32
}
