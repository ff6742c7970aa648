/// Minimum title similarity for a registry record to replace extracted metadata.
pub const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Normalized edit-distance ratio between two titles, in `[0, 1]`.
///
/// Identical non-empty strings score `1.0`. An empty side scores `0.0`, even
/// when both sides are empty, so a registry record without a title can never
/// pass the gate.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b)
}
