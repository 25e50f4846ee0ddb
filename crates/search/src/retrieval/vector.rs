//! Cosine similarity scoring over stored record vectors

use lexdz_common::Record;
use std::cmp::Ordering;

/// Cosine similarity of two vectors
///
/// 0.0 when the lengths differ or either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    // f64 accumulators; f32 squares overflow or underflow at extreme magnitudes
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let sim = dot / (norm_a.sqrt() * norm_b.sqrt());
    if sim.is_finite() {
        sim as f32
    } else {
        0.0
    }
}

/// Ranks vectorized records against a query vector
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorScorer;

impl VectorScorer {
    /// Similarity of one record, clamped to [0, 1]
    ///
    /// `None` for records without a vector or with a different dimension.
    pub fn score(&self, query: &[f32], record: &Record) -> Option<f32> {
        let vector = record.vector.as_deref().filter(|v| !v.is_empty())?;
        if vector.len() != query.len() {
            return None;
        }
        Some(cosine_similarity(query, vector).clamp(0.0, 1.0))
    }

    /// `(index, score)` pairs in descending score order, ties in record order
    pub fn rank(&self, query: &[f32], records: &[Record]) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = records
            .iter()
            .enumerate()
            .filter_map(|(i, r)| self.score(query, r).map(|s| (i, s)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identity_and_zero() {
        let v = [0.3, -1.2, 4.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&v, &[0.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_cosine_extreme_magnitudes() {
        let large = [1e20f32, 1e20];
        let small = [1e-25f32, 1e-25];
        assert!((cosine_similarity(&large, &large) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&small, &small) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&large, &small) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_length_mismatch() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_negative_similarity_clamped() {
        let record = Record::new(1, "Art. 1", "x").with_vector(vec![-1.0, 0.0]);
        assert_eq!(VectorScorer.score(&[1.0, 0.0], &record), Some(0.0));
    }

    #[test]
    fn test_rank_skips_unusable_records() {
        let records = vec![
            Record::new(1, "Art. 1", "a").with_vector(vec![1.0, 0.0]),
            Record::new(2, "Art. 2", "b"),
            Record::new(3, "Art. 3", "c").with_vector(vec![1.0, 0.0, 0.0]),
            Record::new(4, "Art. 4", "d").with_vector(vec![0.6, 0.8]),
            Record::new(5, "Art. 5", "e").with_vector(vec![2.0, 0.0]),
        ];

        let ranked = VectorScorer.rank(&[1.0, 0.0], &records);
        let order: Vec<usize> = ranked.iter().map(|(i, _)| *i).collect();
        // equal scores keep record order
        assert_eq!(order, vec![0, 4, 3]);
        assert!((ranked[2].1 - 0.6).abs() < 1e-6);
    }
}
