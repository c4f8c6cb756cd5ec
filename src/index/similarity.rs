//! Cosine scoring and top-k ranking.

use std::cmp::Ordering;

use super::types::{SearchHit, VectorEntry};

/// Cosine similarity `dot(a, b) / (|a| * |b|)`.
///
/// Returns `0.0` when either vector has zero magnitude or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    if score.is_finite() {
        score.clamp(-1.0, 1.0) as f32
    } else {
        0.0
    }
}

/// Score every entry against `query` and keep the best `top_k`.
///
/// Ordering is by descending score, ties broken by ascending page number. A `top_k` of zero is
/// treated as one.
pub fn rank(entries: &[VectorEntry], query: &[f32], top_k: usize) -> Vec<SearchHit> {
    let mut scored: Vec<(f32, &VectorEntry)> = entries
        .iter()
        .map(|entry| (cosine_similarity(query, &entry.embedding), entry))
        .collect();

    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.1.page_number.cmp(&b.1.page_number))
    });

    scored
        .into_iter()
        .take(top_k.max(1))
        .map(|(score, entry)| SearchHit {
            score,
            entry: entry.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(page_number: u32, embedding: Vec<f32>) -> VectorEntry {
        VectorEntry {
            embedding,
            page_number,
            text: format!("page {page_number}"),
        }
    }

    #[test]
    fn identical_vectors_score_one() {
        let v = [0.3, -1.2, 4.5, 0.01];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn similarity_is_symmetric_and_bounded() {
        let samples: [&[f32]; 4] = [
            &[1.0, 2.0, 3.0],
            &[-3.0, 0.5, 2.0],
            &[1e-3, -7.0, 0.0],
            &[100.0, 100.0, -100.0],
        ];
        for a in samples {
            for b in samples {
                let ab = cosine_similarity(a, b);
                let ba = cosine_similarity(b, a);
                assert_eq!(ab, ba);
                assert!((-1.0..=1.0).contains(&ab), "score {ab} out of bounds");
            }
        }
    }

    #[test]
    fn opposite_and_orthogonal_vectors() {
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn zero_magnitude_and_mismatched_lengths_score_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 1.0], &[0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn rank_orders_by_score_then_page() {
        let entries = vec![
            entry(1, vec![0.0, 1.0]),
            entry(2, vec![1.0, 0.0]),
            entry(3, vec![1.0, 0.0]),
            entry(4, vec![1.0, 1.0]),
        ];
        let hits = rank(&entries, &[1.0, 0.0], 10);
        let pages: Vec<u32> = hits.iter().map(|hit| hit.entry.page_number).collect();
        assert_eq!(pages, vec![2, 3, 4, 1]);
        assert!(hits.windows(2).all(|pair| pair[0].score >= pair[1].score));
    }

    #[test]
    fn rank_respects_top_k_and_minimum_of_one() {
        let entries: Vec<VectorEntry> = (1..=6).map(|page| entry(page, vec![1.0, page as f32])).collect();
        assert_eq!(rank(&entries, &[1.0, 1.0], 3).len(), 3);
        assert_eq!(rank(&entries, &[1.0, 1.0], 0).len(), 1);
        assert_eq!(rank(&entries, &[1.0, 1.0], 50).len(), 6);
        assert!(rank(&[], &[1.0, 1.0], 5).is_empty());
    }
}
