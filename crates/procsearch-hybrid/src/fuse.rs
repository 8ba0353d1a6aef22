//! Score fusion.
//!
//! Keyword and semantic score vectors are normalized to [0, 1] independently
//! and blended with a single weight. An all-equal vector normalizes to all
//! zero: a signal with no spread carries no discriminative power and must not
//! contribute an arbitrary baseline. Results fusing to exactly 0 are treated
//! as "no match" and excluded rather than ranked last.

use procsearch_core::types::ScoredHit;

/// Min-max scaling into [0, 1]; all-equal input collapses to all zero.
pub fn min_max_normalize(scores: &[f32]) -> Vec<f32> {
    let Some(min) = scores.iter().copied().reduce(f32::min) else {
        return Vec::new();
    };
    let max = scores.iter().copied().fold(min, f32::max);
    if (max - min).abs() < f32::EPSILON {
        return vec![0.0; scores.len()];
    }
    scores.iter().map(|s| (s - min) / (max - min)).collect()
}

/// Blends normalized score vectors and returns the top `k` hits with dense
/// 1-based ranks. `alpha` weights the semantic side; ties order by corpus
/// index ascending.
pub fn fuse(keyword: &[f32], semantic: &[f32], alpha: f32, k: usize) -> Vec<ScoredHit> {
    debug_assert_eq!(keyword.len(), semantic.len());
    let keyword_norm = min_max_normalize(keyword);
    let semantic_norm = min_max_normalize(semantic);

    let mut hits: Vec<ScoredHit> = keyword_norm
        .iter()
        .zip(semantic_norm.iter())
        .enumerate()
        .map(|(index, (kw, sem))| ScoredHit {
            index,
            keyword_score: *kw,
            semantic_score: *sem,
            fused_score: alpha * sem + (1.0 - alpha) * kw,
            rank: 0,
        })
        .filter(|hit| hit.fused_score > 0.0)
        .collect();

    hits.sort_by(|a, b| {
        b.fused_score
            .partial_cmp(&a.fused_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.index.cmp(&b.index))
    });
    hits.truncate(k);
    for (i, hit) in hits.iter_mut().enumerate() {
        hit.rank = i + 1;
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_equal_scores_normalize_to_zero() {
        assert_eq!(min_max_normalize(&[2.5, 2.5, 2.5]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn normalization_spans_unit_interval() {
        let normalized = min_max_normalize(&[1.0, 3.0, 5.0]);
        assert_eq!(normalized, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn empty_vector_normalizes_empty() {
        assert!(min_max_normalize(&[]).is_empty());
    }

    #[test]
    fn fused_scores_stay_within_unit_interval() {
        let keyword = [0.0, 4.0, 2.0, 1.0];
        let semantic = [0.9, 0.1, 0.5, 0.3];
        for alpha in [0.0, 0.25, 0.6, 1.0] {
            for hit in fuse(&keyword, &semantic, alpha, 10) {
                assert!((0.0..=1.0).contains(&hit.fused_score), "alpha {alpha}: {hit:?}");
            }
        }
    }

    #[test]
    fn alpha_zero_reduces_to_keyword_order() {
        let keyword = [1.0, 5.0, 3.0];
        let semantic = [0.9, 0.1, 0.5];
        let hits = fuse(&keyword, &semantic, 0.0, 10);
        let order: Vec<usize> = hits.iter().map(|h| h.index).collect();
        // Index 0 normalizes to keyword 0 and is excluded as a zero fuse.
        assert_eq!(order, vec![1, 2]);
    }

    #[test]
    fn alpha_one_reduces_to_semantic_order() {
        let keyword = [1.0, 5.0, 3.0];
        let semantic = [0.9, 0.1, 0.5];
        let hits = fuse(&keyword, &semantic, 1.0, 10);
        let order: Vec<usize> = hits.iter().map(|h| h.index).collect();
        assert_eq!(order, vec![0, 2]);
    }

    #[test]
    fn zero_fused_results_are_excluded() {
        // Both vectors flat: everything normalizes to zero, nothing matches.
        let hits = fuse(&[1.0, 1.0], &[0.5, 0.5], 0.6, 10);
        assert!(hits.is_empty());
    }

    #[test]
    fn ranks_are_dense_and_one_based() {
        let keyword = [0.0, 4.0, 2.0, 1.0];
        let semantic = [0.0, 0.1, 0.5, 0.3];
        let hits = fuse(&keyword, &semantic, 0.6, 10);
        for (i, hit) in hits.iter().enumerate() {
            assert_eq!(hit.rank, i + 1);
        }
    }

    #[test]
    fn ties_break_by_corpus_index() {
        // Indices 1 and 2 fuse identically; the earlier index must rank first.
        let keyword = [0.0, 2.0, 2.0, 1.0];
        let semantic = [0.0, 0.4, 0.4, 0.1];
        let hits = fuse(&keyword, &semantic, 0.5, 10);
        assert_eq!(hits[0].index, 1);
        assert_eq!(hits[1].index, 2);
        assert!(hits[0].rank < hits[1].rank);
        assert!((hits[0].fused_score - hits[1].fused_score).abs() < f32::EPSILON);
    }

    #[test]
    fn top_k_truncates_after_ranking() {
        let keyword = [1.0, 5.0, 3.0, 4.0, 2.0];
        let semantic = [0.1, 0.9, 0.5, 0.7, 0.3];
        let hits = fuse(&keyword, &semantic, 0.6, 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].index, 1);
        assert_eq!(hits[0].rank, 1);
        assert_eq!(hits[1].rank, 2);
    }
}
