//! Top-k ranking metrics for offline evaluation.
//!
//! Only the first `k` recommendations count, and duplicates within them
//! count once.

use data_loader::MovieId;
use std::collections::HashSet;

fn top_k(recommended: &[MovieId], k: usize) -> HashSet<MovieId> {
    recommended.iter().take(k).copied().collect()
}

/// Share of the top-k recommendations that are relevant.
///
/// The denominator is `min(k, distinct recommendations)`, so a short list is
/// not penalised for its length. No recommendations scores 0.
pub fn precision_at_k(recommended: &[MovieId], ground_truth: &[MovieId], k: usize) -> f64 {
    let rec_k = top_k(recommended, k);
    if rec_k.is_empty() {
        return 0.0;
    }
    let truth: HashSet<MovieId> = ground_truth.iter().copied().collect();
    let hits = rec_k.intersection(&truth).count();
    hits as f64 / k.min(rec_k.len()) as f64
}

/// Share of the relevant movies found in the top k (0 with no relevant movies)
pub fn recall_at_k(recommended: &[MovieId], ground_truth: &[MovieId], k: usize) -> f64 {
    let truth: HashSet<MovieId> = ground_truth.iter().copied().collect();
    if truth.is_empty() {
        return 0.0;
    }
    let hits = top_k(recommended, k).intersection(&truth).count();
    hits as f64 / truth.len() as f64
}

/// 1.0 if any relevant movie is in the top k, else 0.0
pub fn hit_rate_at_k(recommended: &[MovieId], ground_truth: &[MovieId], k: usize) -> f64 {
    let rec_k = top_k(recommended, k);
    if ground_truth.iter().any(|id| rec_k.contains(id)) {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision() {
        assert_eq!(precision_at_k(&[1, 2, 3, 4], &[2, 4, 9], 4), 0.5);
        // Only the first two count
        assert_eq!(precision_at_k(&[1, 2, 3, 4], &[3, 4], 2), 0.0);
        // Short list divides by its own length
        assert_eq!(precision_at_k(&[5], &[5], 10), 1.0);
        assert_eq!(precision_at_k(&[], &[5], 10), 0.0);
    }

    #[test]
    fn test_recall() {
        assert_eq!(recall_at_k(&[1, 2, 3], &[3, 7], 3), 0.5);
        assert_eq!(recall_at_k(&[1, 2, 3], &[], 3), 0.0);
        assert_eq!(recall_at_k(&[1, 2, 3], &[3], 2), 0.0);
    }

    #[test]
    fn test_hit_rate() {
        assert_eq!(hit_rate_at_k(&[1, 2, 3], &[3], 3), 1.0);
        assert_eq!(hit_rate_at_k(&[1, 2, 3], &[3], 2), 0.0);
        assert_eq!(hit_rate_at_k(&[], &[3], 5), 0.0);
    }

    #[test]
    fn test_duplicates_count_once() {
        assert_eq!(precision_at_k(&[4, 4, 6], &[4], 3), 0.5);
    }
}
