//! Blending two ranked lists into one.

use data_loader::MovieId;
use std::collections::HashMap;

/// Synthetic descending scores for a ranked list of length `n`.
///
/// The i-th item (0-based) gets `n - i`, so only relative order matters.
pub fn rank_scores(n: usize) -> Vec<f32> {
    (1..=n).rev().map(|rank| rank as f32).collect()
}

/// Merge two scored lists by weighted sum.
///
/// A movie missing from one list gets nothing from it. The result is sorted
/// by merged score, highest first; equal scores keep the order in which the
/// movies first appeared (list 1, then list 2). Scores beyond the shorter of
/// each `ids`/`scores` pair are ignored.
pub fn blend_lists(
    ids1: &[MovieId],
    scores1: &[f32],
    ids2: &[MovieId],
    scores2: &[f32],
    w1: f32,
    w2: f32,
) -> (Vec<MovieId>, Vec<f32>) {
    let mut order: Vec<MovieId> = Vec::new();
    let mut merged: HashMap<MovieId, f32> = HashMap::new();

    let weighted = ids1
        .iter()
        .zip(scores1)
        .map(|(&id, &score)| (id, w1 * score))
        .chain(ids2.iter().zip(scores2).map(|(&id, &score)| (id, w2 * score)));

    for (movie_id, contribution) in weighted {
        merged
            .entry(movie_id)
            .and_modify(|total| *total += contribution)
            .or_insert_with(|| {
                order.push(movie_id);
                contribution
            });
    }

    let mut ranked: Vec<(MovieId, f32)> = order
        .into_iter()
        .map(|movie_id| (movie_id, merged[&movie_id]))
        .collect();

    // Stable sort keeps first-appearance order for ties
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    ranked.into_iter().unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_scores() {
        assert_eq!(rank_scores(3), vec![3.0, 2.0, 1.0]);
        assert!(rank_scores(0).is_empty());
    }

    #[test]
    fn test_single_list_item_gets_weighted_score() {
        let (ids, scores) = blend_lists(&[1, 2], &[1.0, 0.5], &[3], &[1.0], 0.6, 0.4);

        let position = ids.iter().position(|&id| id == 2).unwrap();
        assert!((scores[position] - 0.3).abs() < 1e-6);

        let position = ids.iter().position(|&id| id == 3).unwrap();
        assert!((scores[position] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_shared_items_accumulate() {
        let (ids, scores) = blend_lists(&[1, 2], &[1.0, 0.0], &[2, 3], &[1.0, 0.0], 0.5, 0.5);

        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(scores, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_ties_keep_first_appearance() {
        let (ids, _) = blend_lists(&[7, 5], &[1.0, 1.0], &[9, 4], &[1.0, 1.0], 1.0, 1.0);
        assert_eq!(ids, vec![7, 5, 9, 4]);
    }

    #[test]
    fn test_sorted_descending() {
        let (ids, scores) = blend_lists(&[1, 2, 3], &[0.1, 0.9, 0.5], &[4], &[2.0], 1.0, 0.25);

        assert_eq!(ids, vec![2, 3, 4, 1]);
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_empty_lists() {
        let (ids, scores) = blend_lists(&[], &[], &[], &[], 0.6, 0.4);
        assert!(ids.is_empty());
        assert!(scores.is_empty());
    }
}
