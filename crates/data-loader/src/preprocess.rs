//! Rating-set preprocessing.
//!
//! - `filter_min_interactions`: drop sparse users, then sparse movies
//! - `last_item_split`: hold out each user's most recent rating for evaluation

use crate::types::{MovieId, Rating, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Thresholds for `filter_min_interactions`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub min_user_interactions: usize,
    pub min_item_interactions: usize,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            min_user_interactions: 3,
            min_item_interactions: 10,
        }
    }
}

impl PreprocessConfig {
    /// Thresholds that keep every rating
    pub fn keep_all() -> Self {
        Self {
            min_user_interactions: 0,
            min_item_interactions: 0,
        }
    }

    pub fn apply(&self, ratings: &[Rating]) -> Vec<Rating> {
        filter_min_interactions(
            ratings,
            self.min_user_interactions,
            self.min_item_interactions,
        )
    }
}

/// Keep users with at least `min_user` ratings, then movies with at least
/// `min_item` ratings among what remains.
///
/// A single pass of each filter: dropping movies can push a user back under
/// `min_user`, and that user is kept.
pub fn filter_min_interactions(ratings: &[Rating], min_user: usize, min_item: usize) -> Vec<Rating> {
    let mut user_counts: HashMap<UserId, usize> = HashMap::new();
    for rating in ratings {
        *user_counts.entry(rating.user_id).or_insert(0) += 1;
    }

    let after_users: Vec<Rating> = ratings
        .iter()
        .filter(|r| user_counts[&r.user_id] >= min_user)
        .copied()
        .collect();

    let mut item_counts: HashMap<MovieId, usize> = HashMap::new();
    for rating in &after_users {
        *item_counts.entry(rating.movie_id).or_insert(0) += 1;
    }

    let kept: Vec<Rating> = after_users
        .into_iter()
        .filter(|r| item_counts[&r.movie_id] >= min_item)
        .collect();

    debug!(
        input = ratings.len(),
        kept = kept.len(),
        min_user,
        min_item,
        "Filtered sparse interactions"
    );
    kept
}

/// Split ratings into (train, test) with each user's last rating in test.
///
/// Ratings are ordered by user, then by timestamp when every rating carries
/// one; otherwise each user's ratings keep their input order. Both halves
/// come back in that order.
pub fn last_item_split(ratings: &[Rating]) -> (Vec<Rating>, Vec<Rating>) {
    let mut ordered: Vec<Rating> = ratings.to_vec();
    let all_timestamped = ratings.iter().all(|r| r.timestamp.is_some());

    // Stable sorts keep input order for ties
    if all_timestamped {
        ordered.sort_by_key(|r| (r.user_id, r.timestamp));
    } else {
        ordered.sort_by_key(|r| r.user_id);
    }

    let mut train = Vec::with_capacity(ordered.len());
    let mut test = Vec::new();

    for (pos, rating) in ordered.iter().enumerate() {
        let is_last_for_user = ordered
            .get(pos + 1)
            .is_none_or(|next| next.user_id != rating.user_id);

        if is_last_for_user {
            test.push(*rating);
        } else {
            train.push(*rating);
        }
    }

    (train, test)
}

/// Distinct users present in a rating slice
pub fn distinct_users(ratings: &[Rating]) -> HashSet<UserId> {
    ratings.iter().map(|r| r.user_id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_all_keeps_single_ratings() {
        let ratings = vec![Rating::new(1, 10, 4.0), Rating::new(2, 20, 3.0)];
        assert_eq!(PreprocessConfig::keep_all().apply(&ratings), ratings);
        assert!(PreprocessConfig::default().apply(&ratings).is_empty());
    }

    #[test]
    fn test_filter_min_interactions_drops_sparse_users_then_items() {
        let mut ratings = Vec::new();
        // Users 1 and 2 rate movies 100 and 200; user 3 rates only movie 300
        for user_id in 1..=2 {
            ratings.push(Rating::new(user_id, 100, 4.0));
            ratings.push(Rating::new(user_id, 200, 3.0));
        }
        ratings.push(Rating::new(3, 300, 5.0));
        // Movie 400 rated once by user 1
        ratings.push(Rating::new(1, 400, 2.0));

        let kept = filter_min_interactions(&ratings, 2, 2);

        assert!(kept.iter().all(|r| r.user_id != 3));
        assert!(kept.iter().all(|r| r.movie_id != 400));
        assert_eq!(kept.len(), 4);
    }

    #[test]
    fn test_filter_keeps_everything_with_zero_thresholds() {
        let ratings = vec![Rating::new(1, 1, 4.0), Rating::new(2, 2, 3.0)];
        assert_eq!(filter_min_interactions(&ratings, 0, 0), ratings);
    }

    #[test]
    fn test_last_item_split_uses_timestamps() {
        let ratings = vec![
            Rating::new(1, 10, 4.0).with_timestamp(300),
            Rating::new(1, 20, 3.0).with_timestamp(100),
            Rating::new(2, 30, 5.0).with_timestamp(50),
            Rating::new(1, 40, 2.0).with_timestamp(200),
        ];

        let (train, test) = last_item_split(&ratings);

        assert_eq!(test.len(), 2);
        assert_eq!(test[0].movie_id, 10); // user 1's latest
        assert_eq!(test[1].movie_id, 30); // user 2's only rating

        let train_ids: Vec<MovieId> = train.iter().map(|r| r.movie_id).collect();
        assert_eq!(train_ids, vec![20, 40]);
    }

    #[test]
    fn test_last_item_split_without_timestamps_keeps_input_order() {
        let ratings = vec![
            Rating::new(2, 5, 4.0),
            Rating::new(1, 6, 3.0),
            Rating::new(2, 7, 2.0),
        ];

        let (train, test) = last_item_split(&ratings);

        assert_eq!(train, vec![Rating::new(2, 5, 4.0)]);
        assert_eq!(test, vec![Rating::new(1, 6, 3.0), Rating::new(2, 7, 2.0)]);
    }

    #[test]
    fn test_default_config_thresholds() {
        let config = PreprocessConfig::default();
        assert_eq!(config.min_user_interactions, 3);
        assert_eq!(config.min_item_interactions, 10);
    }
}
