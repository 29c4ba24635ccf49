//! Popularity Scorer - Bayesian-smoothed average rating
//!
//! ## Algorithm
//! 1. Aggregate mean rating and rating count per movie
//! 2. Global mean = mean of the per-movie means
//! 3. score = count/(count+m) * mean + m/(count+m) * global_mean
//! 4. Sort by score descending, ties by movie id
//!
//! The smoothing weight `m` pulls movies with few ratings toward the global
//! mean, so one 5-star rating does not outrank hundreds of consistent 4.5s.

use anyhow::{bail, Result};
use data_loader::{MovieId, Rating};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument};

/// Popularity scorer settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopularityConfig {
    /// Smoothing weight `m` (pseudo-count of global-mean ratings)
    pub smoothing: f64,
}

impl Default for PopularityConfig {
    fn default() -> Self {
        Self { smoothing: 50.0 }
    }
}

/// One row of the popularity table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopularityEntry {
    pub movie_id: MovieId,
    pub score: f64,
    pub count: u32,
    pub mean: f64,
}

/// Every rated movie, best first. Read-only once fitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopularityTable {
    entries: Vec<PopularityEntry>,
    global_mean: f64,
}

impl PopularityTable {
    pub fn entries(&self) -> &[PopularityEntry] {
        &self.entries
    }

    pub fn global_mean(&self) -> f64 {
        self.global_mean
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, movie_id: MovieId) -> Option<&PopularityEntry> {
        self.entries.iter().find(|e| e.movie_id == movie_id)
    }
}

/// Shrink `mean` (over `count` ratings) toward `global_mean` with weight `m`.
///
/// With no evidence at all (`count + m == 0`) this is the global mean.
pub fn bayesian_average(mean: f64, count: u32, global_mean: f64, m: f64) -> f64 {
    let count = f64::from(count);
    let total = count + m;
    if total <= 0.0 {
        return global_mean;
    }
    (count / total) * mean + (m / total) * global_mean
}

/// Build the popularity table from a rating set
#[instrument(skip(ratings), fields(ratings = ratings.len()))]
pub fn fit(ratings: &[Rating], smoothing: f64) -> Result<PopularityTable> {
    if !smoothing.is_finite() || smoothing < 0.0 {
        bail!("Popularity smoothing must be finite and non-negative, got {}", smoothing);
    }

    let mut totals: HashMap<MovieId, (f64, u32)> = HashMap::new();
    for rating in ratings {
        let entry = totals.entry(rating.movie_id).or_insert((0.0, 0));
        entry.0 += f64::from(rating.rating);
        entry.1 += 1;
    }

    let mut means: Vec<(MovieId, f64, u32)> = totals
        .into_iter()
        .map(|(movie_id, (sum, count))| (movie_id, sum / f64::from(count), count))
        .collect();
    // Fixed summation order keeps the global mean bit-identical across runs
    means.sort_unstable_by_key(|(movie_id, _, _)| *movie_id);

    let global_mean = if means.is_empty() {
        0.0
    } else {
        means.iter().map(|(_, mean, _)| mean).sum::<f64>() / means.len() as f64
    };

    let mut entries: Vec<PopularityEntry> = means
        .into_iter()
        .map(|(movie_id, mean, count)| PopularityEntry {
            movie_id,
            score: bayesian_average(mean, count, global_mean, smoothing),
            count,
            mean,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.movie_id.cmp(&b.movie_id))
    });

    info!(
        movies = entries.len(),
        global_mean,
        smoothing,
        "Popularity table fitted"
    );

    Ok(PopularityTable {
        entries,
        global_mean,
    })
}

/// Top `k` movies by score, skipping `exclude`.
///
/// Returns fewer than `k` ids when the table runs out.
pub fn recommend(table: &PopularityTable, k: usize, exclude: &HashSet<MovieId>) -> Vec<MovieId> {
    let recommendations: Vec<MovieId> = table
        .entries
        .iter()
        .filter(|entry| !exclude.contains(&entry.movie_id))
        .take(k)
        .map(|entry| entry.movie_id)
        .collect();

    debug!(
        requested = k,
        excluded = exclude.len(),
        returned = recommendations.len(),
        "Popularity recommendations"
    );
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ratings() -> Vec<Rating> {
        vec![
            Rating::new(1, 10, 5.0),
            Rating::new(1, 20, 1.0),
            Rating::new(2, 10, 4.0),
            Rating::new(2, 30, 5.0),
        ]
    }

    #[test]
    fn test_zero_smoothing_orders_by_raw_mean() {
        let table = fit(&sample_ratings(), 0.0).unwrap();

        let ids: Vec<MovieId> = table.entries().iter().map(|e| e.movie_id).collect();
        assert_eq!(ids, vec![30, 10, 20]);
        assert_eq!(recommend(&table, 2, &HashSet::new()), vec![30, 10]);
    }

    #[test]
    fn test_global_mean_is_mean_of_item_means() {
        let table = fit(&sample_ratings(), 50.0).unwrap();
        // (4.5 + 1.0 + 5.0) / 3
        assert!((table.global_mean() - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_global_mean_is_bit_identical_across_fits() {
        let ratings: Vec<Rating> = (0..500u32)
            .map(|movie_id| Rating::new(movie_id % 7, movie_id, 0.1 + (movie_id % 49) as f32 * 0.1))
            .collect();

        let mut sorted_means: Vec<(MovieId, f64)> =
            ratings.iter().map(|r| (r.movie_id, f64::from(r.rating))).collect();
        sorted_means.sort_unstable_by_key(|(movie_id, _)| *movie_id);
        let expected = sorted_means.iter().map(|(_, mean)| mean).sum::<f64>() / sorted_means.len() as f64;

        for _ in 0..10 {
            let table = fit(&ratings, 50.0).unwrap();
            assert_eq!(table.global_mean().to_bits(), expected.to_bits());
        }
    }

    #[test]
    fn test_no_evidence_scores_global_mean() {
        assert_eq!(bayesian_average(5.0, 0, 3.2, 25.0), 3.2);
        assert_eq!(bayesian_average(5.0, 0, 3.2, 0.0), 3.2);
    }

    #[test]
    fn test_many_ratings_approach_item_mean() {
        let few = bayesian_average(5.0, 10, 3.0, 50.0);
        let many = bayesian_average(5.0, 100_000, 3.0, 50.0);

        assert!(few < many);
        assert!((many - 5.0).abs() < 1e-2);
    }

    #[test]
    fn test_smoothing_demotes_single_rating() {
        let mut ratings = vec![Rating::new(1, 1, 5.0)];
        for user_id in 1..=200 {
            ratings.push(Rating::new(user_id, 2, 4.5));
        }
        for user_id in 1..=300 {
            ratings.push(Rating::new(user_id, 3, 2.0));
        }

        let table = fit(&ratings, 50.0).unwrap();
        assert_eq!(table.entries()[0].movie_id, 2);
    }

    #[test]
    fn test_recommend_respects_exclusions_and_k() {
        let table = fit(&sample_ratings(), 10.0).unwrap();
        let exclude: HashSet<MovieId> = [30].into_iter().collect();

        let recs = recommend(&table, 5, &exclude);
        assert!(!recs.contains(&30));
        assert_eq!(recs.len(), 2);

        assert!(recommend(&table, 0, &HashSet::new()).is_empty());
    }

    #[test]
    fn test_ties_break_by_movie_id() {
        let ratings = vec![
            Rating::new(1, 9, 4.0),
            Rating::new(1, 3, 4.0),
            Rating::new(1, 5, 4.0),
        ];
        let table = fit(&ratings, 5.0).unwrap();
        assert_eq!(recommend(&table, 3, &HashSet::new()), vec![3, 5, 9]);
    }

    #[test]
    fn test_empty_ratings() {
        let table = fit(&[], 50.0).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.global_mean(), 0.0);
        assert!(recommend(&table, 10, &HashSet::new()).is_empty());
    }

    #[test]
    fn test_rejects_negative_smoothing() {
        assert!(fit(&sample_ratings(), -1.0).is_err());
        assert!(fit(&sample_ratings(), f64::NAN).is_err());
    }
}
