//! Shared types for the recommenders.

use anyhow::{bail, Error};
use data_loader::{MovieId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Which strategy produced (or should produce) a recommendation list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Bayesian-smoothed average rating
    Popularity,
    /// TF-IDF similarity to the user's liked movies
    ContentBased,
    /// Latent-factor model over the interaction matrix
    Collaborative,
    /// Weighted blend of Collaborative and ContentBased
    Hybrid,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::Popularity,
        Algorithm::ContentBased,
        Algorithm::Collaborative,
        Algorithm::Hybrid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Popularity => "popularity",
            Algorithm::ContentBased => "content_based",
            Algorithm::Collaborative => "collaborative",
            Algorithm::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "popularity" | "popular" => Ok(Algorithm::Popularity),
            "content_based" | "content" => Ok(Algorithm::ContentBased),
            "collaborative" | "als" | "cf" => Ok(Algorithm::Collaborative),
            "hybrid" => Ok(Algorithm::Hybrid),
            _ => bail!("Unknown algorithm '{}'", s),
        }
    }
}

/// A scored candidate movie.
///
/// Scores are only comparable between candidates from the same source.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub movie_id: MovieId,
    pub source: Algorithm,
    pub score: f32,
}

impl Candidate {
    pub fn new(movie_id: MovieId, source: Algorithm, score: f32) -> Self {
        Self {
            movie_id,
            source,
            score,
        }
    }
}

/// What the recommenders need to know about the querying user
#[derive(Debug, Clone, Default)]
pub struct UserContext {
    pub user_id: UserId,

    /// Every movie the user has rated, whatever the value
    pub seen: HashSet<MovieId>,

    /// Movies rated at or above the like threshold, in rating order
    pub liked: Vec<MovieId>,
}

impl UserContext {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            ..Default::default()
        }
    }

    pub fn has_seen(&self, movie_id: MovieId) -> bool {
        self.seen.contains(&movie_id)
    }

    /// Whether the user has no ratings at all
    pub fn is_cold(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_round_trips_through_display() {
        for algorithm in Algorithm::ALL {
            assert_eq!(algorithm.to_string().parse::<Algorithm>().unwrap(), algorithm);
        }
    }

    #[test]
    fn test_algorithm_aliases() {
        assert_eq!("Content-Based".parse::<Algorithm>().unwrap(), Algorithm::ContentBased);
        assert_eq!("ALS".parse::<Algorithm>().unwrap(), Algorithm::Collaborative);
        assert_eq!(" hybrid ".parse::<Algorithm>().unwrap(), Algorithm::Hybrid);
        assert!("random".parse::<Algorithm>().is_err());
    }

    #[test]
    fn test_user_context_defaults() {
        let context = UserContext::new(7);
        assert_eq!(context.user_id, 7);
        assert!(context.is_cold());
        assert!(context.liked.is_empty());
        assert!(!context.has_seen(1));
    }
}
