//! DataIndex building and indexing logic.
//!
//! Builds the DataIndex from already-parsed records:
//! - Insert the catalog in order (rejecting duplicate ids)
//! - Insert ratings and populate per-user / per-movie indices
//! - Compute aggregate statistics (movie stats)
//! - Validate rating values

use crate::error::{DataLoadError, Result};
use crate::types::*;
use rayon::prelude::*;
use tracing::info;

impl DataIndex {
    /// Build an index from a catalog and a rating set.
    ///
    /// Steps:
    /// 1. Insert movies in catalog order
    /// 2. Insert ratings
    /// 3. Compute movie statistics
    /// 4. Validate data integrity
    ///
    /// Ratings for movies that are missing from the catalog are kept: the
    /// two sources are independent and the collaborative and popularity
    /// models work from ratings alone.
    pub fn from_records(movies: Vec<Movie>, ratings: Vec<Rating>) -> Result<Self> {
        let mut index = DataIndex::new();

        for movie in movies {
            index.insert_movie(movie)?;
        }

        for rating in ratings {
            index.insert_rating(rating);
        }

        index.compute_movie_stats();
        index.validate()?;

        let (users, movies, ratings) = index.counts();
        info!(users, movies, ratings, "DataIndex built and validated");
        Ok(index)
    }

    /// Compute average rating and rating count for every rated movie
    pub fn compute_movie_stats(&mut self) {
        self.movie_stats = self
            .movie_ratings
            .par_iter()
            .map(|(&movie_id, ratings)| {
                let rating_count = ratings.len() as u32;
                let avg_rating = if rating_count > 0 {
                    let total: f32 = ratings.iter().map(|r| r.rating).sum();
                    total / rating_count as f32
                } else {
                    0.0
                };

                (
                    movie_id,
                    MovieStats {
                        avg_rating,
                        rating_count,
                    },
                )
            })
            .collect();
    }

    /// Validate data integrity
    ///
    /// Every rating value must be finite and within `(MIN_RATING, MAX_RATING]`.
    pub fn validate(&self) -> Result<()> {
        for rating in &self.ratings {
            validate_rating_value(rating.rating)?;
        }
        Ok(())
    }
}

fn validate_rating_value(value: f32) -> Result<()> {
    if !value.is_finite() || value <= MIN_RATING || value > MAX_RATING {
        return Err(DataLoadError::InvalidValue {
            field: "rating".to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}
