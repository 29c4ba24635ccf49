//! Core domain types for rating data and the movie catalog.
//!
//! Records are handed to this crate already parsed. `DataIndex` owns them
//! and provides the lookups every recommender needs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// Externally stable identifier for a user
pub type UserId = u32;

/// Externally stable identifier for a movie
pub type MovieId = u32;

/// Delimiter between genre tags in `Movie::genres`
pub const GENRE_DELIMITER: char = '|';

/// Lowest accepted rating value (exclusive)
pub const MIN_RATING: f32 = 0.0;

/// Highest accepted rating value (inclusive)
pub const MAX_RATING: f32 = 5.0;

// =============================================================================
// Records
// =============================================================================

/// A single rating from a user for a movie.
///
/// Immutable once loaded. A user rates many movies and a movie is rated by
/// many users.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    /// Rating value in `(0.0, 5.0]`
    pub rating: f32,
    /// Unix timestamp when the rating was made, if the source recorded one
    pub timestamp: Option<i64>,
}

impl Rating {
    pub fn new(user_id: UserId, movie_id: MovieId, rating: f32) -> Self {
        Self {
            user_id,
            movie_id,
            rating,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    /// Genre tags joined by `GENRE_DELIMITER`, e.g. `"Animation|Children|Comedy"`
    pub genres: String,
}

impl Movie {
    pub fn new(id: MovieId, title: impl Into<String>, genres: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            genres: genres.into(),
        }
    }

    /// Iterate over the individual genre tags, skipping empty segments
    pub fn genre_tags(&self) -> impl Iterator<Item = &str> {
        self.genres
            .split(GENRE_DELIMITER)
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
    }

    /// Title and genre tags as one whitespace-separated document.
    ///
    /// This is the text the content model vectorizes.
    pub fn content_text(&self) -> String {
        format!("{} {}", self.title, self.genres.replace(GENRE_DELIMITER, " "))
    }
}

/// Aggregate rating statistics for a movie
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovieStats {
    pub avg_rating: f32,
    pub rating_count: u32,
}

// =============================================================================
// DataIndex - The Core In-Memory Store
// =============================================================================

/// Holds the catalog and the rating set together with lookup indices.
///
/// The catalog keeps its original order: the content model assigns one
/// feature row per movie in that order, and ties in similarity are broken
/// by it.
#[derive(Debug, Clone, Default)]
pub struct DataIndex {
    pub(crate) movies: Vec<Movie>,
    pub(crate) movie_positions: HashMap<MovieId, usize>,

    /// Every rating in load order
    pub(crate) ratings: Vec<Rating>,
    /// All ratings made by each user, in load order
    pub(crate) user_ratings: HashMap<UserId, Vec<Rating>>,
    /// All ratings received by each movie, in load order
    pub(crate) movie_ratings: HashMap<MovieId, Vec<Rating>>,

    pub(crate) movie_stats: HashMap<MovieId, MovieStats>,
}

impl DataIndex {
    /// Creates a new, empty DataIndex
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a movie by ID
    pub fn get_movie(&self, id: MovieId) -> Option<&Movie> {
        self.movie_positions.get(&id).map(|&pos| &self.movies[pos])
    }

    /// Position of a movie in catalog order
    pub fn movie_position(&self, id: MovieId) -> Option<usize> {
        self.movie_positions.get(&id).copied()
    }

    /// The full catalog in its original order
    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    /// Every rating in load order
    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    /// Get all ratings made by a user
    ///
    /// Returns an empty slice if the user has no ratings
    pub fn get_user_ratings(&self, user_id: UserId) -> &[Rating] {
        self.user_ratings
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get all ratings for a movie
    pub fn get_movie_ratings(&self, movie_id: MovieId) -> &[Rating] {
        self.movie_ratings
            .get(&movie_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get precomputed statistics for a movie
    pub fn get_movie_stats(&self, movie_id: MovieId) -> Option<&MovieStats> {
        self.movie_stats.get(&movie_id)
    }

    /// Every user with at least one rating, ascending
    pub fn user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.user_ratings.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Whether the user has rated anything
    pub fn has_user(&self, user_id: UserId) -> bool {
        self.user_ratings.contains_key(&user_id)
    }

    /// Insert a movie at the end of the catalog.
    ///
    /// Movie ids are unique within a catalog.
    pub fn insert_movie(&mut self, movie: Movie) -> crate::Result<()> {
        if self.movie_positions.contains_key(&movie.id) {
            return Err(crate::DataLoadError::DuplicateId {
                entity: "Movie".to_string(),
                id: movie.id,
            });
        }
        self.movie_positions.insert(movie.id, self.movies.len());
        self.movies.push(movie);
        Ok(())
    }

    /// Insert a rating and update indices
    pub fn insert_rating(&mut self, rating: Rating) {
        self.user_ratings
            .entry(rating.user_id)
            .or_default()
            .push(rating);

        self.movie_ratings
            .entry(rating.movie_id)
            .or_default()
            .push(rating);

        self.ratings.push(rating);
    }

    /// (users, movies, ratings) counts
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.user_ratings.len(), self.movies.len(), self.ratings.len())
    }
}
