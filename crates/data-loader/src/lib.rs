//! # Data Loader Crate
//!
//! This crate holds the rating set and movie catalog in memory.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Movie, Rating, DataIndex)
//! - **index**: Build indices and statistics from parsed records
//! - **preprocess**: Sparse-interaction filtering and last-item splitting
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{DataIndex, Movie, Rating};
//!
//! let movies = vec![Movie::new(1, "Toy Story (1995)", "Animation|Children|Comedy")];
//! let ratings = vec![Rating::new(7, 1, 4.5)];
//!
//! let index = DataIndex::from_records(movies, ratings)?;
//! let stats = index.get_movie_stats(1).unwrap();
//!
//! println!("Movie 1 has {} ratings", stats.rating_count);
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod index;
pub mod preprocess;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use preprocess::{filter_min_interactions, last_item_split, PreprocessConfig};
pub use types::{
    // Type aliases
    UserId,
    MovieId,
    // Core types
    Movie,
    Rating,
    DataIndex,
    MovieStats,
    // Constants
    GENRE_DELIMITER,
    MAX_RATING,
    MIN_RATING,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_index_creation() {
        let index = DataIndex::new();
        let (users, movies, ratings) = index.counts();

        assert_eq!(users, 0);
        assert_eq!(movies, 0);
        assert_eq!(ratings, 0);
    }

    #[test]
    fn test_insert_movie() {
        let mut index = DataIndex::new();

        let movie = Movie::new(1, "Toy Story (1995)", "Animation|Children|Comedy");
        index.insert_movie(movie).unwrap();

        let retrieved = index.get_movie(1).unwrap();
        assert_eq!(retrieved.id, 1);
        assert_eq!(
            retrieved.genre_tags().collect::<Vec<_>>(),
            vec!["Animation", "Children", "Comedy"]
        );
        assert_eq!(
            retrieved.content_text(),
            "Toy Story (1995) Animation Children Comedy"
        );
    }

    #[test]
    fn test_insert_rating() {
        let mut index = DataIndex::new();

        index.insert_rating(Rating::new(1, 1193, 5.0).with_timestamp(978300760));

        let user_ratings = index.get_user_ratings(1);
        assert_eq!(user_ratings.len(), 1);
        assert_eq!(user_ratings[0].rating, 5.0);
        assert_eq!(user_ratings[0].timestamp, Some(978300760));

        let movie_ratings = index.get_movie_ratings(1193);
        assert_eq!(movie_ratings.len(), 1);
        assert!(index.has_user(1));
    }

    #[test]
    fn test_empty_queries() {
        let index = DataIndex::new();

        // Querying non-existent data should return None or empty slices
        assert!(index.get_movie(999).is_none());
        assert!(index.get_movie_stats(999).is_none());
        assert!(index.get_user_ratings(999).is_empty());
        assert!(index.get_movie_ratings(999).is_empty());
        assert!(index.user_ids().is_empty());
    }

    #[test]
    fn test_empty_genres_yield_no_tags() {
        let movie = Movie::new(5, "Untitled", "");
        assert_eq!(movie.genre_tags().count(), 0);
    }
}
