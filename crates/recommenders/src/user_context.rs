//! Helper functions to build UserContext from DataIndex
//!
//! Gathers the user's history once so the recommenders don't query the
//! index repeatedly.

use crate::types::UserContext;
use data_loader::{DataIndex, UserId};

/// Build a UserContext from DataIndex for a given user
///
/// - `seen`: every movie the user rated
/// - `liked`: movies rated `>= min_like`, in rating order, without duplicates
///
/// A user with no ratings gets an empty context. That is the "insufficient
/// signal" case and not an error.
pub fn build_user_context(data_index: &DataIndex, user_id: UserId, min_like: f32) -> UserContext {
    let mut context = UserContext::new(user_id);

    for rating in data_index.get_user_ratings(user_id) {
        context.seen.insert(rating.movie_id);

        if rating.rating >= min_like && !context.liked.contains(&rating.movie_id) {
            context.liked.push(rating.movie_id);
        }
    }

    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Movie, Rating};

    fn create_test_index() -> DataIndex {
        let movies = vec![
            Movie::new(1, "Action Movie (2000)", "Action|Adventure"),
            Movie::new(2, "Drama Movie (1995)", "Drama"),
            Movie::new(3, "Action Movie 2 (2005)", "Action|Sci-Fi"),
        ];
        let ratings = vec![
            Rating::new(1, 1, 5.0).with_timestamp(1000000),
            Rating::new(1, 2, 3.0).with_timestamp(1000001),
            Rating::new(1, 3, 4.5).with_timestamp(1000002),
        ];
        DataIndex::from_records(movies, ratings).unwrap()
    }

    #[test]
    fn test_build_user_context_basic() {
        let index = create_test_index();
        let context = build_user_context(&index, 1, 4.0);

        assert_eq!(context.user_id, 1);
        assert_eq!(context.seen.len(), 3);
        assert!(context.has_seen(1));
        assert!(context.has_seen(2));
        assert!(context.has_seen(3));
    }

    #[test]
    fn test_build_user_context_liked() {
        let index = create_test_index();
        let context = build_user_context(&index, 1, 4.0);

        // Movies 1 (5.0) and 3 (4.5) are liked, in rating order
        assert_eq!(context.liked, vec![1, 3]);

        let strict = build_user_context(&index, 1, 5.0);
        assert_eq!(strict.liked, vec![1]);
    }

    #[test]
    fn test_user_with_no_ratings() {
        let index = create_test_index();
        let context = build_user_context(&index, 999, 4.0);

        assert!(context.is_cold());
        assert!(context.liked.is_empty());
    }
}
