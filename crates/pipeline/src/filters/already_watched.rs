//! Filter to remove movies the user has already rated.
//!
//! This is the last step before presentation: nothing the user has seen is
//! ever recommended back to them.

use crate::traits::Filter;
use anyhow::Result;
use recommenders::{Candidate, UserContext};

/// Removes candidates that the user has already rated.
///
/// ## Algorithm
/// Uses the HashSet in UserContext.seen for O(1) lookups. Order is kept.
pub struct AlreadyWatchedFilter;

impl Filter for AlreadyWatchedFilter {
    fn name(&self) -> &str {
        "AlreadyWatchedFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &UserContext,
    ) -> Result<Vec<Candidate>> {
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| !context.has_seen(candidate.movie_id))
            .collect();
        Ok(filtered)
    }
}
