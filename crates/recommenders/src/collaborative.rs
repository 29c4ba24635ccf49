//! Collaborative Filter - latent factors over the interaction matrix
//!
//! ## Algorithm
//! 1. Map user and movie ids to dense indices (ascending id order)
//! 2. Build the user×movie CSR matrix, summing duplicate ratings
//! 3. Hand the matrix to a `Factorizer`
//! 4. At query time, over-fetch `k + |exclude|` items from the model and
//!    drop excluded ones until `k` remain
//!
//! Dense indices never leave this module.

use anyhow::{bail, Context, Result};
use data_loader::{MovieId, Rating, UserId};
use factorization::{FactorModel, FactorizationParams, Factorizer};
use serde::{Deserialize, Serialize};
use sprs::{CsMat, TriMat};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Collaborative model settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollaborativeConfig {
    pub factors: usize,
    pub regularization: f32,
    pub iterations: usize,
    pub seed: u64,
}

impl Default for CollaborativeConfig {
    fn default() -> Self {
        Self {
            factors: 48,
            regularization: 0.05,
            iterations: 12,
            seed: 42,
        }
    }
}

impl CollaborativeConfig {
    pub fn params(&self) -> FactorizationParams {
        FactorizationParams {
            factors: self.factors,
            regularization: self.regularization,
            iterations: self.iterations,
            seed: self.seed,
        }
    }
}

/// Bidirectional id ↔ dense index mapping
#[derive(Debug, Clone)]
pub struct IdMap<T> {
    ids: Vec<T>,
    positions: HashMap<T, usize>,
}

impl<T: Copy + Eq + std::hash::Hash> IdMap<T> {
    /// Map sorted, distinct ids to `0..ids.len()`
    fn from_sorted(ids: Vec<T>) -> Self {
        let positions = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        Self { ids, positions }
    }

    pub fn index_of(&self, id: T) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn id_at(&self, index: usize) -> Option<T> {
        self.ids.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Fitted factor model plus everything needed to query it by external id
pub struct CollaborativeModel {
    model: Box<dyn FactorModel>,
    interactions: CsMat<f32>,
    users: IdMap<UserId>,
    movies: IdMap<MovieId>,
}

impl fmt::Debug for CollaborativeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollaborativeModel")
            .field("users", &self.users.len())
            .field("movies", &self.movies.len())
            .field("nnz", &self.interactions.nnz())
            .field("factors", &self.model.factors())
            .finish()
    }
}

impl CollaborativeModel {
    pub fn interactions(&self) -> &CsMat<f32> {
        &self.interactions
    }

    pub fn users(&self) -> &IdMap<UserId> {
        &self.users
    }

    pub fn movies(&self) -> &IdMap<MovieId> {
        &self.movies
    }

    pub fn knows_user(&self, user_id: UserId) -> bool {
        self.users.index_of(user_id).is_some()
    }
}

/// Build the interaction matrix with ascending-id dense indices
pub fn build_interactions(ratings: &[Rating]) -> (CsMat<f32>, IdMap<UserId>, IdMap<MovieId>) {
    let user_ids: BTreeSet<UserId> = ratings.iter().map(|r| r.user_id).collect();
    let movie_ids: BTreeSet<MovieId> = ratings.iter().map(|r| r.movie_id).collect();

    let users = IdMap::from_sorted(user_ids.into_iter().collect());
    let movies = IdMap::from_sorted(movie_ids.into_iter().collect());

    let mut triplets = TriMat::new((users.len(), movies.len()));
    for rating in ratings {
        if let (Some(row), Some(col)) = (users.index_of(rating.user_id), movies.index_of(rating.movie_id)) {
            triplets.add_triplet(row, col, rating.rating);
        }
    }

    // Conversion sums duplicate (user, movie) entries
    (triplets.to_csr(), users, movies)
}

/// Fit the collaborative model.
///
/// Any factorizer failure comes back as an error; callers treat that as
/// "collaborative filtering disabled".
#[instrument(skip(ratings, factorizer), fields(ratings = ratings.len(), backend = factorizer.name()))]
pub fn fit(
    ratings: &[Rating],
    factorizer: &dyn Factorizer,
    config: &CollaborativeConfig,
) -> Result<CollaborativeModel> {
    if ratings.is_empty() {
        bail!("Cannot fit a collaborative model without ratings");
    }

    let start = Instant::now();
    let (interactions, users, movies) = build_interactions(ratings);

    let model = factorizer
        .fit(&interactions, &config.params())
        .with_context(|| format!("{} factorization failed", factorizer.name()))?;

    info!(
        users = users.len(),
        movies = movies.len(),
        nnz = interactions.nnz(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Collaborative model fitted"
    );

    Ok(CollaborativeModel {
        model,
        interactions,
        users,
        movies,
    })
}

/// Top `k` movies for a user, never returning anything in `exclude`.
///
/// A user the model has never seen gets an empty list.
#[instrument(skip(model, exclude), fields(excluded = exclude.len()))]
pub fn recommend(
    user_id: UserId,
    model: &CollaborativeModel,
    k: usize,
    exclude: &HashSet<MovieId>,
) -> Result<Vec<MovieId>> {
    let Some(user_index) = model.users.index_of(user_id) else {
        debug!("User unknown to the collaborative model");
        return Ok(Vec::new());
    };
    if k == 0 {
        return Ok(Vec::new());
    }

    let fetched = model
        .model
        .recommend(user_index, &model.interactions, k.saturating_add(exclude.len()))
        .with_context(|| format!("Scoring movies for user {}", user_id))?;

    let recommendations: Vec<MovieId> = fetched
        .into_iter()
        .filter_map(|(item, _score)| model.movies.id_at(item))
        .filter(|movie_id| !exclude.contains(movie_id))
        .take(k)
        .collect();

    debug!(returned = recommendations.len(), "Collaborative recommendations");
    Ok(recommendations)
}
