//! Content Similarity Engine - TF-IDF over title and genre text
//!
//! ## Algorithm
//! 1. Vectorize every catalog movie's title + genre tags (unigrams and bigrams)
//! 2. Taste profile = mean vector of the movies the user liked
//! 3. Score every catalog movie by cosine similarity to the profile
//! 4. Rank descending (ties keep catalog order), skip everything the user rated
//!
//! A user with no liked movies gets an empty list, which tells the caller
//! to fall back to another strategy.

use crate::tfidf::{cosine_similarity, TfidfVectorizer, TfidfVocabulary};
use crate::user_context::build_user_context;
use anyhow::{bail, Context, Result};
use data_loader::{DataIndex, Movie, MovieId, UserId};
use serde::{Deserialize, Serialize};
use sprs::CsMat;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Content model settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Inclusive n-gram range
    pub ngram_range: (usize, usize),
    pub min_df: usize,
    pub max_features: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            ngram_range: (1, 2),
            min_df: 2,
            max_features: 30_000,
        }
    }
}

impl ContentConfig {
    pub fn vectorizer(&self) -> TfidfVectorizer {
        TfidfVectorizer::new()
            .with_ngram_range(self.ngram_range.0, self.ngram_range.1)
            .with_min_df(self.min_df)
            .with_max_features(self.max_features)
    }
}

/// One TF-IDF row per catalog movie, in catalog order
#[derive(Debug, Clone)]
pub struct ContentModel {
    vocabulary: TfidfVocabulary,
    features: CsMat<f64>,
    movie_ids: Vec<MovieId>,
    rows: HashMap<MovieId, usize>,
}

impl ContentModel {
    pub fn vocabulary(&self) -> &TfidfVocabulary {
        &self.vocabulary
    }

    pub fn features(&self) -> &CsMat<f64> {
        &self.features
    }

    /// Movie ids in row order
    pub fn movie_ids(&self) -> &[MovieId] {
        &self.movie_ids
    }

    pub fn row(&self, movie_id: MovieId) -> Option<usize> {
        self.rows.get(&movie_id).copied()
    }

    /// Whether `movies` is the catalog this model was fitted on
    pub fn matches_catalog(&self, movies: &[Movie]) -> bool {
        movies.len() == self.movie_ids.len()
            && movies.iter().zip(&self.movie_ids).all(|(m, &id)| m.id == id)
    }

    /// Mean of the feature rows of `movie_ids` (unknown ids skipped).
    ///
    /// `None` when none of the ids has a row.
    pub fn taste_profile(&self, movie_ids: &[MovieId]) -> Option<Vec<f64>> {
        let mut profile = vec![0.0; self.vocabulary.len()];
        let mut used = 0usize;

        for &movie_id in movie_ids {
            let Some(row) = self.row(movie_id) else {
                continue;
            };
            if let Some(vector) = self.features.outer_view(row) {
                for (column, &value) in vector.iter() {
                    profile[column] += value;
                }
            }
            used += 1;
        }

        if used == 0 {
            return None;
        }
        for value in &mut profile {
            *value /= used as f64;
        }
        Some(profile)
    }
}

/// Fit the content model on a catalog
#[instrument(skip(movies, config), fields(movies = movies.len()))]
pub fn fit(movies: &[Movie], config: &ContentConfig) -> Result<ContentModel> {
    let start = Instant::now();
    let documents: Vec<String> = movies.iter().map(Movie::content_text).collect();

    let (vocabulary, features) = config
        .vectorizer()
        .fit_transform(&documents)
        .context("Fitting TF-IDF on the movie catalog")?;

    let movie_ids: Vec<MovieId> = movies.iter().map(|m| m.id).collect();
    let rows = movie_ids
        .iter()
        .enumerate()
        .map(|(row, &id)| (id, row))
        .collect();

    info!(
        vocabulary = vocabulary.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Content model fitted"
    );

    Ok(ContentModel {
        vocabulary,
        features,
        movie_ids,
        rows,
    })
}

/// Top `k` catalog movies most similar to what the user liked.
///
/// Fails only when `data` holds a different catalog than the model was
/// fitted on.
#[instrument(skip(data, model))]
pub fn recommend(
    user_id: UserId,
    data: &DataIndex,
    model: &ContentModel,
    k: usize,
    min_like: f32,
) -> Result<Vec<MovieId>> {
    if !model.matches_catalog(data.movies()) {
        bail!(
            "Content model was fitted on a different catalog ({} rows, index has {} movies)",
            model.movie_ids.len(),
            data.movies().len()
        );
    }

    let context = build_user_context(data, user_id, min_like);
    if context.liked.is_empty() {
        debug!("No liked movies, nothing to compare against");
        return Ok(Vec::new());
    }

    let Some(profile) = model.taste_profile(&context.liked) else {
        debug!(liked = context.liked.len(), "No liked movie is in the catalog");
        return Ok(Vec::new());
    };

    let similarities = cosine_similarity(&profile, &model.features);

    // Stable sort keeps catalog order among equal scores
    let mut order: Vec<usize> = (0..similarities.len()).collect();
    order.sort_by(|&a, &b| similarities[b].total_cmp(&similarities[a]));

    let recommendations: Vec<MovieId> = order
        .into_iter()
        .map(|row| model.movie_ids[row])
        .filter(|movie_id| !context.seen.contains(movie_id) && !context.liked.contains(movie_id))
        .take(k)
        .collect();

    debug!(
        liked = context.liked.len(),
        seen = context.seen.len(),
        returned = recommendations.len(),
        "Content recommendations"
    );
    Ok(recommendations)
}
