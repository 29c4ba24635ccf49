//! # Recommendation Orchestrator
//!
//! Holds the fitted state for one data snapshot and dispatches requests to
//! the selected strategy.
//!
//! ## Hybrid strategy
//! 1. Collect the movies the user has rated
//! 2. Collaborative candidates (200), absorbing any failure as "no candidates"
//! 3. Content candidates (200), same policy
//! 4. Both empty: fall back to popularity
//! 5. Rank-score each list, normalize, blend by weight
//! 6. Drop seen movies through the filter pipeline, keep the first k

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::{EngineConfig, HybridConfig};
use crate::error::EngineError;
use data_loader::{DataIndex, MovieId, PreprocessConfig, UserId};
use factorization::Factorizer;
use pipeline::filters::AlreadyWatchedFilter;
use pipeline::{blend_lists, normalize_scores, rank_scores, FilterPipeline};
use recommenders::user_context::build_user_context;
use recommenders::{
    collaborative, content, popularity, Algorithm, Candidate, CollaborativeModel, ContentModel,
    PopularityTable,
};

/// Candidates requested from each source before blending
pub const HYBRID_CANDIDATES: usize = 200;

/// Final recommendation returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecommendation {
    /// 1-based position in the list
    pub rank: usize,
    pub movie_id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    pub avg_rating: Option<f32>,
    pub rating_count: u32,
    pub algorithm: Algorithm,
}

/// Borrowed view of the fitted models the hybrid strategy draws on.
///
/// A `None` model is a disabled strategy.
#[derive(Debug, Clone, Copy)]
pub struct ModelSet<'a> {
    pub popularity: &'a PopularityTable,
    pub content: Option<&'a ContentModel>,
    pub collaborative: Option<&'a CollaborativeModel>,
}

/// Blend collaborative and content recommendations for a user.
///
/// Failures and empty results of either source are absorbed; with nothing
/// from both, the popularity ranking (minus seen movies) is returned. The
/// weights are used as given.
#[instrument(skip(data, models, config), fields(w_cf = config.w_cf, w_content = config.w_content))]
pub fn hybrid_recommend(
    user_id: UserId,
    data: &DataIndex,
    models: ModelSet<'_>,
    k: usize,
    config: &HybridConfig,
) -> Result<Vec<MovieId>> {
    let context = build_user_context(data, user_id, config.min_like);

    let cf_ids = match models.collaborative {
        Some(model) => collaborative::recommend(user_id, model, HYBRID_CANDIDATES, &context.seen)
            .unwrap_or_else(|err| {
                warn!(error = %format!("{err:#}"), "Collaborative candidates unavailable");
                Vec::new()
            }),
        None => Vec::new(),
    };

    let content_ids = match models.content {
        Some(model) => content::recommend(user_id, data, model, HYBRID_CANDIDATES, config.min_like)
            .unwrap_or_else(|err| {
                warn!(error = %format!("{err:#}"), "Content candidates unavailable");
                Vec::new()
            }),
        None => Vec::new(),
    };

    debug!(
        collaborative = cf_ids.len(),
        content = content_ids.len(),
        "Hybrid sources collected"
    );

    if cf_ids.is_empty() && content_ids.is_empty() {
        debug!("Both sources empty, falling back to popularity");
        return Ok(popularity::recommend(models.popularity, k, &context.seen));
    }

    let cf_scores = normalize_scores(&rank_scores(cf_ids.len()));
    let content_scores = normalize_scores(&rank_scores(content_ids.len()));

    let (merged_ids, merged_scores) = blend_lists(
        &cf_ids,
        &cf_scores,
        &content_ids,
        &content_scores,
        config.w_cf,
        config.w_content,
    );

    let candidates: Vec<Candidate> = merged_ids
        .into_iter()
        .zip(merged_scores)
        .map(|(movie_id, score)| Candidate::new(movie_id, Algorithm::Hybrid, score))
        .collect();

    let filtered = FilterPipeline::new()
        .add_filter(AlreadyWatchedFilter)
        .apply(candidates, &context)
        .context("Filtering hybrid candidates")?;

    Ok(filtered.into_iter().take(k).map(|c| c.movie_id).collect())
}

/// `data_index` without sparse users and movies. Unchanged when nothing is dropped.
fn serving_index(data_index: Arc<DataIndex>, preprocess: &PreprocessConfig) -> Result<Arc<DataIndex>> {
    let kept = preprocess.apply(data_index.ratings());
    if kept.len() == data_index.ratings().len() {
        return Ok(data_index);
    }

    info!(
        dropped = data_index.ratings().len() - kept.len(),
        kept = kept.len(),
        "Sparse interactions removed before fitting"
    );
    let filtered = DataIndex::from_records(data_index.movies().to_vec(), kept)
        .context("Indexing the filtered ratings")?;
    Ok(Arc::new(filtered))
}

/// Fitted state for one data snapshot.
///
/// Rebuild with `fit` whenever the ratings or the catalog change. Shareable
/// across threads.
#[derive(Debug)]
pub struct RecommendationOrchestrator {
    data_index: Arc<DataIndex>,
    config: EngineConfig,
    popularity: PopularityTable,
    content: Option<ContentModel>,
    collaborative: Option<CollaborativeModel>,
}

impl RecommendationOrchestrator {
    /// Fit every strategy on `data_index`.
    ///
    /// Users and movies below the `config.preprocess` thresholds are dropped
    /// first; the filtered index is the one requests are served from.
    /// Only an invalid config or a popularity failure is an error. A content
    /// or collaborative model that cannot be fitted is logged and left
    /// disabled.
    pub fn fit(
        data_index: Arc<DataIndex>,
        factorizer: &dyn Factorizer,
        config: EngineConfig,
    ) -> Result<Self> {
        let start = Instant::now();
        config.validate()?;

        let data_index = serving_index(data_index, &config.preprocess)?;

        let popularity = popularity::fit(data_index.ratings(), config.popularity.smoothing)
            .context("Fitting popularity table")?;

        let content = match content::fit(data_index.movies(), &config.content) {
            Ok(model) => Some(model),
            Err(err) => {
                warn!(error = %format!("{err:#}"), "Content model disabled");
                None
            }
        };

        let collaborative =
            match collaborative::fit(data_index.ratings(), factorizer, &config.collaborative) {
                Ok(model) => Some(model),
                Err(err) => {
                    warn!(error = %format!("{err:#}"), "Collaborative model disabled");
                    None
                }
            };

        let orchestrator = Self {
            data_index,
            config,
            popularity,
            content,
            collaborative,
        };

        info!(
            algorithms = ?orchestrator.available_algorithms(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Recommendation orchestrator ready"
        );
        Ok(orchestrator)
    }

    pub fn data_index(&self) -> &Arc<DataIndex> {
        &self.data_index
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn popularity(&self) -> &PopularityTable {
        &self.popularity
    }

    pub fn content(&self) -> Option<&ContentModel> {
        self.content.as_ref()
    }

    pub fn collaborative(&self) -> Option<&CollaborativeModel> {
        self.collaborative.as_ref()
    }

    pub fn models(&self) -> ModelSet<'_> {
        ModelSet {
            popularity: &self.popularity,
            content: self.content.as_ref(),
            collaborative: self.collaborative.as_ref(),
        }
    }

    /// Strategies that can serve requests. Popularity and Hybrid always can.
    pub fn available_algorithms(&self) -> Vec<Algorithm> {
        Algorithm::ALL
            .into_iter()
            .filter(|algorithm| match algorithm {
                Algorithm::ContentBased => self.content.is_some(),
                Algorithm::Collaborative => self.collaborative.is_some(),
                Algorithm::Popularity | Algorithm::Hybrid => true,
            })
            .collect()
    }

    /// Users that can be queried (everyone with at least one rating)
    pub fn valid_users(&self) -> Vec<UserId> {
        self.data_index.user_ids()
    }

    /// Top `k` movie ids for a user from the selected strategy.
    ///
    /// An empty list means no recommendation is possible for this user.
    /// Asking for a disabled strategy is an error.
    #[instrument(skip(self))]
    pub fn recommend_ids(&self, algorithm: Algorithm, user_id: UserId, k: usize) -> Result<Vec<MovieId>> {
        let min_like = self.config.hybrid.min_like;

        let ids = match algorithm {
            Algorithm::Popularity => {
                let context = build_user_context(&self.data_index, user_id, min_like);
                popularity::recommend(&self.popularity, k, &context.seen)
            }
            Algorithm::ContentBased => {
                let model = self
                    .content
                    .as_ref()
                    .ok_or(EngineError::ModelUnavailable(Algorithm::ContentBased))?;
                content::recommend(user_id, &self.data_index, model, k, min_like)?
            }
            Algorithm::Collaborative => {
                let model = self
                    .collaborative
                    .as_ref()
                    .ok_or(EngineError::ModelUnavailable(Algorithm::Collaborative))?;
                let context = build_user_context(&self.data_index, user_id, min_like);
                collaborative::recommend(user_id, model, k, &context.seen)?
            }
            Algorithm::Hybrid => {
                hybrid_recommend(user_id, &self.data_index, self.models(), k, &self.config.hybrid)?
            }
        };

        debug!(returned = ids.len(), "Recommendations ready");
        Ok(ids)
    }

    /// Recommendations with catalog details, ready for presentation.
    ///
    /// Movies missing from the catalog are skipped.
    pub fn get_recommendations(
        &self,
        algorithm: Algorithm,
        user_id: UserId,
        k: usize,
    ) -> Result<Vec<MovieRecommendation>> {
        let ids = self.recommend_ids(algorithm, user_id, k)?;
        Ok(self.describe(&ids, algorithm))
    }

    fn describe(&self, ids: &[MovieId], algorithm: Algorithm) -> Vec<MovieRecommendation> {
        ids.iter()
            .filter_map(|&movie_id| {
                let Some(movie) = self.data_index.get_movie(movie_id) else {
                    debug!(movie_id, "Skipping movie missing from the catalog");
                    return None;
                };
                let stats = self.data_index.get_movie_stats(movie_id);
                Some((movie, stats))
            })
            .enumerate()
            .map(|(position, (movie, stats))| MovieRecommendation {
                rank: position + 1,
                movie_id: movie.id,
                title: movie.title.clone(),
                genres: movie.genre_tags().map(str::to_string).collect(),
                avg_rating: stats.map(|s| s.avg_rating),
                rating_count: stats.map_or(0, |s| s.rating_count),
                algorithm,
            })
            .collect()
    }
}
