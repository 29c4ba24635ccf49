//! Offline evaluation with a leave-last-out split.
//!
//! Each user's last rating is held out, the orchestrator is fitted on the
//! rest, and the held-out movie is looked for in the user's top k.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::orchestrator::RecommendationOrchestrator;
use data_loader::preprocess::distinct_users;
use data_loader::{last_item_split, DataIndex, Movie, MovieId, PreprocessConfig, Rating, UserId};
use factorization::Factorizer;
use pipeline::{hit_rate_at_k, precision_at_k, recall_at_k};
use recommenders::Algorithm;

/// Mean top-k metrics over every held-out user
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub algorithm: Algorithm,
    pub k: usize,
    /// Users with a held-out rating
    pub users: usize,
    pub precision: f64,
    pub recall: f64,
    pub hit_rate: f64,
}

/// Filter, split, fit and score one algorithm.
///
/// Fails when the data cannot be indexed, when fitting fails, or when the
/// algorithm's model could not be fitted on the train part.
#[instrument(skip(movies, ratings, factorizer, config), fields(ratings = ratings.len()))]
pub fn evaluate(
    movies: &[Movie],
    ratings: &[Rating],
    factorizer: &dyn Factorizer,
    config: &EngineConfig,
    algorithm: Algorithm,
    k: usize,
) -> Result<EvaluationReport> {
    let start = Instant::now();

    let filtered = config.preprocess.apply(ratings);
    let (train, test) = last_item_split(&filtered);
    info!(
        users = distinct_users(&filtered).len(),
        train = train.len(),
        test = test.len(),
        "Leave-last-out split"
    );

    let index = DataIndex::from_records(movies.to_vec(), train).context("Indexing the train split")?;
    // Already filtered above; filtering the train split again would drop more
    let train_config = EngineConfig {
        preprocess: PreprocessConfig::keep_all(),
        ..*config
    };
    let orchestrator = RecommendationOrchestrator::fit(Arc::new(index), factorizer, train_config)
        .context("Fitting on the train split")?;

    if !orchestrator.available_algorithms().contains(&algorithm) {
        return Err(EngineError::ModelUnavailable(algorithm).into());
    }

    let mut held_out: HashMap<UserId, Vec<MovieId>> = HashMap::new();
    for rating in &test {
        held_out.entry(rating.user_id).or_default().push(rating.movie_id);
    }
    let mut users: Vec<(UserId, Vec<MovieId>)> = held_out.into_iter().collect();
    users.sort_unstable_by_key(|(user_id, _)| *user_id);

    let scores: Vec<(f64, f64, f64)> = users
        .par_iter()
        .map(|(user_id, truth)| {
            let recommended = orchestrator.recommend_ids(algorithm, *user_id, k)?;
            Ok((
                precision_at_k(&recommended, truth, k),
                recall_at_k(&recommended, truth, k),
                hit_rate_at_k(&recommended, truth, k),
            ))
        })
        .collect::<Result<_>>()?;

    let n = scores.len();
    let (precision, recall, hit_rate) = scores
        .iter()
        .fold((0.0, 0.0, 0.0), |acc, s| (acc.0 + s.0, acc.1 + s.1, acc.2 + s.2));
    let mean = |total: f64| if n == 0 { 0.0 } else { total / n as f64 };

    let report = EvaluationReport {
        algorithm,
        k,
        users: n,
        precision: mean(precision),
        recall: mean(recall),
        hit_rate: mean(hit_rate),
    };

    info!(
        precision = report.precision,
        recall = report.recall,
        hit_rate = report.hit_rate,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Evaluation finished"
    );
    Ok(report)
}
