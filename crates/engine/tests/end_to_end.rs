//! End-to-end tests: fit the orchestrator on small rating sets and query
//! every algorithm through the public API.

use std::collections::HashSet;
use std::sync::Arc;

use data_loader::{DataIndex, Movie, PreprocessConfig, Rating};
use engine::{evaluate, EngineConfig, EngineError, RecommendationOrchestrator};
use factorization::AlsFactorizer;
use recommenders::{popularity, Algorithm};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn small_catalog() -> (Vec<Movie>, Vec<Rating>) {
    let movies = vec![
        Movie::new(10, "A", "Action"),
        Movie::new(20, "B", "Comedy"),
        Movie::new(30, "C", "Action"),
    ];
    let ratings = vec![
        Rating::new(1, 10, 5.0),
        Rating::new(1, 20, 1.0),
        Rating::new(2, 10, 4.0),
        Rating::new(2, 30, 5.0),
    ];
    (movies, ratings)
}

fn fit_small(smoothing: f64) -> RecommendationOrchestrator {
    let (movies, ratings) = small_catalog();
    let index = DataIndex::from_records(movies, ratings).unwrap();

    let mut config = EngineConfig::default();
    config.preprocess = PreprocessConfig::keep_all();
    config.popularity.smoothing = smoothing;
    config.collaborative.factors = 2;

    RecommendationOrchestrator::fit(Arc::new(index), &AlsFactorizer::new(), config).unwrap()
}

#[test]
fn test_unsmoothed_popularity_orders_by_mean() {
    init_tracing();
    let orchestrator = fit_small(0.0);

    // User 3 has rated nothing
    let recs = orchestrator.recommend_ids(Algorithm::Popularity, 3, 2).unwrap();
    assert_eq!(recs, vec![30, 10]);

    let all = orchestrator.recommend_ids(Algorithm::Popularity, 3, 10).unwrap();
    assert_eq!(all, vec![30, 10, 20]);
}

#[test]
fn test_content_follows_shared_genre() {
    init_tracing();
    let orchestrator = fit_small(50.0);

    let recs = orchestrator.recommend_ids(Algorithm::ContentBased, 1, 10).unwrap();
    assert_eq!(recs, vec![30]);
}

#[test]
fn test_hybrid_for_unknown_user_is_popularity() {
    init_tracing();
    let orchestrator = fit_small(50.0);

    let hybrid = orchestrator.recommend_ids(Algorithm::Hybrid, 99, 3).unwrap();
    let expected = popularity::recommend(orchestrator.popularity(), 3, &HashSet::new());
    assert_eq!(hybrid, expected);
}

#[test]
fn test_hybrid_never_returns_rated_movies() {
    init_tracing();
    let orchestrator = fit_small(50.0);

    assert_eq!(orchestrator.recommend_ids(Algorithm::Hybrid, 1, 5).unwrap(), vec![30]);
    assert_eq!(orchestrator.recommend_ids(Algorithm::Hybrid, 2, 5).unwrap(), vec![20]);
}

#[test]
fn test_presentation_serializes() {
    init_tracing();
    let orchestrator = fit_small(0.0);

    let recs = orchestrator.get_recommendations(Algorithm::Popularity, 3, 1).unwrap();
    let json = serde_json::to_value(&recs).unwrap();

    assert_eq!(json[0]["rank"], 1);
    assert_eq!(json[0]["movie_id"], 30);
    assert_eq!(json[0]["title"], "C");
    assert_eq!(json[0]["genres"][0], "Action");
    assert_eq!(json[0]["algorithm"], "popularity");
}

#[test]
fn test_disabled_model_is_reported() {
    init_tracing();
    // No term appears in two titles, so the content model cannot be fitted
    let movies = vec![Movie::new(1, "Alpha", "Action"), Movie::new(2, "Beta", "Drama")];
    let ratings = vec![Rating::new(1, 1, 5.0), Rating::new(2, 2, 4.0)];
    let index = DataIndex::from_records(movies, ratings).unwrap();

    let config = EngineConfig {
        preprocess: PreprocessConfig::keep_all(),
        ..EngineConfig::default()
    };
    let orchestrator = RecommendationOrchestrator::fit(Arc::new(index), &AlsFactorizer::new(), config).unwrap();

    assert!(orchestrator.content().is_none());
    let err = orchestrator
        .recommend_ids(Algorithm::ContentBased, 1, 5)
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<EngineError>(),
        Some(&EngineError::ModelUnavailable(Algorithm::ContentBased))
    );

    // Hybrid absorbs the missing model
    assert!(orchestrator.recommend_ids(Algorithm::Hybrid, 1, 5).is_ok());
}

#[test]
fn test_evaluation_on_clustered_ratings() {
    init_tracing();
    let genres = ["Action|Sci-Fi", "Romance|Drama"];
    let movies: Vec<Movie> = (0..20)
        .map(|id| Movie::new(id, format!("Film {} Part {}", id % 4, id / 4), genres[(id % 2) as usize]))
        .collect();

    // Even users like even movies, odd users like odd movies
    let mut ratings = Vec::new();
    for user_id in 0..30u32 {
        for (ts, movie_id) in (0..20u32).filter(|m| m % 2 == user_id % 2).enumerate() {
            if (movie_id + user_id) % 3 != 0 {
                ratings.push(Rating::new(user_id, movie_id, 4.5).with_timestamp(ts as i64));
            }
        }
    }

    let mut config = EngineConfig::default();
    config.preprocess = PreprocessConfig {
        min_user_interactions: 3,
        min_item_interactions: 2,
    };
    config.collaborative.factors = 4;

    for algorithm in Algorithm::ALL {
        let report = evaluate(&movies, &ratings, &AlsFactorizer::new(), &config, algorithm, 5).unwrap();

        assert_eq!(report.users, 30);
        assert!((0.0..=1.0).contains(&report.hit_rate));
        assert!(report.precision <= report.hit_rate);
    }
}
