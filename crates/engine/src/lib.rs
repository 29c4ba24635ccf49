//! Hybrid movie recommendation engine.
//!
//! This crate fits every strategy on one data snapshot and serves
//! recommendations from it:
//! - **orchestrator**: fitted state, algorithm dispatch and the hybrid blend
//! - **config**: engine settings with serde defaults
//! - **evaluation**: leave-last-out offline evaluation
//!
//! ## Example Usage
//! ```ignore
//! use engine::{EngineConfig, RecommendationOrchestrator};
//! use factorization::AlsFactorizer;
//! use recommenders::Algorithm;
//!
//! let index = Arc::new(DataIndex::from_records(movies, ratings)?);
//! let orchestrator = RecommendationOrchestrator::fit(index, &AlsFactorizer::new(), EngineConfig::default())?;
//! let recs = orchestrator.get_recommendations(Algorithm::Hybrid, 42, 10)?;
//! ```

pub mod config;
pub mod error;
pub mod evaluation;
pub mod orchestrator;

pub use config::{EngineConfig, HybridConfig};
pub use error::EngineError;
pub use evaluation::{evaluate, EvaluationReport};
pub use orchestrator::{
    hybrid_recommend, ModelSet, MovieRecommendation, RecommendationOrchestrator, HYBRID_CANDIDATES,
};
