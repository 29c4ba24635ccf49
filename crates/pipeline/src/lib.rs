//! Post-processing of recommendation candidates.
//!
//! This crate provides:
//! - `normalize_scores` to bring score lists onto `[0, 1]`
//! - `rank_scores` and `blend_lists` to merge two ranked lists by weight
//! - the Filter trait and FilterPipeline for the final exclusion pass
//! - top-k ranking metrics for offline evaluation
//!
//! ## Architecture
//! The hybrid strategy runs candidates through these stages:
//! 1. Each source list gets rank-based scores
//! 2. Scores are normalized per list
//! 3. The two lists are blended by weighted sum
//! 4. Filters remove anything the user has already rated
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{blend_lists, normalize_scores, rank_scores, FilterPipeline};
//! use pipeline::filters::AlreadyWatchedFilter;
//!
//! let cf_scores = normalize_scores(&rank_scores(cf_ids.len()));
//! let content_scores = normalize_scores(&rank_scores(content_ids.len()));
//! let (ids, scores) = blend_lists(&cf_ids, &cf_scores, &content_ids, &content_scores, 0.6, 0.4);
//!
//! let pipeline = FilterPipeline::new().add_filter(AlreadyWatchedFilter);
//! let filtered = pipeline.apply(candidates, &context)?;
//! ```

pub mod traits;
pub mod filters;
pub mod filter_pipeline;
pub mod normalize;
pub mod blend;
pub mod metrics;

// Re-export main types
pub use traits::Filter;
pub use filter_pipeline::FilterPipeline;
pub use normalize::normalize_scores;
pub use blend::{blend_lists, rank_scores};
pub use metrics::{hit_rate_at_k, precision_at_k, recall_at_k};
