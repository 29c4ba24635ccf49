//! Latent-factor capability for collaborative filtering.
//!
//! Callers depend on two traits rather than on a concrete solver:
//! - `Factorizer` fits a user×item interaction matrix into a `FactorModel`
//! - `FactorModel` scores items for a user index
//!
//! `AlsFactorizer` is the in-crate implementation (implicit-feedback
//! alternating least squares). Any other backend can be plugged in behind
//! the same traits.

use sprs::CsMat;
use thiserror::Error;

pub mod als;

pub use als::{AlsFactorizer, AlsModel};

/// Errors that can occur while fitting or querying a factor model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FactorizationError {
    /// The backing solver cannot be used in this environment
    #[error("Factorization backend unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The interaction matrix cannot be factorized
    #[error("Invalid interaction matrix: {0}")]
    InvalidInput(String),

    #[error("Numerical failure: {0}")]
    NumericalFailure(String),

    #[error("Unknown user index {index} (model has {n_users} users)")]
    UnknownUser { index: usize, n_users: usize },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, FactorizationError>;

/// Hyperparameters shared by every factorizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorizationParams {
    /// Latent dimension
    pub factors: usize,
    /// L2 penalty on both factor matrices
    pub regularization: f32,
    pub iterations: usize,
    /// Seed for factor initialisation
    pub seed: u64,
}

impl Default for FactorizationParams {
    fn default() -> Self {
        Self {
            factors: 48,
            regularization: 0.05,
            iterations: 12,
            seed: 42,
        }
    }
}

impl FactorizationParams {
    pub fn validate(&self) -> Result<()> {
        if self.factors == 0 {
            return Err(FactorizationError::InvalidParameter {
                name: "factors",
                reason: "must be at least 1".into(),
            });
        }
        if self.iterations == 0 {
            return Err(FactorizationError::InvalidParameter {
                name: "iterations",
                reason: "must be at least 1".into(),
            });
        }
        if !self.regularization.is_finite() || self.regularization <= 0.0 {
            return Err(FactorizationError::InvalidParameter {
                name: "regularization",
                reason: format!("must be finite and positive, got {}", self.regularization),
            });
        }
        Ok(())
    }
}

/// A fitted latent-factor model.
///
/// Indices are the dense row/column positions of the matrix the model was
/// fitted on; mapping to external ids is the caller's job.
pub trait FactorModel: Send + Sync {
    /// Top `n` items for `user_index` as `(item_index, score)`, best first.
    ///
    /// Items with a stored entry in row `user_index` of `user_items` are
    /// never returned.
    fn recommend(
        &self,
        user_index: usize,
        user_items: &CsMat<f32>,
        n: usize,
    ) -> Result<Vec<(usize, f32)>>;

    fn n_users(&self) -> usize;

    fn n_items(&self) -> usize;

    fn factors(&self) -> usize;
}

/// Fits a user×item interaction matrix (CSR, rows = users)
pub trait Factorizer {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    fn fit(
        &self,
        interactions: &CsMat<f32>,
        params: &FactorizationParams,
    ) -> Result<Box<dyn FactorModel>>;
}
