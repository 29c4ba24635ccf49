//! Errors surfaced by the engine façade.

use recommenders::Algorithm;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The requested strategy failed to fit and is disabled
    #[error("{0} model unavailable")]
    ModelUnavailable(Algorithm),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
