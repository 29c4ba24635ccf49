//! Error types for the data-loader crate.
//!
//! Records arrive already parsed; these errors describe records that
//! cannot be indexed because they break an integrity rule.

use thiserror::Error;

/// Errors that can occur while building a `DataIndex`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataLoadError {
    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// The same movie id appeared twice in the catalog
    #[error("Duplicate {entity} with id {id}")]
    DuplicateId { entity: String, id: u32 },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
