use crate::{
    database::{db_structs::IdParseError, store::StoreError},
    model::rating_utils::RatingError
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessorError {
    /// Malformed or unknown identifiers. Raised before anything is written.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invariant violated: {0}")]
    InvariantViolation(#[from] RatingError),

    #[error(transparent)]
    Store(#[from] StoreError)
}

impl From<IdParseError> for ProcessorError {
    fn from(e: IdParseError) -> Self {
        ProcessorError::Validation(e.to_string())
    }
}
