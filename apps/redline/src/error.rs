//! Error types
//!
//! Every asynchronous boundary in the engine converts failures into one of
//! these kinds. Nothing propagates as a panic into the rendering surface.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for review operations
pub type Result<T> = std::result::Result<T, ReviewError>;

/// Page geometry could not be determined
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeometryError {
    /// Page has not been rendered, or reported unusable dimensions
    #[error("Page {page_number} has no known pixel dimensions")]
    Indeterminate { page_number: u32 },
}

/// A single outline entry could not be resolved
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OutlineError {
    /// Named destination missing from the document
    #[error("Unresolved destination: {0}")]
    UnresolvedDestination(String),

    /// Page reference does not map to a page of the document
    #[error("Invalid page reference: {0}")]
    InvalidPageRef(String),

    /// Resolver failed for another reason
    #[error("Destination resolver error: {0}")]
    Resolver(String),
}

/// Persistence collaborator errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Annotation not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid annotation record: {0}")]
    InvalidRecord(String),
}

/// Session-level error surfaced to the UI shell
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Submit was requested without a draft
    #[error("No draft annotation to submit")]
    NoDraft,

    /// The persistence call exceeded its bound
    #[error("Saving the annotation timed out after {0:?}")]
    SaveTimeout(Duration),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ReviewError {
    /// Whether the user can retry the failed action
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReviewError::SaveTimeout(_) | ReviewError::Store(_))
    }
}
