//! Annotation persistence
//!
//! The engine only needs the four operations of [`AnnotationStore`]. Two
//! backends are provided: an in-memory store and a SQLite repository.

mod memory;
mod sqlite;

use async_trait::async_trait;

use crate::annotations::{Annotation, AnnotationId, AnnotationPatch, NewAnnotation};
use crate::error::StoreError;

pub use memory::MemoryAnnotationStore;
pub use sqlite::SqliteAnnotationStore;

/// Persistence collaborator for annotations
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    /// Persist a new annotation and return the stored record
    async fn create(&self, annotation: NewAnnotation) -> Result<Annotation, StoreError>;

    /// All annotations of a document, oldest first
    async fn list(&self, document_id: &str) -> Result<Vec<Annotation>, StoreError>;

    /// Apply a partial update
    async fn update(&self, id: AnnotationId, patch: AnnotationPatch) -> Result<(), StoreError>;

    /// Delete an annotation
    async fn delete(&self, id: AnnotationId) -> Result<(), StoreError>;
}
