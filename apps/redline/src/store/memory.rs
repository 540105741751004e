//! In-memory annotation store

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::AnnotationStore;
use crate::annotations::{Annotation, AnnotationId, AnnotationPatch, NewAnnotation};
use crate::error::StoreError;

/// Annotation store backed by a map, shared across clones
#[derive(Clone, Default)]
pub struct MemoryAnnotationStore {
    annotations: Arc<RwLock<HashMap<AnnotationId, Annotation>>>,
}

impl MemoryAnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed record, keeping its ID and timestamp
    pub async fn insert(&self, annotation: Annotation) {
        let mut annotations = self.annotations.write().await;
        annotations.insert(annotation.id, annotation);
    }

    pub async fn len(&self) -> usize {
        self.annotations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.annotations.read().await.is_empty()
    }
}

#[async_trait]
impl AnnotationStore for MemoryAnnotationStore {
    async fn create(&self, annotation: NewAnnotation) -> Result<Annotation, StoreError> {
        let annotation = annotation.into_annotation();
        self.insert(annotation.clone()).await;
        Ok(annotation)
    }

    async fn list(&self, document_id: &str) -> Result<Vec<Annotation>, StoreError> {
        let annotations = self.annotations.read().await;
        let mut found: Vec<Annotation> = annotations
            .values()
            .filter(|a| a.document_id == document_id)
            .cloned()
            .collect();
        found.sort_by_key(|a| a.recency_key());
        Ok(found)
    }

    async fn update(&self, id: AnnotationId, patch: AnnotationPatch) -> Result<(), StoreError> {
        let mut annotations = self.annotations.write().await;
        let annotation = annotations
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        patch.apply_to(annotation);
        Ok(())
    }

    async fn delete(&self, id: AnnotationId) -> Result<(), StoreError> {
        let mut annotations = self.annotations.write().await;
        annotations
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{AnnotationStatus, AnnotationType};
    use crate::geometry::NormalizedRect;

    fn new_annotation(document_id: &str) -> NewAnnotation {
        NewAnnotation {
            document_id: document_id.to_string(),
            position: NormalizedRect::new(1, 10.0, 10.0, 20.0, 5.0),
            highlighted_text: String::new(),
            comment_text: "check".to_string(),
            annotation_type: AnnotationType::Comment,
            status: AnnotationStatus::Proposed,
            section_label: None,
            author_id: "user-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_list_by_document() {
        let store = MemoryAnnotationStore::new();
        for _ in 0..3 {
            store.create(new_annotation("doc-a")).await.unwrap();
        }
        store.create(new_annotation("doc-b")).await.unwrap();

        assert_eq!(store.list("doc-a").await.unwrap().len(), 3);
        assert_eq!(store.list("doc-b").await.unwrap().len(), 1);
        assert_eq!(store.len().await, 4);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryAnnotationStore::new();
        let created = store.create(new_annotation("doc-a")).await.unwrap();

        store
            .update(created.id, AnnotationPatch::status(AnnotationStatus::Rejected))
            .await
            .unwrap();
        let listed = store.list("doc-a").await.unwrap();
        assert_eq!(listed[0].status, AnnotationStatus::Rejected);

        store.delete(created.id).await.unwrap();
        assert!(store.is_empty().await);
        assert!(matches!(
            store.delete(created.id).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
