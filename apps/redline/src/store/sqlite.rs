//! SQLite storage for annotations
//!
//! Positions are stored as their JSON text, the one on-disk format the engine
//! must keep compatible across renderer changes.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::AnnotationStore;
use crate::annotations::{
    Annotation, AnnotationId, AnnotationPatch, AnnotationStatus, AnnotationType, NewAnnotation,
};
use crate::error::StoreError;
use crate::geometry::NormalizedRect;

/// Repository for annotation persistence
#[derive(Clone)]
pub struct SqliteAnnotationStore {
    pool: SqlitePool,
}

impl SqliteAnnotationStore {
    /// Wrap an existing pool; call [`init`](Self::init) before use
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `url` and initialize the schema
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // Every connection to an in-memory database is a separate database
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self::new(pool);
        store.init().await?;
        tracing::info!(url, "Annotation store ready");
        Ok(store)
    }

    /// Initialize the annotations table
    pub async fn init(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS review_annotations (
                id TEXT PRIMARY KEY,
                document_id TEXT NOT NULL,
                page_number INTEGER NOT NULL,
                position_json TEXT NOT NULL,
                highlighted_text TEXT NOT NULL,
                comment_text TEXT NOT NULL,
                annotation_type TEXT NOT NULL,
                status TEXT NOT NULL,
                section_label TEXT,
                author_id TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_review_annotations_document
                ON review_annotations(document_id);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get an annotation by ID
    pub async fn get(&self, id: AnnotationId) -> Result<Option<Annotation>, StoreError> {
        let row = sqlx::query_as::<_, AnnotationRow>(
            r#"
            SELECT id, document_id, page_number, position_json, highlighted_text,
                   comment_text, annotation_type, status, section_label,
                   author_id, created_at
            FROM review_annotations
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_annotation()).transpose()
    }

    async fn insert(&self, annotation: &Annotation) -> Result<(), StoreError> {
        let position_json = serde_json::to_string(&annotation.position)?;

        sqlx::query(
            r#"
            INSERT INTO review_annotations (
                id, document_id, page_number, position_json, highlighted_text,
                comment_text, annotation_type, status, section_label,
                author_id, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(annotation.id.to_string())
        .bind(&annotation.document_id)
        .bind(annotation.page_number as i64)
        .bind(&position_json)
        .bind(&annotation.highlighted_text)
        .bind(&annotation.comment_text)
        .bind(annotation.annotation_type.as_str())
        .bind(annotation.status.as_str())
        .bind(&annotation.section_label)
        .bind(&annotation.author_id)
        .bind(annotation.created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl AnnotationStore for SqliteAnnotationStore {
    async fn create(&self, annotation: NewAnnotation) -> Result<Annotation, StoreError> {
        let mut annotation = annotation.into_annotation();
        // Stored with microsecond precision
        annotation.created_at = annotation.created_at.trunc_subsecs(6);
        self.insert(&annotation).await?;

        tracing::debug!(
            annotation_id = %annotation.id,
            document_id = %annotation.document_id,
            page_number = annotation.page_number,
            "Stored annotation"
        );
        Ok(annotation)
    }

    async fn list(&self, document_id: &str) -> Result<Vec<Annotation>, StoreError> {
        let rows = sqlx::query_as::<_, AnnotationRow>(
            r#"
            SELECT id, document_id, page_number, position_json, highlighted_text,
                   comment_text, annotation_type, status, section_label,
                   author_id, created_at
            FROM review_annotations
            WHERE document_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        let mut annotations = rows
            .into_iter()
            .map(|r| r.into_annotation())
            .collect::<Result<Vec<_>, _>>()?;
        annotations.sort_by_key(|a| a.recency_key());
        Ok(annotations)
    }

    async fn update(&self, id: AnnotationId, patch: AnnotationPatch) -> Result<(), StoreError> {
        let mut annotation = self
            .get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        patch.apply_to(&mut annotation);

        sqlx::query(
            r#"
            UPDATE review_annotations
            SET comment_text = ?, annotation_type = ?, status = ?, section_label = ?
            WHERE id = ?
            "#,
        )
        .bind(&annotation.comment_text)
        .bind(annotation.annotation_type.as_str())
        .bind(annotation.status.as_str())
        .bind(&annotation.section_label)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: AnnotationId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM review_annotations WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

/// Internal row type for SQLite queries
#[derive(sqlx::FromRow)]
struct AnnotationRow {
    id: String,
    document_id: String,
    page_number: i64,
    position_json: String,
    highlighted_text: String,
    comment_text: String,
    annotation_type: String,
    status: String,
    section_label: Option<String>,
    author_id: String,
    created_at: String,
}

impl AnnotationRow {
    fn into_annotation(self) -> Result<Annotation, StoreError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| StoreError::InvalidRecord(format!("id {}: {}", self.id, e)))?;
        let page_number = u32::try_from(self.page_number)
            .map_err(|_| StoreError::InvalidRecord(format!("page number {}", self.page_number)))?;
        let annotation_type = AnnotationType::parse(&self.annotation_type)
            .ok_or_else(|| StoreError::InvalidRecord(format!("type {}", self.annotation_type)))?;
        let status = AnnotationStatus::parse(&self.status)
            .ok_or_else(|| StoreError::InvalidRecord(format!("status {}", self.status)))?;
        let position: NormalizedRect = serde_json::from_str(&self.position_json)?;
        if position.page_number != page_number {
            tracing::warn!(
                annotation_id = %id,
                column = page_number,
                position = position.page_number,
                "Page column disagrees with stored position, using the position"
            );
        }
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| StoreError::InvalidRecord(format!("created_at {}: {}", self.created_at, e)))?
            .with_timezone(&Utc);

        Ok(Annotation {
            id,
            document_id: self.document_id,
            page_number: position.page_number,
            position: position.clamped(),
            highlighted_text: self.highlighted_text,
            comment_text: self.comment_text,
            annotation_type,
            status,
            section_label: self.section_label,
            author_id: self.author_id,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test_store() -> SqliteAnnotationStore {
        SqliteAnnotationStore::connect("sqlite::memory:").await.unwrap()
    }

    fn new_annotation(document_id: &str, page: u32) -> NewAnnotation {
        NewAnnotation {
            document_id: document_id.to_string(),
            position: NormalizedRect::new(page, 12.5, 40.0, 50.0, 2.5),
            highlighted_text: "the Supplier shall".to_string(),
            comment_text: "Define Supplier".to_string(),
            annotation_type: AnnotationType::Discussion,
            status: AnnotationStatus::Proposed,
            section_label: Some("1. Definitions".to_string()),
            author_id: "user-7".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = setup_test_store().await;

        let created = store.create(new_annotation("doc-123", 3)).await.unwrap();
        let loaded = store.get(created.id).await.unwrap().unwrap();

        assert_eq!(loaded.document_id, "doc-123");
        assert_eq!(loaded.page_number, 3);
        assert_eq!(loaded.position, created.position);
        assert_eq!(loaded.annotation_type, AnnotationType::Discussion);
        assert_eq!(loaded.section_label.as_deref(), Some("1. Definitions"));
    }

    #[tokio::test]
    async fn test_list_by_document() {
        let store = setup_test_store().await;

        for page in 1..=3 {
            store.create(new_annotation("doc-a", page)).await.unwrap();
        }
        store.create(new_annotation("doc-b", 1)).await.unwrap();

        let results = store.list("doc-a").await.unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.windows(2).all(|w| w[0].recency_key() <= w[1].recency_key()));
    }

    #[tokio::test]
    async fn test_update_patch() {
        let store = setup_test_store().await;
        let created = store.create(new_annotation("doc-a", 1)).await.unwrap();

        let patch = AnnotationPatch {
            comment_text: Some("Resolved offline".to_string()),
            status: Some(AnnotationStatus::Accepted),
            ..Default::default()
        };
        store.update(created.id, patch).await.unwrap();

        let loaded = store.get(created.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, AnnotationStatus::Accepted);
        assert_eq!(loaded.comment_text, "Resolved offline");
        assert_eq!(loaded.annotation_type, AnnotationType::Discussion);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = setup_test_store().await;
        let created = store.create(new_annotation("doc-a", 1)).await.unwrap();

        store.delete(created.id).await.unwrap();
        assert!(store.get(created.id).await.unwrap().is_none());
        assert!(matches!(
            store.delete(created.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_page_number_follows_stored_position() {
        let store = setup_test_store().await;
        let created = store.create(new_annotation("doc-a", 2)).await.unwrap();

        sqlx::query("UPDATE review_annotations SET page_number = 7 WHERE id = ?")
            .bind(created.id.to_string())
            .execute(&store.pool)
            .await
            .unwrap();

        let loaded = store.get(created.id).await.unwrap().unwrap();
        assert_eq!(loaded.page_number, 2);
        assert_eq!(loaded.position.page_number, 2);
    }

    #[tokio::test]
    async fn test_position_column_is_plain_json() {
        let store = setup_test_store().await;
        let created = store.create(new_annotation("doc-a", 2)).await.unwrap();

        let (json,): (String,) =
            sqlx::query_as("SELECT position_json FROM review_annotations WHERE id = ?")
                .bind(created.id.to_string())
                .fetch_one(&store.pool)
                .await
                .unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "left": 12.5,
                "top": 40.0,
                "width": 50.0,
                "height": 2.5,
                "pageNumber": 2
            })
        );
    }
}
