//! Annotation types
//!
//! The persistence collaborator owns annotation identity and lifecycle; the
//! engine reads these records to derive overlay geometry and hands new ones
//! back through [`NewAnnotation`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::NormalizedRect;

/// Unique identifier for an annotation
pub type AnnotationId = Uuid;

/// A persisted review annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Unique identifier (UUID)
    pub id: AnnotationId,
    /// The document this annotation belongs to
    pub document_id: String,
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Highlighted region
    pub position: NormalizedRect,
    /// Text under the highlight, if any was selected
    pub highlighted_text: String,
    /// Reviewer's comment
    pub comment_text: String,
    /// Kind of annotation
    #[serde(rename = "type")]
    pub annotation_type: AnnotationType,
    /// Lifecycle status
    pub status: AnnotationStatus,
    /// Section label (inferred from the outline or typed by the reviewer)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_label: Option<String>,
    /// Author user ID
    pub author_id: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Types of review annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    /// General remark
    #[default]
    Comment,
    /// Proposed change to the text
    Edit,
    /// Open question for the team
    Discussion,
}

impl AnnotationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationType::Comment => "comment",
            AnnotationType::Edit => "edit",
            AnnotationType::Discussion => "discussion",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "comment" => Some(AnnotationType::Comment),
            "edit" => Some(AnnotationType::Edit),
            "discussion" => Some(AnnotationType::Discussion),
            _ => None,
        }
    }
}

/// Review lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationStatus {
    #[default]
    Proposed,
    Accepted,
    Rejected,
}

impl AnnotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationStatus::Proposed => "proposed",
            AnnotationStatus::Accepted => "accepted",
            AnnotationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "proposed" => Some(AnnotationStatus::Proposed),
            "accepted" => Some(AnnotationStatus::Accepted),
            "rejected" => Some(AnnotationStatus::Rejected),
            _ => None,
        }
    }
}

/// Fields for creating an annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnnotation {
    pub document_id: String,
    pub position: NormalizedRect,
    pub highlighted_text: String,
    pub comment_text: String,
    #[serde(rename = "type")]
    pub annotation_type: AnnotationType,
    pub status: AnnotationStatus,
    pub section_label: Option<String>,
    pub author_id: String,
}

impl NewAnnotation {
    /// Materialize into a record with a fresh ID and timestamp
    pub fn into_annotation(self) -> Annotation {
        let position = self.position.clamped();
        Annotation {
            id: Uuid::new_v4(),
            document_id: self.document_id,
            page_number: position.page_number,
            position,
            highlighted_text: self.highlighted_text,
            comment_text: self.comment_text,
            annotation_type: self.annotation_type,
            status: self.status,
            section_label: self.section_label.filter(|label| !label.trim().is_empty()),
            author_id: self.author_id,
            created_at: Utc::now(),
        }
    }
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_text: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub annotation_type: Option<AnnotationType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AnnotationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_label: Option<String>,
}

impl AnnotationPatch {
    /// Set the status
    pub fn status(status: AnnotationStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn apply_to(&self, annotation: &mut Annotation) {
        if let Some(comment) = &self.comment_text {
            annotation.comment_text = comment.clone();
        }
        if let Some(annotation_type) = self.annotation_type {
            annotation.annotation_type = annotation_type;
        }
        if let Some(status) = self.status {
            annotation.status = status;
        }
        if let Some(label) = &self.section_label {
            annotation.section_label = Some(label.clone()).filter(|l| !l.trim().is_empty());
        }
    }
}

impl Annotation {
    /// Ordering key for overlap resolution: later creation wins
    pub fn recency_key(&self) -> (DateTime<Utc>, AnnotationId) {
        (self.created_at, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_annotation() -> NewAnnotation {
        NewAnnotation {
            document_id: "doc-123".to_string(),
            position: NormalizedRect::new(4, 10.0, 20.0, 30.0, 5.0),
            highlighted_text: "shall be delivered".to_string(),
            comment_text: "Should be 'must'".to_string(),
            annotation_type: AnnotationType::Edit,
            status: AnnotationStatus::Proposed,
            section_label: Some("2. Delivery".to_string()),
            author_id: "user-1".to_string(),
        }
    }

    #[test]
    fn test_into_annotation() {
        let annotation = new_annotation().into_annotation();

        assert_eq!(annotation.page_number, 4);
        assert_eq!(annotation.annotation_type, AnnotationType::Edit);
        assert_eq!(annotation.section_label.as_deref(), Some("2. Delivery"));
    }

    #[test]
    fn test_into_annotation_clamps_position() {
        let mut input = new_annotation();
        input.position = NormalizedRect::new(4, 90.0, 20.0, 30.0, 5.0);
        input.section_label = Some("   ".to_string());

        let annotation = input.into_annotation();

        assert!(annotation.position.is_within_page());
        assert_eq!(annotation.position.width, 10.0);
        assert!(annotation.section_label.is_none());
    }

    #[test]
    fn test_patch_status() {
        let mut annotation = new_annotation().into_annotation();
        AnnotationPatch::status(AnnotationStatus::Accepted).apply_to(&mut annotation);

        assert_eq!(annotation.status, AnnotationStatus::Accepted);
        assert_eq!(annotation.comment_text, "Should be 'must'");
    }

    #[test]
    fn test_serialization() {
        let annotation = new_annotation().into_annotation();

        let json = serde_json::to_string_pretty(&annotation).unwrap();
        assert!(json.contains("\"type\": \"edit\""));
        assert!(json.contains("\"status\": \"proposed\""));
        assert!(json.contains("\"pageNumber\": 4"));

        let parsed: Annotation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, annotation);
    }

    #[test]
    fn test_enum_names() {
        assert_eq!(AnnotationType::parse("discussion"), Some(AnnotationType::Discussion));
        assert_eq!(AnnotationType::parse("note"), None);
        assert_eq!(AnnotationStatus::Rejected.as_str(), "rejected");
        assert_eq!(AnnotationStatus::parse("accepted"), Some(AnnotationStatus::Accepted));
    }
}
