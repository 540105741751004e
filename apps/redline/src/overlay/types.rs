//! Overlay state types

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::annotations::{Annotation, AnnotationId, AnnotationStatus, AnnotationType};
use crate::geometry::{NormalizedRect, PixelRect};

/// Review interaction state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewState {
    #[default]
    Idle,
    Selecting,
    Drafting,
    Saving,
}

/// The single in-progress annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftOverlay {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Selected region
    pub area: NormalizedRect,
    /// Selected text, empty for area selections
    pub highlighted_text: String,
}

/// Draft plus the section suggested for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftProposal {
    pub draft: DraftOverlay,
    /// Outline title for the draft's location, empty when unknown
    pub suggested_section: String,
}

/// User-provided fields completing a draft
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSubmission {
    pub comment_text: String,
    #[serde(rename = "type", default)]
    pub annotation_type: AnnotationType,
    #[serde(default)]
    pub status: AnnotationStatus,
    /// Section label; usually the suggested section, possibly edited
    pub section_label: Option<String>,
    pub author_id: String,
}

/// Highlight projected onto a rendered page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayRect {
    pub annotation_id: AnnotationId,
    pub rect: PixelRect,
    #[serde(rename = "type")]
    pub annotation_type: AnnotationType,
    pub status: AnnotationStatus,
    pub created_at: DateTime<Utc>,
}

/// Which annotations are displayed
///
/// `None` on either axis means every value passes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayFilter {
    pub statuses: Option<HashSet<AnnotationStatus>>,
    pub types: Option<HashSet<AnnotationType>>,
}

impl OverlayFilter {
    pub fn statuses(statuses: impl IntoIterator<Item = AnnotationStatus>) -> Self {
        Self {
            statuses: Some(statuses.into_iter().collect()),
            types: None,
        }
    }

    pub fn allows(&self, annotation: &Annotation) -> bool {
        let status_ok = self
            .statuses
            .as_ref()
            .map_or(true, |allowed| allowed.contains(&annotation.status));
        let type_ok = self
            .types
            .as_ref()
            .map_or(true, |allowed| allowed.contains(&annotation.annotation_type));
        status_ok && type_ok
    }
}

/// Overlay geometry derived from the current annotations and rendered pages
///
/// Rects on each page are ordered oldest first, so the topmost highlight is
/// the last one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySnapshot {
    /// Recompute generation that produced this snapshot
    pub generation: u64,
    /// Projected highlights of rendered pages
    pub pages: BTreeMap<u32, Vec<OverlayRect>>,
    /// Stored positions of every displayed annotation, rendered or not
    #[serde(skip)]
    pub positions: HashMap<AnnotationId, NormalizedRect>,
    /// Projected draft, when its page is rendered
    pub draft: Option<PixelRect>,
}

impl OverlaySnapshot {
    pub fn rects_on_page(&self, page_number: u32) -> &[OverlayRect] {
        self.pages.get(&page_number).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rect_for(&self, id: AnnotationId) -> Option<&OverlayRect> {
        let position = self.positions.get(&id)?;
        self.rects_on_page(position.page_number)
            .iter()
            .find(|rect| rect.annotation_id == id)
    }

    pub fn position_of(&self, id: AnnotationId) -> Option<&NormalizedRect> {
        self.positions.get(&id)
    }

    /// Most recently created highlight containing the point
    pub fn hit_test(&self, page_number: u32, x: f64, y: f64) -> Option<AnnotationId> {
        self.rects_on_page(page_number)
            .iter()
            .rev()
            .find(|rect| rect.rect.contains(x, y))
            .map(|rect| rect.annotation_id)
    }

    pub fn rect_count(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }
}
