//! Highlight overlay engine
//!
//! Owns the review state machine, the single draft slot and the projected
//! highlight geometry for one document view. Geometry is recomputed from the
//! stored positions on animation frames, only for pages that are rendered.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::cell::LatestCell;
use super::frame::{RecomputeReason, RecomputeScheduler};
use super::hover::{HoverChange, HoverDebouncer};
use super::types::{
    DraftOverlay, DraftSubmission, OverlayFilter, OverlayRect, OverlaySnapshot, ReviewState,
};
use crate::annotations::{Annotation, AnnotationId, NewAnnotation};
use crate::error::{GeometryError, Result, ReviewError};
use crate::events::ReviewListener;
use crate::geometry::{to_normalized, to_pixels, PageSize};
use crate::store::AnnotationStore;
use crate::surface::SelectionEvent;

pub struct OverlayEngine {
    document_id: String,
    state: ReviewState,
    draft: Option<DraftOverlay>,
    /// Oldest first
    annotations: Vec<Annotation>,
    rendered: BTreeMap<u32, PageSize>,
    filter: OverlayFilter,
    scheduler: RecomputeScheduler,
    snapshot: LatestCell<OverlaySnapshot>,
    hover: HoverDebouncer,
    listener: Arc<dyn ReviewListener>,
}

impl OverlayEngine {
    pub fn new(listener: Arc<dyn ReviewListener>, hover_delay: Duration) -> Self {
        Self {
            document_id: String::new(),
            state: ReviewState::Idle,
            draft: None,
            annotations: Vec::new(),
            rendered: BTreeMap::new(),
            filter: OverlayFilter::default(),
            scheduler: RecomputeScheduler::new(),
            snapshot: LatestCell::default(),
            hover: HoverDebouncer::new(hover_delay),
            listener,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn draft(&self) -> Option<&DraftOverlay> {
        self.draft.as_ref()
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn filter(&self) -> &OverlayFilter {
        &self.filter
    }

    /// Geometry from the last recompute
    pub fn snapshot(&self) -> Arc<OverlaySnapshot> {
        self.snapshot.get()
    }

    /// Shared handle to the overlay geometry, always holding the latest pass
    pub fn snapshot_cell(&self) -> LatestCell<OverlaySnapshot> {
        self.snapshot.clone()
    }

    pub fn rendered_pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.rendered.keys().copied()
    }

    /// Callback for the renderer's per-page highlight layer
    ///
    /// The closure can be registered once; every call reads the current
    /// overlay geometry.
    pub fn page_layer_renderer(&self) -> impl Fn(u32) -> Vec<OverlayRect> + Send + Sync + 'static {
        let cell = self.snapshot.clone();
        move |page_number| cell.get().rects_on_page(page_number).to_vec()
    }

    // ========================================================================
    // Annotation set and page events
    // ========================================================================

    /// Switch to another document with its annotation set
    pub fn load_document(&mut self, document_id: &str, annotations: Vec<Annotation>) {
        self.cancel();
        if let Some(change) = self.hover.pointer_over(None, Instant::now()) {
            self.emit_hover(change);
        }
        self.document_id = document_id.to_string();
        self.rendered.clear();
        self.set_annotations(annotations);
    }

    pub fn set_annotations(&mut self, mut annotations: Vec<Annotation>) {
        annotations.sort_by_key(Annotation::recency_key);
        self.annotations = annotations;
        self.scheduler.request(RecomputeReason::AnnotationsChanged);
    }

    /// Insert or replace one annotation
    pub fn upsert_annotation(&mut self, annotation: Annotation) {
        self.annotations.retain(|existing| existing.id != annotation.id);
        let at = self
            .annotations
            .partition_point(|existing| existing.recency_key() < annotation.recency_key());
        self.annotations.insert(at, annotation);
        self.scheduler.request(RecomputeReason::AnnotationsChanged);
    }

    pub fn remove_annotation(&mut self, id: AnnotationId) -> bool {
        let before = self.annotations.len();
        self.annotations.retain(|existing| existing.id != id);
        if let Some(change) = self.hover.forget(id) {
            self.emit_hover(change);
        }
        let removed = self.annotations.len() != before;
        if removed {
            self.scheduler.request(RecomputeReason::AnnotationsChanged);
        }
        removed
    }

    pub fn set_filter(&mut self, filter: OverlayFilter) {
        if self.filter == filter {
            return;
        }
        self.filter = filter;
        let hidden: Vec<AnnotationId> = self
            .annotations
            .iter()
            .filter(|a| !self.filter.allows(a))
            .map(|a| a.id)
            .collect();
        for id in hidden {
            if let Some(change) = self.hover.forget(id) {
                self.emit_hover(change);
            }
        }
        self.scheduler.request(RecomputeReason::FilterChanged);
    }

    /// The surface rendered (or re-rendered at a new zoom) a page
    pub fn page_rendered(&mut self, page_number: u32, size: PageSize) {
        if !size.is_known() {
            tracing::debug!(page_number, "Page rendered without usable dimensions, deferring");
            self.page_removed(page_number);
            return;
        }
        self.rendered.insert(page_number, size);
        self.scheduler.request(RecomputeReason::PageRendered(page_number));
    }

    /// The surface dropped a page from its rendered set
    pub fn page_removed(&mut self, page_number: u32) {
        if self.rendered.remove(&page_number).is_some() {
            self.scheduler.request(RecomputeReason::PageRemoved(page_number));
        }
    }

    /// Resize, zoom or rotation burst
    pub fn viewport_changed(&mut self) {
        self.scheduler.request(RecomputeReason::ViewportChanged);
    }

    pub fn request_recompute(&mut self, reason: RecomputeReason) -> u64 {
        self.scheduler.request(reason)
    }

    pub fn has_pending_recompute(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Run the pending recompute, if any. Returns whether one ran.
    pub fn on_animation_frame(&mut self) -> bool {
        let Some(request) = self.scheduler.take_due() else {
            return false;
        };
        self.recompute(request.generation, request.reason);
        true
    }

    fn recompute(&mut self, generation: u64, reason: RecomputeReason) {
        let mut snapshot = OverlaySnapshot {
            generation,
            ..Default::default()
        };

        for annotation in self.annotations.iter().filter(|a| self.filter.allows(a)) {
            snapshot.positions.insert(annotation.id, annotation.position);

            let page_number = annotation.position.page_number;
            let Some(size) = self.rendered.get(&page_number) else {
                continue;
            };
            let Some(rect) = to_pixels(&annotation.position, size.width_px, size.height_px) else {
                continue;
            };
            snapshot
                .pages
                .entry(page_number)
                .or_default()
                .push(OverlayRect {
                    annotation_id: annotation.id,
                    rect,
                    annotation_type: annotation.annotation_type,
                    status: annotation.status,
                    created_at: annotation.created_at,
                });
        }

        snapshot.draft = self.draft.as_ref().and_then(|draft| {
            let size = self.rendered.get(&draft.page_number)?;
            to_pixels(&draft.area, size.width_px, size.height_px)
        });

        tracing::debug!(
            generation,
            reason = ?reason,
            rendered_pages = self.rendered.len(),
            rects = snapshot.rect_count(),
            "Overlay recomputed"
        );
        self.snapshot.set(snapshot);
    }

    // ========================================================================
    // Review state machine
    // ========================================================================

    /// Start a draft from a selection, replacing any existing draft
    pub fn begin_selection(&mut self, selection: &SelectionEvent) -> Result<DraftOverlay> {
        self.recover_abandoned_save();
        self.set_state(ReviewState::Selecting);

        let page_number = selection.page_number();
        let Some(area) = to_normalized(&selection.rect) else {
            tracing::debug!(page_number, "Selection on a page without known dimensions");
            self.clear_draft();
            self.set_state(ReviewState::Idle);
            return Err(GeometryError::Indeterminate { page_number }.into());
        };

        let draft = DraftOverlay {
            page_number,
            area,
            highlighted_text: selection.text.trim().to_string(),
        };
        let replaced = self.draft.replace(draft.clone()).is_some();
        tracing::debug!(page_number, replaced, "Draft started");

        self.set_state(ReviewState::Drafting);
        self.listener.on_draft_change(Some(&draft));
        self.scheduler.request(RecomputeReason::DraftChanged);
        Ok(draft)
    }

    /// Cancel, Escape or selection loss. Returns whether anything changed.
    pub fn cancel(&mut self) -> bool {
        if self.state == ReviewState::Idle && self.draft.is_none() {
            return false;
        }
        self.clear_draft();
        self.set_state(ReviewState::Idle);
        tracing::debug!("Draft cancelled");
        true
    }

    /// Persist the draft. The draft is cleared whatever the outcome.
    pub async fn submit(
        &mut self,
        store: &dyn AnnotationStore,
        submission: DraftSubmission,
        limit: Duration,
    ) -> Result<Annotation> {
        self.recover_abandoned_save();
        let Some(draft) = self.draft.clone() else {
            return Err(ReviewError::NoDraft);
        };

        let new = NewAnnotation {
            document_id: self.document_id.clone(),
            position: draft.area,
            highlighted_text: draft.highlighted_text,
            comment_text: submission.comment_text,
            annotation_type: submission.annotation_type,
            status: submission.status,
            section_label: submission.section_label,
            author_id: submission.author_id,
        };

        self.set_state(ReviewState::Saving);
        let outcome = tokio::time::timeout(limit, store.create(new)).await;
        self.clear_draft();
        self.set_state(ReviewState::Idle);

        let error = match outcome {
            Ok(Ok(annotation)) => {
                tracing::info!(
                    annotation_id = %annotation.id,
                    document_id = %annotation.document_id,
                    page_number = annotation.page_number,
                    "Annotation saved"
                );
                self.upsert_annotation(annotation.clone());
                return Ok(annotation);
            }
            Ok(Err(e)) => ReviewError::Store(e),
            Err(_) => ReviewError::SaveTimeout(limit),
        };

        tracing::warn!(document_id = %self.document_id, error = %error, "Annotation save failed");
        self.listener.on_save_failed(&error);
        Err(error)
    }

    /// A dropped `submit` future leaves the engine in `Saving`
    fn recover_abandoned_save(&mut self) {
        if self.state == ReviewState::Saving {
            tracing::warn!(document_id = %self.document_id, "Recovering from an abandoned save");
            self.clear_draft();
            self.set_state(ReviewState::Idle);
        }
    }

    fn clear_draft(&mut self) {
        if self.draft.take().is_some() {
            self.listener.on_draft_change(None);
            self.scheduler.request(RecomputeReason::DraftChanged);
        }
    }

    fn set_state(&mut self, state: ReviewState) {
        if self.state != state {
            tracing::debug!(from = ?self.state, to = ?state, "Review state");
            self.state = state;
            self.listener.on_state_change(state);
        }
    }

    // ========================================================================
    // Pointer
    // ========================================================================

    /// Resolve a click to the topmost highlight and notify the shell
    pub fn click(&self, page_number: u32, x: f64, y: f64) -> Option<AnnotationId> {
        let hit = self.snapshot.get().hit_test(page_number, x, y);
        if let Some(id) = hit {
            tracing::debug!(annotation_id = %id, page_number, "Highlight clicked");
            self.listener.on_highlight_click(id);
        }
        hit
    }

    /// Pointer moved over a page; returns the highlight under it
    pub fn pointer_moved(&mut self, page_number: u32, x: f64, y: f64, now: Instant) -> Option<AnnotationId> {
        let target = self.snapshot.get().hit_test(page_number, x, y);
        if let Some(change) = self.hover.pointer_over(target, now) {
            self.emit_hover(change);
        }
        target
    }

    pub fn pointer_left(&mut self, now: Instant) {
        if let Some(change) = self.hover.pointer_over(None, now) {
            self.emit_hover(change);
        }
    }

    /// Show the pending hover popover once its delay has elapsed
    pub fn hover_tick(&mut self, now: Instant) {
        if let Some(change) = self.hover.tick(now) {
            self.emit_hover(change);
        }
    }

    pub fn hover_deadline(&self) -> Option<Instant> {
        self.hover.deadline()
    }

    fn emit_hover(&self, change: HoverChange) {
        match change {
            HoverChange::Shown(id) => self.listener.on_hover_change(Some(id)),
            HoverChange::Hidden => self.listener.on_hover_change(None),
        }
    }
}
