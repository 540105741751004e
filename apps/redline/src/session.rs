//! Review session
//!
//! One document view: the outline index, the overlay engine, the scroll
//! reconciler and the collaborators they talk to.

use std::future::Future;
use std::sync::Arc;

use tokio::time::Instant;

use crate::annotations::{Annotation, AnnotationId, AnnotationPatch};
use crate::config::ReviewConfig;
use crate::error::Result;
use crate::events::ReviewListener;
use crate::geometry::PageSize;
use crate::outline::{build_index, guess_section_with, DestinationResolver, OutlineIndex, OutlineNode};
use crate::overlay::{DraftProposal, DraftSubmission, OverlayEngine, OverlayFilter, OverlaySnapshot};
use crate::scroll::{ScrollOutcome, ScrollReconciler};
use crate::store::AnnotationStore;
use crate::surface::{SelectionEvent, ViewerSurface};

pub struct ReviewSession {
    config: ReviewConfig,
    store: Arc<dyn AnnotationStore>,
    listener: Arc<dyn ReviewListener>,
    engine: OverlayEngine,
    reconciler: Arc<ScrollReconciler>,
    outline: OutlineIndex,
    indexed_document: Option<String>,
}

impl ReviewSession {
    pub fn new(
        config: ReviewConfig,
        store: Arc<dyn AnnotationStore>,
        surface: Arc<dyn ViewerSurface>,
        listener: Arc<dyn ReviewListener>,
    ) -> Self {
        let engine = OverlayEngine::new(listener.clone(), config.hover_delay());
        let reconciler = Arc::new(ScrollReconciler::new(
            surface,
            engine.snapshot_cell(),
            config.scroll.retry_policy(),
            config.scroll.leading_margin_px,
        ));

        Self {
            config,
            store,
            listener,
            engine,
            reconciler,
            outline: OutlineIndex::default(),
            indexed_document: None,
        }
    }

    pub fn engine(&self) -> &OverlayEngine {
        &self.engine
    }

    pub fn outline(&self) -> &OutlineIndex {
        &self.outline
    }

    pub fn snapshot(&self) -> Arc<OverlaySnapshot> {
        self.engine.snapshot()
    }

    pub fn reconciler(&self) -> Arc<ScrollReconciler> {
        Arc::clone(&self.reconciler)
    }

    // ========================================================================
    // Document
    // ========================================================================

    /// Index the outline and load the annotations of a document
    ///
    /// Nothing is committed until both the index and the annotations are in
    /// hand; a failed load leaves the previous document in place. Loading the
    /// same document again reuses its index.
    pub async fn load_document(
        &mut self,
        document_id: &str,
        outline: &[OutlineNode],
        resolver: &dyn DestinationResolver,
    ) -> Result<()> {
        let reindex = self.indexed_document.as_deref() != Some(document_id);
        let index = if reindex {
            Some(build_index(outline, resolver).await)
        } else {
            None
        };

        let annotations = match self.store.list(document_id).await {
            Ok(annotations) => annotations,
            Err(err) => {
                tracing::warn!(document_id = %document_id, error = %err, "Document load failed");
                return Err(err.into());
            }
        };

        if let Some(index) = index {
            self.listener.on_bookmarks_loaded(&index);
            self.outline = index;
            self.indexed_document = Some(document_id.to_string());
        }
        tracing::info!(
            document_id = %document_id,
            bookmarks = self.outline.len(),
            annotations = annotations.len(),
            "Document loaded"
        );
        self.engine.load_document(document_id, annotations);
        Ok(())
    }

    /// Reload annotations from the store
    pub async fn refresh_annotations(&mut self) -> Result<()> {
        let annotations = self.store.list(self.engine.document_id()).await?;
        self.engine.set_annotations(annotations);
        Ok(())
    }

    pub async fn update_annotation(&mut self, id: AnnotationId, patch: AnnotationPatch) -> Result<()> {
        self.store.update(id, patch).await?;
        tracing::debug!(annotation_id = %id, "Annotation updated");
        self.refresh_annotations().await
    }

    pub async fn delete_annotation(&mut self, id: AnnotationId) -> Result<()> {
        self.store.delete(id).await?;
        tracing::debug!(annotation_id = %id, "Annotation deleted");
        self.engine.remove_annotation(id);
        Ok(())
    }

    pub fn set_filter(&mut self, filter: OverlayFilter) {
        self.engine.set_filter(filter);
    }

    // ========================================================================
    // Surface events
    // ========================================================================

    pub fn page_rendered(&mut self, page_number: u32, size: PageSize) {
        self.engine.page_rendered(page_number, size);
    }

    pub fn page_removed(&mut self, page_number: u32) {
        self.engine.page_removed(page_number);
    }

    pub fn viewport_changed(&mut self) {
        self.engine.viewport_changed();
    }

    pub fn on_animation_frame(&mut self) -> bool {
        self.engine.on_animation_frame()
    }

    // ========================================================================
    // Drafting
    // ========================================================================

    /// Start a draft and suggest a section for it
    pub fn select(&mut self, selection: &SelectionEvent) -> Result<DraftProposal> {
        let draft = self.engine.begin_selection(selection)?;
        let suggested_section = guess_section_with(
            &self.outline,
            draft.page_number,
            Some(draft.area.top_fraction()),
            self.config.section_strategy,
        );
        Ok(DraftProposal {
            draft,
            suggested_section,
        })
    }

    pub async fn submit(&mut self, submission: DraftSubmission) -> Result<Annotation> {
        let limit = self.config.save_timeout();
        self.engine.submit(self.store.as_ref(), submission, limit).await
    }

    pub fn cancel(&mut self) -> bool {
        self.engine.cancel()
    }

    /// Escape key
    pub fn escape(&mut self) -> bool {
        self.engine.cancel()
    }

    /// The surface cleared its selection
    pub fn selection_lost(&mut self) -> bool {
        self.engine.cancel()
    }

    // ========================================================================
    // Pointer and navigation
    // ========================================================================

    pub fn click(&self, page_number: u32, x: f64, y: f64) -> Option<AnnotationId> {
        self.engine.click(page_number, x, y)
    }

    pub fn pointer_moved(&mut self, page_number: u32, x: f64, y: f64) -> Option<AnnotationId> {
        self.engine.pointer_moved(page_number, x, y, Instant::now())
    }

    pub fn pointer_left(&mut self) {
        self.engine.pointer_left(Instant::now());
    }

    pub fn hover_tick(&mut self) {
        self.engine.hover_tick(Instant::now());
    }

    /// Scroll an annotation into view
    ///
    /// The token is taken when this is called, so a later call supersedes
    /// this one even if its future is polled first.
    pub fn scroll_to_annotation(&self, id: AnnotationId) -> impl Future<Output = ScrollOutcome> + Send + 'static {
        let reconciler = Arc::clone(&self.reconciler);
        let token = reconciler.issue_token();
        async move { reconciler.scroll_to(id, token).await }
    }
}
