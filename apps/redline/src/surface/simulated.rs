//! In-process viewer and document used by the headless binary and tests
//!
//! `SimulatedViewer` stacks pages vertically with a fixed gap and renders
//! lazily: a page outside the viewport only gets a layout some time after
//! `jump_to_page` asks for it, measured on the tokio clock.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use super::{PageLayout, ViewerSurface};
use crate::error::OutlineError;
use crate::geometry::PageSize;
use crate::outline::{DestinationResolver, OutlineDest, OutlineNode, PageRef, RawDestination};

/// Gap between stacked pages, in pixels
const PAGE_GAP_PX: f64 = 10.0;

/// First object number used for page references
const FIRST_PAGE_OBJECT: u32 = 3;

// ============================================================================
// Viewer
// ============================================================================

#[derive(Debug, Default)]
struct ViewerState {
    rendered: BTreeSet<u32>,
    pending: HashMap<u32, Instant>,
    scroll_top: f64,
    scroll_history: Vec<f64>,
    jumps: Vec<u32>,
}

/// Scroll container with lazily rendered pages
#[derive(Debug)]
pub struct SimulatedViewer {
    pages: Vec<PageSize>,
    render_delay: Duration,
    state: Mutex<ViewerState>,
}

impl SimulatedViewer {
    pub fn new(pages: Vec<PageSize>) -> Self {
        Self {
            pages,
            render_delay: Duration::ZERO,
            state: Mutex::new(ViewerState::default()),
        }
    }

    /// Viewer whose pages all share one size
    pub fn uniform(page_count: u32, size: PageSize) -> Self {
        Self::new(vec![size; page_count as usize])
    }

    /// Delay between a jump request and the target page being rendered
    pub fn with_render_delay(mut self, render_delay: Duration) -> Self {
        self.render_delay = render_delay;
        self
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Render a page immediately, as if it had scrolled into the viewport
    pub fn render_page(&self, page_number: u32) -> Option<PageLayout> {
        let layout = self.layout_of(page_number)?;
        let mut state = self.state.lock();
        state.pending.remove(&page_number);
        state.rendered.insert(page_number);
        Some(layout)
    }

    /// Drop a page from the rendered set
    pub fn unrender_page(&self, page_number: u32) {
        let mut state = self.state.lock();
        state.rendered.remove(&page_number);
        state.pending.remove(&page_number);
    }

    /// Finish renders whose delay has elapsed and return their layouts
    pub fn settle(&self) -> Vec<PageLayout> {
        let now = Instant::now();
        let mut state = self.state.lock();
        let due: Vec<u32> = state
            .pending
            .iter()
            .filter(|(_, ready_at)| **ready_at <= now)
            .map(|(page, _)| *page)
            .collect();

        let mut layouts = Vec::with_capacity(due.len());
        for page in due {
            state.pending.remove(&page);
            state.rendered.insert(page);
            if let Some(layout) = self.layout_of(page) {
                layouts.push(layout);
            }
        }
        layouts.sort_by_key(|layout| layout.page_number);
        layouts
    }

    pub fn is_rendered(&self, page_number: u32) -> bool {
        self.state.lock().rendered.contains(&page_number)
    }

    /// Every scroll offset written through `set_scroll_top`
    pub fn scroll_history(&self) -> Vec<f64> {
        self.state.lock().scroll_history.clone()
    }

    /// Every page passed to `jump_to_page`
    pub fn jumps(&self) -> Vec<u32> {
        self.state.lock().jumps.clone()
    }

    fn layout_of(&self, page_number: u32) -> Option<PageLayout> {
        let index = page_number.checked_sub(1)? as usize;
        let size = *self.pages.get(index)?;
        let offset_top = self.pages[..index]
            .iter()
            .map(|page| page.height_px + PAGE_GAP_PX)
            .sum();

        Some(PageLayout {
            page_number,
            offset_top,
            size,
        })
    }
}

impl ViewerSurface for SimulatedViewer {
    fn page_layout(&self, page_number: u32) -> Option<PageLayout> {
        let now = Instant::now();
        {
            let mut state = self.state.lock();
            let ready = state.pending.get(&page_number).is_some_and(|ready_at| *ready_at <= now);
            if ready {
                state.pending.remove(&page_number);
                state.rendered.insert(page_number);
            }
            if !state.rendered.contains(&page_number) {
                return None;
            }
        }
        self.layout_of(page_number)
    }

    fn scroll_top(&self) -> f64 {
        self.state.lock().scroll_top
    }

    fn set_scroll_top(&self, scroll_top: f64) {
        let mut state = self.state.lock();
        state.scroll_top = scroll_top;
        state.scroll_history.push(scroll_top);
    }

    fn jump_to_page(&self, page_number: u32) {
        let Some(layout) = self.layout_of(page_number) else {
            tracing::debug!(page_number, "Jump to unknown page ignored");
            return;
        };

        let mut state = self.state.lock();
        state.jumps.push(page_number);
        state.scroll_top = layout.offset_top;
        if state.rendered.contains(&page_number) {
            return;
        }
        if self.render_delay.is_zero() {
            state.rendered.insert(page_number);
        } else {
            let ready_at = Instant::now() + self.render_delay;
            state.pending.entry(page_number).or_insert(ready_at);
        }
    }
}

// ============================================================================
// Document
// ============================================================================

/// Document with page heights, named destinations and an outline tree
#[derive(Debug, Clone, Default)]
pub struct SimulatedDocument {
    page_heights: Vec<f64>,
    named: HashMap<String, RawDestination>,
    outline: Vec<OutlineNode>,
}

impl SimulatedDocument {
    /// Document with the given unscaled page heights (PDF units)
    pub fn new(page_heights: Vec<f64>) -> Self {
        Self {
            page_heights,
            ..Default::default()
        }
    }

    pub fn with_named(mut self, name: &str, dest: RawDestination) -> Self {
        self.named.insert(name.to_string(), dest);
        self
    }

    pub fn with_outline(mut self, outline: Vec<OutlineNode>) -> Self {
        self.outline = outline;
        self
    }

    pub fn outline(&self) -> &[OutlineNode] {
        &self.outline
    }

    /// Page reference for a 1-indexed page number
    pub fn page_ref(page_number: u32) -> PageRef {
        PageRef::new(FIRST_PAGE_OBJECT + page_number.saturating_sub(1), 0)
    }
}

#[async_trait]
impl DestinationResolver for SimulatedDocument {
    async fn resolve_destination(&self, dest: &OutlineDest) -> Result<RawDestination, OutlineError> {
        match dest {
            OutlineDest::Explicit(raw) => Ok(raw.clone()),
            OutlineDest::Named(name) => self
                .named
                .get(name)
                .cloned()
                .ok_or_else(|| OutlineError::UnresolvedDestination(name.clone())),
        }
    }

    async fn page_index(&self, page_ref: &PageRef) -> Result<u32, OutlineError> {
        page_ref
            .num
            .checked_sub(FIRST_PAGE_OBJECT)
            .filter(|index| (*index as usize) < self.page_heights.len())
            .ok_or_else(|| OutlineError::InvalidPageRef(page_ref.to_string()))
    }

    async fn page_height(&self, page_index: u32) -> Result<f64, OutlineError> {
        self.page_heights
            .get(page_index as usize)
            .copied()
            .ok_or_else(|| OutlineError::Resolver(format!("No page at index {}", page_index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::{build_index, DestinationKind};

    fn letter() -> PageSize {
        PageSize::new(600.0, 800.0)
    }

    #[test]
    fn test_pages_stack_with_gap() {
        let viewer = SimulatedViewer::uniform(3, letter());
        let layout = viewer.render_page(3).unwrap();
        assert_eq!(layout.offset_top, 2.0 * (800.0 + PAGE_GAP_PX));
        assert!(viewer.render_page(4).is_none());
    }

    #[test]
    fn test_unrendered_page_has_no_layout() {
        let viewer = SimulatedViewer::uniform(2, letter());
        assert!(viewer.page_layout(1).is_none());
        viewer.render_page(1);
        assert!(viewer.page_layout(1).is_some());
        viewer.unrender_page(1);
        assert!(viewer.page_layout(1).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_jump_renders_after_delay() {
        let viewer = SimulatedViewer::uniform(10, letter()).with_render_delay(Duration::from_millis(250));
        viewer.jump_to_page(7);

        assert_eq!(viewer.jumps(), vec![7]);
        assert!(viewer.page_layout(7).is_none());

        tokio::time::advance(Duration::from_millis(300)).await;
        assert!(viewer.page_layout(7).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_reports_finished_renders() {
        let viewer = SimulatedViewer::uniform(10, letter()).with_render_delay(Duration::from_millis(100));
        viewer.jump_to_page(4);
        assert!(viewer.settle().is_empty());

        tokio::time::advance(Duration::from_millis(100)).await;
        let settled = viewer.settle();
        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].page_number, 4);
        assert!(viewer.is_rendered(4));
    }

    #[tokio::test]
    async fn test_document_resolves_outline() {
        let dest = RawDestination::new(
            SimulatedDocument::page_ref(2),
            DestinationKind::Xyz,
            vec![Some(0.0), Some(600.0), None],
        );
        let doc = SimulatedDocument::new(vec![800.0, 800.0])
            .with_named("intro", dest)
            .with_outline(vec![
                OutlineNode::new("Intro").with_dest(OutlineDest::Named("intro".to_string())),
                OutlineNode::new("Missing").with_dest(OutlineDest::Named("nope".to_string())),
            ]);

        let index = build_index(doc.outline(), &doc).await;
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].page_number, 2);
        let y = index[0].y_normalized_from_top.unwrap();
        assert!((y - 0.25).abs() < 1e-9);
    }
}
