//! Outbound notifications to the UI shell

use parking_lot::Mutex;
use serde::Serialize;

use crate::annotations::AnnotationId;
use crate::error::ReviewError;
use crate::outline::OutlineEntry;
use crate::overlay::{DraftOverlay, ReviewState};

/// Callbacks invoked by the review session
///
/// Every method has a no-op default so shells only implement what they show.
pub trait ReviewListener: Send + Sync {
    /// A rendered highlight was clicked
    fn on_highlight_click(&self, _id: AnnotationId) {}

    /// The draft slot changed (`None` when cleared)
    fn on_draft_change(&self, _draft: Option<&DraftOverlay>) {}

    /// The review state machine moved
    fn on_state_change(&self, _state: ReviewState) {}

    /// The outline index finished building
    fn on_bookmarks_loaded(&self, _entries: &[OutlineEntry]) {}

    /// Hover popover shown (`Some`) or hidden (`None`)
    fn on_hover_change(&self, _hovered: Option<AnnotationId>) {}

    /// A save failed; the draft has already been cleared
    fn on_save_failed(&self, _error: &ReviewError) {}
}

/// Listener that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl ReviewListener for NoopListener {}

/// Recorded notification
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ReviewEvent {
    HighlightClick { id: AnnotationId },
    DraftChanged { draft: Option<DraftOverlay> },
    StateChanged { state: ReviewState },
    BookmarksLoaded { count: usize },
    HoverChanged { hovered: Option<AnnotationId> },
    SaveFailed { message: String, retryable: bool },
}

/// Listener that keeps every notification in order
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<ReviewEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReviewEvent> {
        self.events.lock().clone()
    }

    /// Remove and return everything recorded so far
    pub fn drain(&self) -> Vec<ReviewEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    fn push(&self, event: ReviewEvent) {
        self.events.lock().push(event);
    }
}

impl ReviewListener for EventLog {
    fn on_highlight_click(&self, id: AnnotationId) {
        self.push(ReviewEvent::HighlightClick { id });
    }

    fn on_draft_change(&self, draft: Option<&DraftOverlay>) {
        self.push(ReviewEvent::DraftChanged {
            draft: draft.cloned(),
        });
    }

    fn on_state_change(&self, state: ReviewState) {
        self.push(ReviewEvent::StateChanged { state });
    }

    fn on_bookmarks_loaded(&self, entries: &[OutlineEntry]) {
        self.push(ReviewEvent::BookmarksLoaded { count: entries.len() });
    }

    fn on_hover_change(&self, hovered: Option<AnnotationId>) {
        self.push(ReviewEvent::HoverChanged { hovered });
    }

    fn on_save_failed(&self, error: &ReviewError) {
        self.push(ReviewEvent::SaveFailed {
            message: error.to_string(),
            retryable: error.is_retryable(),
        });
    }
}
