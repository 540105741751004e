//! Rendering surface interface
//!
//! The PDF renderer itself is external. The engine consumes page layouts,
//! selection events, a scroll position and a "jump to page" primitive.

mod simulated;

use serde::{Deserialize, Serialize};

use crate::geometry::{PageSize, PixelRect};

pub use simulated::{SimulatedDocument, SimulatedViewer};

/// Position and size of a rendered page inside the scroll container
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLayout {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Distance from the top of the scroll content to the page's top edge
    pub offset_top: f64,
    /// Rendered size
    pub size: PageSize,
}

/// Text or area selection reported by the rendering surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionEvent {
    /// Selection bounds, measured against the page as currently rendered
    pub rect: PixelRect,
    /// Selected text, empty for area selections
    #[serde(default)]
    pub text: String,
}

impl SelectionEvent {
    pub fn page_number(&self) -> u32 {
        self.rect.page_number
    }
}

/// Viewer operations used by scroll reconciliation
///
/// Pages outside the viewport may not be rendered; `page_layout` returns
/// `None` for them until the viewer renders them.
pub trait ViewerSurface: Send + Sync {
    /// Layout of a rendered page
    fn page_layout(&self, page_number: u32) -> Option<PageLayout>;

    /// Current scroll offset of the container
    fn scroll_top(&self) -> f64;

    /// Scroll the container
    fn set_scroll_top(&self, scroll_top: f64);

    /// Bring a page into view; it renders asynchronously
    fn jump_to_page(&self, page_number: u32);
}
