//! Geometry types

use serde::{Deserialize, Serialize};

/// Tolerance used when checking the `[0, 100]` extent invariant
pub const RECT_TOLERANCE: f64 = 1e-9;

/// Rendered size of a page in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSize {
    pub width_px: f64,
    pub height_px: f64,
}

impl PageSize {
    pub fn new(width_px: f64, height_px: f64) -> Self {
        Self { width_px, height_px }
    }

    /// Whether both extents can be divided by
    pub fn is_known(&self) -> bool {
        is_usable_extent(self.width_px) && is_usable_extent(self.height_px)
    }
}

pub(crate) fn is_usable_extent(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Rectangle in on-screen pixels, measured against one rendered page
///
/// Only meaningful for the zoom and rotation the page had when the rectangle
/// was measured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelRect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    /// Rendered page width at measurement time
    pub page_width_px: f64,
    /// Rendered page height at measurement time
    pub page_height_px: f64,
    /// Page number (1-indexed)
    pub page_number: u32,
}

impl PixelRect {
    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).abs()
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).abs()
    }

    pub fn page_size(&self) -> PageSize {
        PageSize::new(self.page_width_px, self.page_height_px)
    }

    /// Inclusive point containment in the rectangle's own pixel space
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let (left, right) = (self.x1.min(self.x2), self.x1.max(self.x2));
        let (top, bottom) = (self.y1.min(self.y2), self.y1.max(self.y2));
        x >= left && x <= right && y >= top && y <= bottom
    }
}

/// Rectangle as percentages of page extent (0-100, origin top-left)
///
/// This is the persisted position of an annotation. Its JSON shape
/// (`left`, `top`, `width`, `height`, `pageNumber`) must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    /// Page number (1-indexed)
    pub page_number: u32,
}

impl NormalizedRect {
    pub fn new(page_number: u32, left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
            page_number,
        }
    }

    /// Clamp into the page: every field in `[0, 100]`, `left + width <= 100`
    /// and `top + height <= 100`. Non-finite fields become zero.
    pub fn clamped(self) -> Self {
        let left = clamp_percent(self.left);
        let top = clamp_percent(self.top);
        let width = clamp_percent(self.width).min(100.0 - left);
        let height = clamp_percent(self.height).min(100.0 - top);
        Self {
            left,
            top,
            width,
            height,
            page_number: self.page_number,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Whether the extent invariant holds within [`RECT_TOLERANCE`]
    pub fn is_within_page(&self) -> bool {
        self.left >= -RECT_TOLERANCE
            && self.top >= -RECT_TOLERANCE
            && self.right() <= 100.0 + RECT_TOLERANCE
            && self.bottom() <= 100.0 + RECT_TOLERANCE
    }

    /// Top edge as a fraction of page height (0.0 = top of page)
    pub fn top_fraction(&self) -> f64 {
        self.top / 100.0
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}
