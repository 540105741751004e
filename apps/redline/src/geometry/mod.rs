//! Page geometry
//!
//! Pixel-space rectangles as reported by the rendering surface, and the
//! percentage-space rectangles persisted as annotation positions.

mod transform;
mod types;

pub use transform::{to_normalized, to_pixels};
pub use types::{NormalizedRect, PageSize, PixelRect, RECT_TOLERANCE};
