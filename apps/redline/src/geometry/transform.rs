//! Pixel <-> percentage conversion
//!
//! Both directions are pure and do no rounding. A page whose pixel size is not
//! known yet yields `None`; callers retry once the page has rendered instead of
//! drawing at a guessed position.

use super::types::{is_usable_extent, NormalizedRect, PixelRect};

/// Convert a pixel rectangle into page percentages.
///
/// Corners may arrive in any order. Coordinates outside the page are clamped,
/// so the result always satisfies the `[0, 100]` extent invariant.
pub fn to_normalized(rect: &PixelRect) -> Option<NormalizedRect> {
    let (w, h) = (rect.page_width_px, rect.page_height_px);
    if !is_usable_extent(w) || !is_usable_extent(h) {
        return None;
    }
    if ![rect.x1, rect.y1, rect.x2, rect.y2].iter().all(|v| v.is_finite()) {
        return None;
    }

    let x1 = rect.x1.min(rect.x2).clamp(0.0, w);
    let x2 = rect.x1.max(rect.x2).clamp(0.0, w);
    let y1 = rect.y1.min(rect.y2).clamp(0.0, h);
    let y2 = rect.y1.max(rect.y2).clamp(0.0, h);

    let normalized = NormalizedRect {
        left: x1 / w * 100.0,
        top: y1 / h * 100.0,
        width: (x2 - x1) / w * 100.0,
        height: (y2 - y1) / h * 100.0,
        page_number: rect.page_number,
    };

    Some(normalized.clamped())
}

/// Project a percentage rectangle onto a page rendered at the given size.
///
/// Returns `None` when the page size is unknown (not rendered yet).
pub fn to_pixels(rect: &NormalizedRect, page_width_px: f64, page_height_px: f64) -> Option<PixelRect> {
    if !is_usable_extent(page_width_px) || !is_usable_extent(page_height_px) {
        return None;
    }

    let rect = rect.clamped();
    let x1 = rect.left / 100.0 * page_width_px;
    let y1 = rect.top / 100.0 * page_height_px;

    Some(PixelRect {
        x1,
        y1,
        x2: x1 + rect.width / 100.0 * page_width_px,
        y2: y1 + rect.height / 100.0 * page_height_px,
        page_width_px,
        page_height_px,
        page_number: rect.page_number,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn pixel(x1: f64, y1: f64, x2: f64, y2: f64, w: f64, h: f64) -> PixelRect {
        PixelRect {
            x1,
            y1,
            x2,
            y2,
            page_width_px: w,
            page_height_px: h,
            page_number: 4,
        }
    }

    #[test]
    fn test_to_normalized_basic() {
        let rect = to_normalized(&pixel(60.0, 80.0, 180.0, 120.0, 600.0, 800.0)).unwrap();

        assert!((rect.left - 10.0).abs() < EPS);
        assert!((rect.top - 10.0).abs() < EPS);
        assert!((rect.width - 20.0).abs() < EPS);
        assert!((rect.height - 5.0).abs() < EPS);
        assert_eq!(rect.page_number, 4);
    }

    #[test]
    fn test_round_trip_across_sizes() {
        let cases = [
            (pixel(0.0, 0.0, 612.0, 792.0, 612.0, 792.0), 612.0, 792.0),
            (pixel(13.7, 401.25, 299.9, 433.0, 918.0, 1188.0), 918.0, 1188.0),
            (pixel(1.0, 1.0, 2.0, 2.0, 3.0, 3.0), 3.0, 3.0),
        ];

        for (rect, w, h) in cases {
            let back = to_pixels(&to_normalized(&rect).unwrap(), w, h).unwrap();
            assert!((back.x1 - rect.x1).abs() < 1e-6, "{back:?} vs {rect:?}");
            assert!((back.y1 - rect.y1).abs() < 1e-6);
            assert!((back.x2 - rect.x2).abs() < 1e-6);
            assert!((back.y2 - rect.y2).abs() < 1e-6);
            assert_eq!(back.page_number, rect.page_number);
        }
    }

    #[test]
    fn test_zoom_reprojection_scales_linearly() {
        let normalized = to_normalized(&pixel(100.0, 200.0, 300.0, 250.0, 600.0, 800.0)).unwrap();
        let zoomed = to_pixels(&normalized, 1200.0, 1600.0).unwrap();

        assert!((zoomed.x1 - 200.0).abs() < 1e-6);
        assert!((zoomed.y2 - 500.0).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_bounds_input_is_clamped() {
        let rect = to_normalized(&pixel(-50.0, 700.0, 700.0, 900.0, 600.0, 800.0)).unwrap();

        assert!(rect.left + rect.width <= 100.0 + EPS);
        assert!(rect.top + rect.height <= 100.0 + EPS);
        assert_eq!(rect.left, 0.0);
        assert!((rect.width - 100.0).abs() < EPS);
    }

    #[test]
    fn test_reversed_corners() {
        let rect = to_normalized(&pixel(180.0, 120.0, 60.0, 80.0, 600.0, 800.0)).unwrap();

        assert!((rect.left - 10.0).abs() < EPS);
        assert!((rect.width - 20.0).abs() < EPS);
    }

    #[test]
    fn test_unknown_dimensions_yield_none() {
        let normalized = NormalizedRect::new(1, 10.0, 10.0, 10.0, 10.0);

        assert!(to_pixels(&normalized, 0.0, 800.0).is_none());
        assert!(to_pixels(&normalized, 600.0, f64::NAN).is_none());
        assert!(to_normalized(&pixel(0.0, 0.0, 1.0, 1.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_non_finite_coordinates_yield_none() {
        assert!(to_normalized(&pixel(f64::NAN, 0.0, 1.0, 1.0, 100.0, 100.0)).is_none());
    }
}
