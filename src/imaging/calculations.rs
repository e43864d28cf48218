//! Pure calculation functions for derivative dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the dimensions of a scale-to-fit derivative.
///
/// The source is scaled to fit inside the target box while keeping its
/// aspect ratio. A missing bound leaves that axis free. Without `upscale`,
/// a source already smaller than the box keeps its own dimensions.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `bounds` - Target box `(width, height)`, either side optional
/// * `upscale` - Whether the derivative may exceed the source size
///
/// # Examples
/// ```
/// # use site_assistant::imaging::calculate_scaled_dimensions;
/// // 2000x1000 into a 480x480 box → 480x240
/// assert_eq!(calculate_scaled_dimensions((2000, 1000), (Some(480), Some(480)), false), (480, 240));
///
/// // width-only style keeps the aspect ratio
/// assert_eq!(calculate_scaled_dimensions((1600, 900), (Some(800), None), false), (800, 450));
/// ```
pub fn calculate_scaled_dimensions(
    source: (u32, u32),
    bounds: (Option<u32>, Option<u32>),
    upscale: bool,
) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return source;
    }

    let scale_w = bounds.0.map(|w| w as f64 / src_w as f64);
    let scale_h = bounds.1.map(|h| h as f64 / src_h as f64);

    let scale = match (scale_w, scale_h) {
        (Some(w), Some(h)) => w.min(h),
        (Some(w), None) => w,
        (None, Some(h)) => h,
        (None, None) => return source,
    };

    if scale >= 1.0 && !upscale {
        return source;
    }

    let w = ((src_w as f64 * scale).round() as u32).max(1);
    let h = ((src_h as f64 * scale).round() as u32).max(1);
    (w, h)
}

/// Width to advertise in a `srcset` candidate.
///
/// Uses the derivative width when the source size is known, otherwise the
/// style's own width bound.
pub fn srcset_width(
    source: Option<(u32, u32)>,
    bounds: (Option<u32>, Option<u32>),
    upscale: bool,
) -> Option<u32> {
    match source {
        Some(dims) => Some(calculate_scaled_dimensions(dims, bounds, upscale).0),
        None => bounds.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // calculate_scaled_dimensions tests
    // =========================================================================

    #[test]
    fn scale_landscape_into_square_box() {
        // 2000x1000 → limited by width: 480x240
        assert_eq!(
            calculate_scaled_dimensions((2000, 1000), (Some(480), Some(480)), false),
            (480, 240)
        );
    }

    #[test]
    fn scale_portrait_into_square_box() {
        // 1000x2000 → limited by height: 240x480
        assert_eq!(
            calculate_scaled_dimensions((1000, 2000), (Some(480), Some(480)), false),
            (240, 480)
        );
    }

    #[test]
    fn scale_width_only() {
        assert_eq!(
            calculate_scaled_dimensions((1600, 900), (Some(800), None), false),
            (800, 450)
        );
    }

    #[test]
    fn scale_height_only() {
        assert_eq!(
            calculate_scaled_dimensions((1600, 900), (None, Some(300)), false),
            (533, 300)
        );
    }

    #[test]
    fn smaller_source_is_not_upscaled() {
        assert_eq!(
            calculate_scaled_dimensions((200, 100), (Some(480), Some(480)), false),
            (200, 100)
        );
    }

    #[test]
    fn smaller_source_upscaled_when_allowed() {
        assert_eq!(
            calculate_scaled_dimensions((200, 100), (Some(480), Some(480)), true),
            (480, 240)
        );
    }

    #[test]
    fn no_bounds_keeps_source() {
        assert_eq!(
            calculate_scaled_dimensions((640, 480), (None, None), false),
            (640, 480)
        );
    }

    #[test]
    fn degenerate_source_is_returned_unchanged() {
        assert_eq!(
            calculate_scaled_dimensions((0, 480), (Some(100), None), false),
            (0, 480)
        );
    }

    #[test]
    fn extreme_aspect_never_collapses_to_zero() {
        // 10000x10 into 100 wide → height rounds to 0, clamped to 1
        assert_eq!(
            calculate_scaled_dimensions((10000, 10), (Some(100), None), false),
            (100, 1)
        );
    }

    // =========================================================================
    // srcset_width tests
    // =========================================================================

    #[test]
    fn srcset_width_uses_derivative_when_known() {
        assert_eq!(
            srcset_width(Some((2000, 1000)), (Some(480), Some(480)), false),
            Some(480)
        );
        assert_eq!(
            srcset_width(Some((300, 200)), (Some(480), Some(480)), false),
            Some(300)
        );
    }

    #[test]
    fn srcset_width_falls_back_to_bound() {
        assert_eq!(srcset_width(None, (Some(220), Some(220)), false), Some(220));
        assert_eq!(srcset_width(None, (None, Some(220)), false), None);
    }
}
