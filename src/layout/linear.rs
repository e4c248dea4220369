//! Single row / single column strips.

use super::{LayoutPlan, Placement, Rect, align_offset, to_pixels};
use crate::config::{LayoutConfig, Orientation};
use crate::error::Result;

/// Size of an image after the optional uniform pre-scale.
///
/// Horizontal strips scale every image to `uniform_height`, vertical strips
/// to `uniform_width`; the other side keeps the aspect ratio (rounded, never
/// below one pixel). Without a uniform extent the native size is kept.
pub fn prescaled_size(size: (u32, u32), config: &LayoutConfig) -> (u32, u32) {
    let (w, h) = size;
    match (config.orientation, config.uniform_extent()) {
        (Orientation::Horizontal, Some(target_h)) => {
            (scale_side(w, target_h, h), target_h)
        }
        (Orientation::Vertical, Some(target_w)) => {
            (target_w, scale_side(h, target_w, w))
        }
        (_, None) => size,
    }
}

/// `round(side * target / reference)`, at least 1.
fn scale_side(side: u32, target: u32, reference: u32) -> u32 {
    let scaled = side as f64 * target as f64 / reference.max(1) as f64;
    (scaled.round() as u32).max(1)
}

/// Map (main, cross) coordinates back to canvas x/y for the orientation.
fn oriented(orientation: Orientation, main: u32, cross: u32, main_len: u32, cross_len: u32) -> Rect {
    match orientation {
        Orientation::Horizontal => Rect::new(main, cross, main_len, cross_len),
        Orientation::Vertical => Rect::new(cross, main, cross_len, main_len),
    }
}

/// Lay the images out one after another along the orientation axis.
///
/// Between two neighbours the cursor advances by `gap / 2`, then by the
/// divider thickness (the divider is drawn there), then by the remaining
/// `gap - gap / 2`. Odd gaps therefore put the extra pixel after the divider.
///
/// Extents are summed in 64 bits; a strip longer than `u32::MAX` pixels is
/// an `InvalidConfig`.
pub fn plan_linear(sizes: &[(u32, u32)], config: &LayoutConfig) -> Result<LayoutPlan> {
    let orientation = config.orientation;
    let margin = config.margin;
    let gap = config.gap;
    let divider = config.effective_divider_thickness();

    // (main, cross) extents after pre-scaling
    let extents: Vec<(u32, u32)> = sizes
        .iter()
        .map(|&s| {
            let (w, h) = prescaled_size(s, config);
            match orientation {
                Orientation::Horizontal => (w, h),
                Orientation::Vertical => (h, w),
            }
        })
        .collect();

    let n = extents.len();
    let gaps = n.saturating_sub(1) as u64;
    let content_main = extents
        .iter()
        .try_fold(0u64, |acc, &(m, _)| acc.checked_add(u64::from(m)));
    let content_cross = extents.iter().map(|&(_, c)| c).max().unwrap_or(0);

    let margins = 2 * u64::from(margin);
    let separators = gaps.checked_mul(u64::from(gap) + u64::from(divider));
    let main_extent = to_pixels(
        content_main
            .zip(separators)
            .and_then(|(c, s)| c.checked_add(s))
            .and_then(|v| v.checked_add(margins)),
    )?;
    let cross_extent = to_pixels(u64::from(content_cross).checked_add(margins))?;

    let mut placements = Vec::with_capacity(n);
    let mut dividers = Vec::with_capacity(if divider > 0 { gaps as usize } else { 0 });
    let mut cursor = margin;

    for (index, &(main_len, cross_len)) in extents.iter().enumerate() {
        let cross = margin + align_offset(config.align, content_cross, cross_len);
        placements.push(Placement {
            index,
            rect: oriented(orientation, cursor, cross, main_len, cross_len),
        });
        cursor += main_len;

        if index + 1 < n {
            let leading = gap / 2;
            cursor += leading;
            if divider > 0 {
                dividers.push(oriented(orientation, cursor, margin, divider, content_cross));
                cursor += divider;
            }
            cursor += gap - leading;
        }
    }

    let canvas = match orientation {
        Orientation::Horizontal => (main_extent, cross_extent),
        Orientation::Vertical => (cross_extent, main_extent),
    };

    Ok(LayoutPlan {
        canvas,
        placements,
        dividers,
        grid: None,
    })
}
