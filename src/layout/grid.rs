//! Row-major grids of uniformly sized cells.
//!
//! Every image is stretched to the largest width and the largest height seen
//! in the batch; unlike the linear strip, aspect ratio is not preserved.

use super::{GridSpec, LayoutPlan, Placement, Rect, to_pixels};
use crate::config::LayoutConfig;
use crate::error::{MergeError, Result};

fn ceil_div(n: u32, d: u32) -> u32 {
    n.div_ceil(d.max(1))
}

/// Resolve `(columns, rows)` for `count` images.
///
/// A missing dimension is the ceiling of `count` over the given one. With
/// neither given the grid falls back to `floor(sqrt(count))` columns. Two
/// explicit dimensions that cannot hold every image are a conflict.
pub fn resolve_grid(count: usize, cols: Option<u32>, rows: Option<u32>) -> Result<(u32, u32)> {
    let n = count as u32;
    let square = || {
        let columns = ((n as f64).sqrt().floor() as u32).max(1);
        (columns, ceil_div(n, columns))
    };

    let (columns, resolved_rows) = match (cols, rows) {
        (Some(c), Some(r)) => (c, r),
        (Some(c), None) => (c, ceil_div(n, c)),
        (None, Some(r)) => (ceil_div(n, r), r),
        (None, None) => square(),
    };

    if (columns as u64) * (resolved_rows as u64) >= n as u64 {
        return Ok((columns, resolved_rows));
    }

    match (cols, rows) {
        (Some(c), None) => Ok((c, ceil_div(n, c))),
        (None, Some(r)) => Ok((ceil_div(n, r), r)),
        (None, None) => Ok(square()),
        (Some(c), Some(r)) => Err(MergeError::ConfigConflict {
            columns: c,
            rows: r,
            images: count,
        }),
    }
}

/// Lay the images out on a grid.
///
/// The horizontal step between cells is `cell + gap + divider` plus another
/// `divider` per column, so with dividers enabled the right-most and bottom
/// cells can run past the canvas edge computed below; the renderer clips.
/// Both the canvas and that overhang must fit in `u32` pixels, otherwise
/// the layout is an `InvalidConfig`.
pub fn plan_grid(sizes: &[(u32, u32)], config: &LayoutConfig) -> Result<LayoutPlan> {
    let (columns, rows) = resolve_grid(sizes.len(), config.cols, config.rows)?;

    let cell_width = sizes.iter().map(|s| s.0).max().unwrap_or(0);
    let cell_height = sizes.iter().map(|s| s.1).max().unwrap_or(0);

    let gap = u64::from(config.gap);
    let margin = u64::from(config.margin);
    let divider = config.effective_divider_thickness();
    let d = u64::from(divider);

    let (cw, ch) = (u64::from(cell_width), u64::from(cell_height));
    let step_x = cw + gap + 2 * d;
    let step_y = ch + gap + 2 * d;

    let canvas_w = to_pixels(axis_extent(columns, cw, gap + d, margin))?;
    let canvas_h = to_pixels(axis_extent(rows, ch, gap + d, margin))?;
    // Far edge of the last cell, including the doubled divider offset
    to_pixels(last_edge(columns, cw, step_x, margin))?;
    to_pixels(last_edge(rows, ch, step_y, margin))?;

    let mut placements = Vec::with_capacity(sizes.len());
    let mut dividers = Vec::new();

    for index in 0..sizes.len() {
        let row = index as u32 / columns;
        let col = index as u32 % columns;

        let x = to_pixels(Some(margin + u64::from(col) * step_x))?;
        let y = to_pixels(Some(margin + u64::from(row) * step_y))?;

        if divider > 0 && col + 1 < columns {
            dividers.push(Rect::new(x + cell_width, y, divider, cell_height));
        }
        if divider > 0 && row + 1 < rows {
            dividers.push(Rect::new(x, y + cell_height, cell_width, divider));
        }

        placements.push(Placement {
            index,
            rect: Rect::new(x, y, cell_width, cell_height),
        });
    }

    Ok(LayoutPlan {
        canvas: (canvas_w, canvas_h),
        placements,
        dividers,
        grid: Some(GridSpec {
            columns,
            rows,
            cell_width,
            cell_height,
        }),
    })
}

/// `count` cells of `cell` separated by `separator`, plus both margins.
fn axis_extent(count: u32, cell: u64, separator: u64, margin: u64) -> Option<u64> {
    let count = u64::from(count);
    count
        .checked_mul(cell)?
        .checked_add(count.saturating_sub(1).checked_mul(separator)?)?
        .checked_add(2 * margin)
}

fn last_edge(count: u32, cell: u64, step: u64, margin: u64) -> Option<u64> {
    u64::from(count.saturating_sub(1))
        .checked_mul(step)?
        .checked_add(margin + cell)
}
