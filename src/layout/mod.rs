// ============================================================================
// LAYOUT PLANNING — pure geometry, no pixel data
// ============================================================================
//
// The planners only see image dimensions. They decide the canvas size, the
// (possibly resized) rectangle of every image and the divider rectangles;
// `crate::render` turns that plan into pixels.

pub mod grid;
pub mod linear;

use crate::config::{Align, LayoutConfig};
use crate::error::{MergeError, Result};

/// Axis-aligned rectangle in canvas pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Where one input image lands. `rect` carries the size the image must be
/// resized to before it is pasted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    /// Position of the image in the input sequence.
    pub index: usize,
    pub rect: Rect,
}

/// Resolved grid shape (grid mode only).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GridSpec {
    pub columns: u32,
    pub rows: u32,
    pub cell_width: u32,
    pub cell_height: u32,
}

/// Complete geometry of one merge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutPlan {
    /// Final canvas dimensions.
    pub canvas: (u32, u32),
    /// One entry per input image, in input order.
    pub placements: Vec<Placement>,
    /// Filled in the divider color after every image is pasted.
    pub dividers: Vec<Rect>,
    pub grid: Option<GridSpec>,
}

/// Plan a merge of images with the given `(width, height)` sizes.
///
/// Grid mode is used when the config asks for columns or rows, the linear
/// strip otherwise.
pub fn plan(sizes: &[(u32, u32)], config: &LayoutConfig) -> Result<LayoutPlan> {
    if sizes.is_empty() {
        return Err(MergeError::InvalidConfig("at least one image is required".into()));
    }
    config.validate()?;

    if config.is_grid() {
        grid::plan_grid(sizes, config)
    } else {
        linear::plan_linear(sizes, config)
    }
}

/// Narrow a checked 64-bit extent to canvas pixels.
///
/// `None` (an overflowed intermediate) and values past `u32::MAX` both mean
/// the layout cannot be represented.
pub(crate) fn to_pixels(value: Option<u64>) -> Result<u32> {
    value
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| MergeError::InvalidConfig("layout exceeds the maximum canvas size".into()))
}

/// Offset of an item of length `extent` inside a span of length `available`.
pub(crate) fn align_offset(align: Align, available: u32, extent: u32) -> u32 {
    let slack = available.saturating_sub(extent);
    match align {
        Align::Start => 0,
        Align::Center => slack / 2,
        Align::End => slack,
    }
}
