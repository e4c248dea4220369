// ============================================================================
// RENDERER — paint a LayoutPlan onto an opaque canvas
// ============================================================================

use image::{DynamicImage, Rgba, RgbImage, RgbaImage};

use crate::config::Rgb;
use crate::error::{MergeError, Result};
use crate::layout::{LayoutPlan, Rect};

/// Render `plan` with already-resized `images` (indexed like the input).
///
/// The canvas starts as opaque `background`; images are alpha-composited in
/// placement order, dividers are filled last so they always sit on top.
/// Anything outside the canvas is clipped.
pub fn render(
    plan: &LayoutPlan,
    images: &[RgbaImage],
    background: Rgb,
    divider_color: Rgb,
) -> Result<RgbImage> {
    let (width, height) = plan.canvas;
    let mut canvas = RgbaImage::from_pixel(width, height, background.to_rgba());

    for placement in &plan.placements {
        let image = images.get(placement.index).ok_or_else(|| {
            MergeError::InvalidConfig(format!("no image for placement {}", placement.index))
        })?;
        if image.dimensions() != placement.rect.size() {
            return Err(MergeError::InvalidConfig(format!(
                "image {} is {}x{} but its cell is {}x{}",
                placement.index,
                image.width(),
                image.height(),
                placement.rect.width,
                placement.rect.height
            )));
        }
        paste_over(&mut canvas, image, placement.rect.x, placement.rect.y);
    }

    let fill = divider_color.to_rgba();
    for rect in &plan.dividers {
        fill_rect(&mut canvas, rect, fill);
    }

    Ok(flatten(canvas))
}

/// Source-over composite of `top` onto `canvas` at (`x`, `y`), clipped.
pub fn paste_over(canvas: &mut RgbaImage, top: &RgbaImage, x: u32, y: u32) {
    let (cw, ch) = canvas.dimensions();
    if x >= cw || y >= ch {
        return;
    }
    let w = top.width().min(cw - x);
    let h = top.height().min(ch - y);

    for dy in 0..h {
        for dx in 0..w {
            let src = *top.get_pixel(dx, dy);
            let dst = canvas.get_pixel_mut(x + dx, y + dy);
            *dst = blend_over(*dst, src);
        }
    }
}

/// Blend one pixel over an opaque base; the result stays opaque.
///
/// Integer round-to-nearest, `(t*a + b*(255-a) + 127) / 255` per channel.
/// `imageops::overlay` blends in floats and does not reproduce this rounding.
fn blend_over(base: Rgba<u8>, top: Rgba<u8>) -> Rgba<u8> {
    let a = top[3] as u32;
    if a == 0 {
        return base;
    }
    if a == 255 {
        return top;
    }
    let mix = |t: u8, b: u8| ((t as u32 * a + b as u32 * (255 - a) + 127) / 255) as u8;
    Rgba([mix(top[0], base[0]), mix(top[1], base[1]), mix(top[2], base[2]), 255])
}

fn fill_rect(canvas: &mut RgbaImage, rect: &Rect, color: Rgba<u8>) {
    let x_end = rect.right().min(canvas.width());
    let y_end = rect.bottom().min(canvas.height());
    for y in rect.y..y_end {
        for x in rect.x..x_end {
            canvas.put_pixel(x, y, color);
        }
    }
}

/// Drop the alpha channel; the canvas is opaque by construction.
fn flatten(canvas: RgbaImage) -> RgbImage {
    DynamicImage::ImageRgba8(canvas).into_rgb8()
}
