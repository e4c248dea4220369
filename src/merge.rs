// ============================================================================
// MERGE PIPELINE — validate → load → plan → resize → render → save
// ============================================================================

use std::path::{Path, PathBuf};
use std::time::Instant;

use image::imageops::{self, FilterType};
use image::{RgbImage, RgbaImage};

use crate::config::LayoutConfig;
use crate::error::{MergeError, Result};
use crate::layout::{self, LayoutPlan};
use crate::{io, log_err, log_info, render};

/// Composite already-decoded images into a flattened canvas.
///
/// The input images are never modified; images whose size differs from
/// their planned cell are resized into new buffers (Lanczos3).
pub fn compose(images: &[RgbaImage], config: &LayoutConfig) -> Result<RgbImage> {
    let sizes: Vec<(u32, u32)> = images.iter().map(|img| img.dimensions()).collect();
    let plan = layout::plan(&sizes, config)?;
    log_plan(&plan);

    let fitted = fit_to_plan(images, &plan);
    render::render(&plan, &fitted, config.background, config.divider_color)
}

/// Resize each image to its placement size, in placement order.
fn fit_to_plan(images: &[RgbaImage], plan: &LayoutPlan) -> Vec<RgbaImage> {
    plan.placements
        .iter()
        .map(|p| {
            let img = &images[p.index];
            let (w, h) = p.rect.size();
            if img.dimensions() == (w, h) {
                img.clone()
            } else {
                imageops::resize(img, w, h, FilterType::Lanczos3)
            }
        })
        .collect()
}

fn log_plan(plan: &LayoutPlan) {
    match plan.grid {
        Some(g) => {
            log_info!(
                "grid {}x{} of {}x{} cells, canvas {}x{}",
                g.columns,
                g.rows,
                g.cell_width,
                g.cell_height,
                plan.canvas.0,
                plan.canvas.1
            );
        }
        None => {
            log_info!(
                "strip of {} images, canvas {}x{}",
                plan.placements.len(),
                plan.canvas.0,
                plan.canvas.1
            );
        }
    }
}

/// Merge the image files into one output file and return the written path.
///
/// Every input is checked for existence before anything is decoded, and the
/// output is only written once composition succeeded.
pub fn merge_images(
    files: &[PathBuf],
    output: &Path,
    config: &LayoutConfig,
    quality: u8,
) -> Result<PathBuf> {
    let start = Instant::now();
    log_info!("merging {} files into {}", files.len(), output.display());

    let result = run_merge(files, output, config, quality);
    match &result {
        Ok(path) => {
            log_info!(
                "wrote {} ({:.0}ms)",
                path.display(),
                start.elapsed().as_secs_f64() * 1000.0
            );
        }
        Err(e) => {
            log_err!("merge failed: {}", e);
        }
    }
    result
}

fn run_merge(
    files: &[PathBuf],
    output: &Path,
    config: &LayoutConfig,
    quality: u8,
) -> Result<PathBuf> {
    if files.is_empty() {
        return Err(MergeError::InvalidConfig("no input files given".into()));
    }
    config.validate()?;
    if let Some(missing) = files.iter().find(|f| !f.exists()) {
        return Err(MergeError::InputMissing(missing.clone()));
    }

    let images = files
        .iter()
        .map(|f| io::load_image(f))
        .collect::<Result<Vec<_>>>()?;

    let canvas = compose(&images, config)?;
    io::save_canvas(&canvas, output, quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Orientation, Rgb};
    use image::Rgba;

    fn solid(w: u32, h: u32, c: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(c))
    }

    #[test]
    fn red_and_blue_with_divider() {
        let images = [solid(100, 100, [255, 0, 0, 255]), solid(100, 100, [0, 0, 255, 255])];
        let out = compose(&images, &LayoutConfig::default()).unwrap();
        assert_eq!(out.dimensions(), (244, 100));
        assert_eq!(out.get_pixel(99, 50).0, [255, 0, 0]);
        assert_eq!(out.get_pixel(110, 50).0, [255, 255, 255]);
        assert_eq!(out.get_pixel(120, 50).0, [200, 200, 200]);
        assert_eq!(out.get_pixel(123, 50).0, [200, 200, 200]);
        assert_eq!(out.get_pixel(124, 50).0, [255, 255, 255]);
        assert_eq!(out.get_pixel(144, 50).0, [0, 0, 255]);
    }

    #[test]
    fn single_image_identity() {
        let cfg = LayoutConfig {
            gap: 0,
            margin: 0,
            divider: false,
            ..LayoutConfig::default()
        };
        let out = compose(&[solid(31, 17, [1, 2, 3, 255])], &cfg).unwrap();
        assert_eq!(out.dimensions(), (31, 17));
        assert_eq!(out.get_pixel(30, 16).0, [1, 2, 3]);
    }

    #[test]
    fn transparent_source_shows_background() {
        let cfg = LayoutConfig {
            background: Rgb::new(10, 20, 30),
            ..LayoutConfig::default()
        };
        let out = compose(&[solid(4, 4, [255, 255, 255, 0])], &cfg).unwrap();
        assert_eq!(out.get_pixel(2, 2).0, [10, 20, 30]);
    }

    #[test]
    fn uniform_width_resizes_vertical_strip() {
        let cfg = LayoutConfig {
            orientation: Orientation::Vertical,
            uniform_width: Some(20),
            gap: 0,
            divider: false,
            ..LayoutConfig::default()
        };
        let images = [solid(40, 20, [0, 255, 0, 255]), solid(10, 10, [0, 0, 0, 255])];
        let out = compose(&images, &cfg).unwrap();
        assert_eq!(out.dimensions(), (20, 10 + 20));
        // the originals are untouched
        assert_eq!(images[0].dimensions(), (40, 20));
    }

    #[test]
    fn grid_stretches_every_cell() {
        let cfg = LayoutConfig {
            cols: Some(2),
            gap: 0,
            divider: false,
            ..LayoutConfig::default()
        };
        let images = [solid(8, 4, [255, 0, 0, 255]), solid(4, 8, [0, 0, 255, 255])];
        let out = compose(&images, &cfg).unwrap();
        assert_eq!(out.dimensions(), (16, 8));
        // second image stretched to 8x8: its corner is blue, not background
        let corner = out.get_pixel(15, 0).0;
        assert!(corner[2] > 200 && corner[0] < 50, "{:?}", corner);
    }

    #[test]
    fn grid_conflict_surfaces() {
        let cfg = LayoutConfig {
            cols: Some(2),
            rows: Some(1),
            ..LayoutConfig::default()
        };
        let images = vec![solid(2, 2, [0, 0, 0, 255]); 3];
        assert!(matches!(
            compose(&images, &cfg),
            Err(MergeError::ConfigConflict { .. })
        ));
    }

    #[test]
    fn missing_file_aborts_before_decoding() {
        let out = std::env::temp_dir().join(format!("imgmerge-{}.png", uuid::Uuid::new_v4()));
        let files = vec![PathBuf::from("no/such/file.png")];
        let err = merge_images(&files, &out, &LayoutConfig::default(), 90).unwrap_err();
        assert!(matches!(err, MergeError::InputMissing(p) if p == files[0]));
        assert!(!out.exists());
    }
}
