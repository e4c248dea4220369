//! Merge several raster images into one strip or grid.
//!
//! The pipeline is split into pure planning ([`layout`]), pixel work
//! ([`render`]) and file handling ([`io`]); [`merge`] ties them together.

pub mod logger;

pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod layout;
pub mod merge;
pub mod render;

pub use config::{Align, LayoutConfig, MergeSettings, Orientation, Rgb};
pub use error::MergeError;
pub use layout::{GridSpec, LayoutPlan, Placement, Rect};
pub use merge::{compose, merge_images};
