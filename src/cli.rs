// ============================================================================
// imgmerge CLI — merge images from the command line
// ============================================================================
//
// Usage examples:
//   imgmerge merge -f a.png -f b.png -o merged.png
//   imgmerge merge -f 'shots/*.png' -o sheet.jpg --cols 3 --gap 8 --no-divider
//   imgmerge merge -f a.png -f b.png -o out.png --orientation vertical --uniform-width 800
//   imgmerge config show
//
// Flags that are not given fall back to the saved settings, which fall back
// to the built-in defaults. --linear, --no-uniform and --no-timestamp clear
// saved values for one run.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};

use crate::config::{Align, MergeSettings, Orientation, Rgb};
use crate::error::Result;
use crate::io::{DEFAULT_QUALITY, stamp_output};
use crate::merge::merge_images;
use crate::{log_info, log_warn, logger};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Merge several images into one strip or grid.
#[derive(Parser, Debug)]
#[command(
    name = "imgmerge",
    version,
    about = "Merge images side by side, stacked, or on a grid",
    long_about = "Composite several images into a single output image, either as a\n\
                  horizontal/vertical strip or as a grid, with configurable gaps,\n\
                  divider lines, margins, alignment and background color.\n\n\
                  Example:\n  \
                  imgmerge merge --files img1.jpg --files img2.jpg --output result.jpg"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge image files into one output image.
    Merge(MergeArgs),
    /// Inspect or reset the saved settings.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Print the effective saved settings as JSON.
    Show,
    /// Reset saved settings to defaults (keeps output and add_timestamp).
    Reset,
    /// Print the settings file location.
    Path,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Image file to merge; repeat for each image. Glob patterns are expanded.
    #[arg(short, long = "files", value_name = "FILE", required = true, num_args = 1..)]
    pub files: Vec<String>,

    /// Output file path; the extension picks the format (png, jpg, bmp, tga, tiff).
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Arrangement direction of a strip.
    #[arg(long, value_enum)]
    pub orientation: Option<Orientation>,

    /// Space between neighbouring images, in pixels.
    #[arg(long, value_name = "PX")]
    pub gap: Option<u32>,

    /// Draw divider lines between images.
    #[arg(long, overrides_with = "no_divider")]
    pub divider: bool,

    /// Do not draw divider lines.
    #[arg(long, overrides_with = "divider")]
    pub no_divider: bool,

    /// Divider line thickness, in pixels.
    #[arg(long, value_name = "PX")]
    pub divider_thickness: Option<u32>,

    /// Divider color.
    #[arg(long, value_name = "R,G,B")]
    pub divider_color: Option<Rgb>,

    /// Background color.
    #[arg(long, value_name = "R,G,B")]
    pub bg_color: Option<Rgb>,

    /// Cross-axis alignment of smaller images.
    #[arg(long, value_enum)]
    pub align: Option<Align>,

    /// Scale every image to this height (horizontal strips only).
    #[arg(long, value_name = "PX", value_parser = clap::value_parser!(u32).range(1..))]
    pub uniform_height: Option<u32>,

    /// Scale every image to this width (vertical strips only).
    #[arg(long, value_name = "PX", value_parser = clap::value_parser!(u32).range(1..))]
    pub uniform_width: Option<u32>,

    /// Keep native sizes even if a uniform height or width is saved.
    #[arg(long, conflicts_with_all = ["uniform_height", "uniform_width"])]
    pub no_uniform: bool,

    /// Padding around the whole canvas, in pixels.
    #[arg(long, value_name = "PX")]
    pub margin: Option<u32>,

    /// Grid columns; enables grid mode.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub cols: Option<u32>,

    /// Grid rows; enables grid mode.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub rows: Option<u32>,

    /// Lay out a strip even if saved settings select a grid.
    #[arg(long, conflicts_with_all = ["cols", "rows"])]
    pub linear: bool,

    /// Append _YYYYmmdd_HHMMSS to the output file name.
    #[arg(long, overrides_with = "no_timestamp")]
    pub add_timestamp: bool,

    /// Use the output file name as given.
    #[arg(long, overrides_with = "add_timestamp")]
    pub no_timestamp: bool,

    /// JPEG quality (1-100).
    #[arg(short, long, default_value_t = DEFAULT_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: u8,

    /// Store the effective settings as the new defaults once the merge succeeded.
    #[arg(long)]
    pub save_config: bool,

    /// Print timing and log file information.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Resolve an `--x` / `--no-x` pair; clap keeps only the last one given.
fn toggle(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

impl MergeArgs {
    fn divider_flag(&self) -> Option<bool> {
        toggle(self.divider, self.no_divider)
    }

    fn timestamp_flag(&self) -> Option<bool> {
        toggle(self.add_timestamp, self.no_timestamp)
    }

    /// Overlay the given flags on `saved`.
    pub fn apply_to(&self, saved: &MergeSettings) -> MergeSettings {
        let mut s = saved.clone();
        if let Some(output) = &self.output {
            s.output = output.to_string_lossy().into_owned();
        }
        s.add_timestamp = self.timestamp_flag().unwrap_or(s.add_timestamp);
        s.orientation = self.orientation.unwrap_or(s.orientation);
        s.gap = self.gap.unwrap_or(s.gap);
        s.divider = self.divider_flag().unwrap_or(s.divider);
        s.divider_thickness = self.divider_thickness.unwrap_or(s.divider_thickness);
        s.divider_color = self.divider_color.unwrap_or(s.divider_color);
        s.bg_color = self.bg_color.unwrap_or(s.bg_color);
        s.align = self.align.unwrap_or(s.align);
        if self.no_uniform {
            s.uniform_height = None;
            s.uniform_width = None;
        }
        s.uniform_height = self.uniform_height.or(s.uniform_height);
        s.uniform_width = self.uniform_width.or(s.uniform_width);
        s.margin = self.margin.unwrap_or(s.margin);
        if self.linear {
            s.cols = None;
            s.rows = None;
        }
        s.cols = self.cols.or(s.cols);
        s.rows = self.rows.or(s.rows);
        s
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the parsed command and return an OS exit code.
/// `0` = success, `1` = any failure.
pub fn run(args: CliArgs) -> ExitCode {
    match args.command {
        Command::Merge(merge) => run_merge(&merge),
        Command::Config(cmd) => run_config(cmd),
    }
}

fn run_merge(args: &MergeArgs) -> ExitCode {
    let settings = args.apply_to(&MergeSettings::load());

    if settings.output.is_empty() {
        eprintln!("error: no output path given (use --output or save one with --save-config).");
        return ExitCode::FAILURE;
    }

    let files = resolve_inputs(&args.files);
    if files.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    let store = if args.save_config {
        match MergeSettings::settings_path() {
            Some(path) => Some(path),
            None => {
                eprintln!("error: no configuration directory could be determined.");
                return ExitCode::FAILURE;
            }
        }
    } else {
        None
    };

    let start = Instant::now();

    match merge_and_store(&files, &settings, args.quality, store.as_deref()) {
        Ok(path) => {
            println!("merged: {}", path.display());
            if args.verbose {
                println!("  {} images in {:.0}ms", files.len(), start.elapsed().as_secs_f64() * 1000.0);
                if let Some(log) = logger::log_path() {
                    println!("  log: {}", log.display());
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_config(cmd: ConfigCommand) -> ExitCode {
    match cmd {
        ConfigCommand::Show => match serde_json::to_string_pretty(&MergeSettings::load()) {
            Ok(text) => {
                println!("{}", text);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {}", e);
                ExitCode::FAILURE
            }
        },
        ConfigCommand::Reset => {
            let mut settings = MergeSettings::load();
            settings.reset_to_defaults();
            match settings.save() {
                Ok(path) => {
                    println!("settings reset: {}", path.display());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        ConfigCommand::Path => match MergeSettings::settings_path() {
            Some(path) => {
                println!("{}", path.display());
                ExitCode::SUCCESS
            }
            None => {
                eprintln!("error: no configuration directory could be determined.");
                ExitCode::FAILURE
            }
        },
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Merge, then write `settings` to `store` only if the merge succeeded.
fn merge_and_store(
    files: &[PathBuf],
    settings: &MergeSettings,
    quality: u8,
    store: Option<&Path>,
) -> Result<PathBuf> {
    let written = merge_images(files, &output_path(settings), &settings.layout(), quality)?;
    if let Some(path) = store {
        settings.save_to(path)?;
        log_info!("saved settings to {}", path.display());
    }
    Ok(written)
}

/// Output path from the settings, timestamped when requested.
fn output_path(settings: &MergeSettings) -> PathBuf {
    let output = PathBuf::from(&settings.output);
    if settings.add_timestamp {
        stamp_output(&output, chrono::Local::now())
    } else {
        output
    }
}

/// Expand glob patterns into an ordered list of paths.
///
/// Existing literal paths are taken as-is, as are paths without glob
/// characters so that a missing file is reported by the merge itself.
/// Duplicates are kept: the same image may appear twice in a merge.
pub fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() || !pattern.contains(['*', '?', '[']) {
            result.push(as_path.to_path_buf());
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let before = result.len();
                result.extend(entries.flatten());
                if result.len() == before {
                    log_warn!("pattern '{}' matched no files", pattern);
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                log_warn!("invalid glob '{}': {}", pattern, e);
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}
