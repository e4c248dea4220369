// ============================================================================
// MERGE CONFIGURATION — layout snapshot + persisted settings document
// ============================================================================
//
// `LayoutConfig` is the immutable value handed to a single merge call.
// `MergeSettings` is the flat key-value document stored between sessions;
// it only ever produces `LayoutConfig` snapshots, it is never passed around
// as a live handle.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MergeError, Result};
use crate::log_warn;

/// Axis along which a linear merge concatenates images.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Left to right.
    #[default]
    Horizontal,
    /// Top to bottom.
    Vertical,
}

/// Cross-axis alignment of images that are smaller than the widest/tallest one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Start,
    #[default]
    Center,
    End,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Orientation::Horizontal => "horizontal",
            Orientation::Vertical => "vertical",
        })
    }
}

impl fmt::Display for Align {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Align::Start => "start",
            Align::Center => "center",
            Align::End => "end",
        })
    }
}

// ============================================================================
// COLOR
// ============================================================================

/// Opaque RGB color. Stored as a JSON array `[r, g, b]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[i64; 3]", into = "[u8; 3]")]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const WHITE: Rgb = Rgb([255, 255, 255]);
    pub const DIVIDER_GREY: Rgb = Rgb([200, 200, 200]);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb([r, g, b])
    }

    /// Same color with a fully opaque alpha channel.
    pub fn to_rgba(self) -> image::Rgba<u8> {
        let [r, g, b] = self.0;
        image::Rgba([r, g, b, 255])
    }
}

impl TryFrom<[i64; 3]> for Rgb {
    type Error = String;

    fn try_from(channels: [i64; 3]) -> std::result::Result<Self, Self::Error> {
        let mut out = [0u8; 3];
        for (slot, value) in out.iter_mut().zip(channels) {
            *slot = u8::try_from(value)
                .map_err(|_| format!("color channel {} is outside 0-255", value))?;
        }
        Ok(Rgb(out))
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        c.0
    }
}

/// Parses `"R,G,B"`.
impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 3 {
            return Err(format!("expected R,G,B but got '{}'", s));
        }
        let mut channels = [0i64; 3];
        for (slot, part) in channels.iter_mut().zip(&parts) {
            *slot = part
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("'{}' is not an integer", part.trim()))?;
        }
        Rgb::try_from(channels)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "{},{},{}", r, g, b)
    }
}

// ============================================================================
// LAYOUT SNAPSHOT
// ============================================================================

/// Everything the planners and renderer need for one merge call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutConfig {
    pub orientation: Orientation,
    pub gap: u32,
    pub margin: u32,
    pub align: Align,
    pub divider: bool,
    pub divider_thickness: u32,
    pub divider_color: Rgb,
    pub background: Rgb,
    /// Only honoured in horizontal orientation.
    pub uniform_height: Option<u32>,
    /// Only honoured in vertical orientation.
    pub uniform_width: Option<u32>,
    pub cols: Option<u32>,
    pub rows: Option<u32>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::Horizontal,
            gap: 40,
            margin: 0,
            align: Align::Center,
            divider: true,
            divider_thickness: 4,
            divider_color: Rgb::DIVIDER_GREY,
            background: Rgb::WHITE,
            uniform_height: None,
            uniform_width: None,
            cols: None,
            rows: None,
        }
    }
}

impl LayoutConfig {
    /// Divider thickness that actually takes up space (0 when disabled).
    pub fn effective_divider_thickness(&self) -> u32 {
        if self.divider && self.divider_thickness > 0 {
            self.divider_thickness
        } else {
            0
        }
    }

    /// The uniform dimension matching the active orientation, if any.
    pub fn uniform_extent(&self) -> Option<u32> {
        match self.orientation {
            Orientation::Horizontal => self.uniform_height,
            Orientation::Vertical => self.uniform_width,
        }
    }

    /// Grid mode is selected as soon as either dimension is requested.
    pub fn is_grid(&self) -> bool {
        self.cols.is_some() || self.rows.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        if self.cols == Some(0) {
            return Err(MergeError::InvalidConfig("cols must be at least 1".into()));
        }
        if self.rows == Some(0) {
            return Err(MergeError::InvalidConfig("rows must be at least 1".into()));
        }
        if self.uniform_extent() == Some(0) {
            let name = match self.orientation {
                Orientation::Horizontal => "uniform_height",
                Orientation::Vertical => "uniform_width",
            };
            return Err(MergeError::InvalidConfig(format!("{} must be at least 1", name)));
        }
        Ok(())
    }
}

// ============================================================================
// PERSISTED SETTINGS
// ============================================================================

/// Settings that persist across sessions. Missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeSettings {
    pub output: String,
    pub add_timestamp: bool,
    pub orientation: Orientation,
    pub gap: u32,
    pub divider: bool,
    pub divider_thickness: u32,
    pub divider_color: Rgb,
    pub bg_color: Rgb,
    pub align: Align,
    pub uniform_height: Option<u32>,
    pub uniform_width: Option<u32>,
    pub margin: u32,
    pub cols: Option<u32>,
    pub rows: Option<u32>,
}

impl Default for MergeSettings {
    fn default() -> Self {
        let layout = LayoutConfig::default();
        Self {
            output: String::new(),
            add_timestamp: false,
            orientation: layout.orientation,
            gap: layout.gap,
            divider: layout.divider,
            divider_thickness: layout.divider_thickness,
            divider_color: layout.divider_color,
            bg_color: layout.background,
            align: layout.align,
            uniform_height: None,
            uniform_width: None,
            margin: layout.margin,
            cols: None,
            rows: None,
        }
    }
}

impl MergeSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/imgmerge/config.json  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\imgmerge\config.json
    /// On macOS:   ~/Library/Application Support/imgmerge/config.json
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .ok()?;
            return Some(PathBuf::from(appdata).join("imgmerge").join("config.json"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("imgmerge")
                    .join("config.json"),
            );
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
                .ok()?;
            Some(config_dir.join("imgmerge").join("config.json"))
        }
    }

    /// Load settings from the default location (defaults if unavailable).
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load settings from `path`. A missing or corrupt file yields defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                log_warn!("ignoring unreadable settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::settings_path().ok_or_else(|| MergeError::Settings {
            path: PathBuf::from("config.json"),
            reason: "no configuration directory could be determined".into(),
        })?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Write settings to `path`, keeping any keys already in the file that
    /// this document does not define.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let settings_err = |reason: String| MergeError::Settings {
            path: path.to_path_buf(),
            reason,
        };

        let mut document = std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str::<serde_json::Value>(&s).ok())
            .and_then(|v| match v {
                serde_json::Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_default();

        match serde_json::to_value(self).map_err(|e| settings_err(e.to_string()))? {
            serde_json::Value::Object(ours) => document.extend(ours),
            _ => return Err(settings_err("settings did not serialize to an object".into())),
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| settings_err(e.to_string()))?;
        }
        let text = serde_json::to_string_pretty(&serde_json::Value::Object(document))
            .map_err(|e| settings_err(e.to_string()))?;
        std::fs::write(path, text).map_err(|e| settings_err(e.to_string()))
    }

    /// Back to defaults, keeping the output path and timestamp preference.
    pub fn reset_to_defaults(&mut self) {
        let output = std::mem::take(&mut self.output);
        let add_timestamp = self.add_timestamp;
        *self = Self {
            output,
            add_timestamp,
            ..Self::default()
        };
    }

    /// Snapshot for a single merge call.
    pub fn layout(&self) -> LayoutConfig {
        LayoutConfig {
            orientation: self.orientation,
            gap: self.gap,
            margin: self.margin,
            align: self.align,
            divider: self.divider,
            divider_thickness: self.divider_thickness,
            divider_color: self.divider_color,
            background: self.bg_color,
            uniform_height: self.uniform_height,
            uniform_width: self.uniform_width,
            cols: self.cols,
            rows: self.rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("imgmerge-config-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn defaults_match_documented_values() {
        let s = MergeSettings::default();
        assert_eq!(s.gap, 40);
        assert!(s.divider);
        assert_eq!(s.divider_thickness, 4);
        assert_eq!(s.divider_color, Rgb::new(200, 200, 200));
        assert_eq!(s.bg_color, Rgb::new(255, 255, 255));
        assert_eq!(s.align, Align::Center);
        assert_eq!(s.margin, 0);
        assert_eq!(s.orientation, Orientation::Horizontal);
        assert_eq!(s.layout(), LayoutConfig::default());
    }

    #[test]
    fn rgb_parses_and_rejects_out_of_range() {
        assert_eq!("10, 20,30".parse::<Rgb>(), Ok(Rgb::new(10, 20, 30)));
        assert!("256,0,0".parse::<Rgb>().is_err());
        assert!("-1,0,0".parse::<Rgb>().is_err());
        assert!("1,2".parse::<Rgb>().is_err());
        assert!(Rgb::try_from([0, 300, 0]).is_err());
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let s: MergeSettings =
            serde_json::from_str(r#"{"gap": 8, "align": "end", "bg_color": [0, 0, 0]}"#).unwrap();
        assert_eq!(s.gap, 8);
        assert_eq!(s.align, Align::End);
        assert_eq!(s.bg_color, Rgb::new(0, 0, 0));
        assert_eq!(s.divider_thickness, 4);
        assert!(s.divider);
    }

    #[test]
    fn corrupt_or_missing_file_yields_defaults() {
        let path = scratch_file("config.json");
        assert_eq!(MergeSettings::load_from(&path), MergeSettings::default());

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(MergeSettings::load_from(&path), MergeSettings::default());

        std::fs::write(&path, r#"{"divider_color": [999, 0, 0]}"#).unwrap();
        assert_eq!(MergeSettings::load_from(&path), MergeSettings::default());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn save_preserves_unknown_keys_and_round_trips() {
        let path = scratch_file("config.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"theme": "dark", "gap": 1}"#).unwrap();

        let settings = MergeSettings {
            gap: 12,
            cols: Some(3),
            ..MergeSettings::default()
        };
        settings.save_to(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
        assert_eq!(raw["gap"], 12);
        assert_eq!(raw["divider_color"], serde_json::json!([200, 200, 200]));
        assert_eq!(MergeSettings::load_from(&path), settings);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn reset_keeps_output_and_timestamp() {
        let mut s = MergeSettings {
            output: "out/merged.png".into(),
            add_timestamp: true,
            gap: 0,
            rows: Some(2),
            ..MergeSettings::default()
        };
        s.reset_to_defaults();
        assert_eq!(s.output, "out/merged.png");
        assert!(s.add_timestamp);
        assert_eq!(s.gap, 40);
        assert_eq!(s.rows, None);
    }

    #[test]
    fn uniform_extent_follows_orientation() {
        let mut cfg = LayoutConfig {
            uniform_height: Some(50),
            uniform_width: Some(70),
            ..LayoutConfig::default()
        };
        assert_eq!(cfg.uniform_extent(), Some(50));
        cfg.orientation = Orientation::Vertical;
        assert_eq!(cfg.uniform_extent(), Some(70));
    }

    #[test]
    fn effective_divider_is_zero_when_disabled() {
        let mut cfg = LayoutConfig::default();
        assert_eq!(cfg.effective_divider_thickness(), 4);
        cfg.divider = false;
        assert_eq!(cfg.effective_divider_thickness(), 0);
        cfg.divider = true;
        cfg.divider_thickness = 0;
        assert_eq!(cfg.effective_divider_thickness(), 0);
    }

    #[test]
    fn validate_rejects_zero_grid_and_uniform() {
        let cfg = LayoutConfig {
            cols: Some(0),
            ..LayoutConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(MergeError::InvalidConfig(_))));
        let cfg = LayoutConfig {
            uniform_height: Some(0),
            ..LayoutConfig::default()
        };
        assert!(cfg.validate().is_err());
        // Uniform width is ignored while horizontal.
        let cfg = LayoutConfig {
            uniform_width: Some(0),
            ..LayoutConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }
}
