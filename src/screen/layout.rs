//! Pixel layout of every touchscreen view
//!
//! Layouts are JSON documents keyed like `fr-display` or `wind-compass`.
//! Three are bundled for common Pi screens and a custom file can be given
//! in the `[screen]` config section.

use std::fs;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ScreenConfig;
use crate::models::FlightRules;
use crate::{MetarError, Result};

/// Pixel position as `[x, y]`
pub type Coord = (i32, i32);

/// Bundled layouts by screen size
pub const BUNDLED: [(&str, &str); 3] = [
    ("320x240", include_str!("../../layouts/320x240.json")),
    ("480x320", include_str!("../../layouts/480x320.json")),
    ("800x480", include_str!("../../layouts/800x480.json")),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    /// Large screens show the raw report inline instead of a WX/RMK button
    pub large_display: bool,
    pub fonts: FontSizes,
    pub button: ButtonLayout,
    pub fr_display: FlightRulesOffsets,
    /// Center of the settings/cancel button
    pub util: Coord,
    pub main: MainLayout,
    #[serde(default)]
    pub wxrmk: Option<WxRmkLayout>,
    #[serde(default)]
    pub wxraw: Option<WxRawLayout>,
    pub select: SelectLayout,
    pub info: InfoLayout,
    pub quit: QuitLayout,
    pub error: ErrorLayout,
}

/// Font sizes in ProFont points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSizes {
    pub s1: u32,
    pub s2: u32,
    pub s3: u32,
    pub m1: u32,
    pub m2: u32,
    pub l1: u32,
    #[serde(default)]
    pub l2: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonLayout {
    pub radius: u32,
    pub outline: u32,
}

/// Horizontal nudge of the flight rules text so each category looks centered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightRulesOffsets {
    #[serde(rename = "VFR")]
    pub vfr: i32,
    #[serde(rename = "MVFR")]
    pub mvfr: i32,
    #[serde(rename = "IFR")]
    pub ifr: i32,
    #[serde(rename = "LIFR")]
    pub lifr: i32,
    #[serde(rename = "N/A")]
    pub unknown: i32,
}

impl FlightRulesOffsets {
    #[must_use]
    pub fn offset(&self, rules: Option<FlightRules>) -> i32 {
        match rules {
            Some(FlightRules::Vfr) => self.vfr,
            Some(FlightRules::Mvfr) => self.mvfr,
            Some(FlightRules::Ifr) => self.ifr,
            Some(FlightRules::Lifr) => self.lifr,
            None => self.unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MainLayout {
    /// Station and timestamp on one line
    #[serde(default)]
    pub title: Option<Coord>,
    #[serde(default)]
    pub clock: Option<Coord>,
    #[serde(default)]
    pub clock_label: Option<Coord>,
    #[serde(default)]
    pub station: Option<Coord>,
    #[serde(default)]
    pub timestamp: Option<Coord>,
    #[serde(default)]
    pub timestamp_label: Option<Coord>,
    pub flight_rules: Coord,
    pub wind_compass: Coord,
    pub wind_compass_radius: u32,
    pub wind_speed: Coord,
    pub wind_gust: Coord,
    pub temp: Coord,
    pub temp_stdv: Coord,
    pub dew: Coord,
    pub humid: Coord,
    pub altim: Coord,
    pub vis: Coord,
    /// Top left and bottom right corners
    pub cloud_graph: (Coord, Coord),
    /// WX/RMK button as `[x, y, width, height]`
    #[serde(default)]
    pub wxrmk: Option<(i32, i32, u32, u32)>,
    pub util_spacing: i32,
    /// `[top, width]` of the area cleared for the options bar
    pub util_back: (i32, u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WxRmkLayout {
    pub padding: i32,
    pub line_space: i32,
    pub col1: i32,
    pub col2: i32,
    pub wx_length: usize,
    pub rmk_length: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WxRawLayout {
    pub start: Coord,
    pub line_space: i32,
    pub wx_length: usize,
    pub raw: RawFonts,
}

/// Raw report text as `[font size, line length, padding]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFonts {
    /// Used when weather codes take space above the raw report
    pub small: (u32, usize, i32),
    pub large: (u32, usize, i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SelectLayout {
    pub row_up: i32,
    pub row_char: i32,
    pub row_down: i32,
    pub col_offset: i32,
    pub col_spacing: i32,
    pub yes: Coord,
    pub no: Coord,
}

impl SelectLayout {
    /// Center x of a station character column
    #[must_use]
    pub fn column_x(&self, col: usize) -> i32 {
        self.col_offset + col as i32 * self.col_spacing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InfoLayout {
    pub title_y: i32,
    pub name_y: i32,
    pub email_y: i32,
    pub url_y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct QuitLayout {
    pub text_y: i32,
    pub yes: Coord,
    pub no: Coord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLayout {
    pub line1: Coord,
    pub line2: Coord,
    pub refresh: Coord,
}

impl Layout {
    /// Parse a layout document
    pub fn from_json(text: &str) -> Result<Self> {
        let layout: Layout = serde_json::from_str(text)
            .map_err(|e| MetarError::config(format!("Invalid screen layout: {e}")))?;
        layout.validate()?;
        Ok(layout)
    }

    /// One of the bundled layouts, e.g. "480x320"
    pub fn bundled(size: &str) -> Result<Self> {
        let (_, text) = BUNDLED
            .iter()
            .find(|(name, _)| *name == size)
            .ok_or_else(|| {
                let known: Vec<&str> = BUNDLED.iter().map(|(name, _)| *name).collect();
                MetarError::config(format!(
                    "Unknown screen size '{size}'. Must be one of: {}",
                    known.join(", ")
                ))
            })?;
        Self::from_json(text)
    }

    /// The configured layout file, or the bundled layout for the configured size
    pub fn load(config: &ScreenConfig) -> Result<Self> {
        match &config.layout_file {
            Some(path) => {
                info!("Loading screen layout from {}", path.display());
                Self::from_json(&fs::read_to_string(path)?)
            }
            None => Self::bundled(&config.size),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MetarError::config("Screen layout size cannot be zero"));
        }
        if self.button.radius == 0 {
            return Err(MetarError::config("Button radius cannot be zero"));
        }
        if !self.large_display && self.wxrmk.is_none() {
            return Err(MetarError::config(
                "Small screen layouts need a wxrmk section",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use std::path::PathBuf;
    use tempdir::TempDir;

    #[rstest]
    #[case("320x240", 320, 240, false)]
    #[case("480x320", 480, 320, false)]
    #[case("800x480", 800, 480, true)]
    fn test_bundled_layouts_parse(
        #[case] size: &str,
        #[case] width: u32,
        #[case] height: u32,
        #[case] large: bool,
    ) {
        let layout = Layout::bundled(size).unwrap();
        assert_eq!((layout.width, layout.height), (width, height));
        assert_eq!(layout.large_display, large);
        assert_eq!(layout.wxraw.is_some(), large);
    }

    #[test]
    fn test_unknown_size() {
        let err = Layout::bundled("1024x600").unwrap_err();
        assert!(err.to_string().contains("320x240"));
    }

    #[test]
    fn test_flight_rules_offsets() {
        let layout = Layout::bundled("320x240").unwrap();
        assert_eq!(layout.fr_display.offset(Some(FlightRules::Ifr)), 8);
        assert_eq!(layout.fr_display.offset(None), 4);
    }

    #[test]
    fn test_select_columns() {
        let layout = Layout::bundled("320x240").unwrap();
        assert_eq!(layout.select.column_x(0), 40);
        assert_eq!(layout.select.column_x(3), 208);
    }

    #[test]
    fn test_load_custom_file() {
        let dir = TempDir::new("metar-layout").unwrap();
        let path: PathBuf = dir.path().join("custom.json");
        let mut file = fs::File::create(&path).unwrap();
        let text = BUNDLED[1].1.replace("\"large-display\": false", "\"large-display\": true");
        file.write_all(text.as_bytes()).unwrap();

        let config = ScreenConfig {
            layout_file: Some(path),
            ..ScreenConfig::default()
        };
        let layout = Layout::load(&config).unwrap();
        assert!(layout.large_display);
        assert_eq!(layout.width, 480);
    }

    #[test]
    fn test_small_layout_requires_wxrmk() {
        let mut layout = Layout::bundled("320x240").unwrap();
        layout.wxrmk = None;
        let text = serde_json::to_string(&layout).unwrap();
        assert!(Layout::from_json(&text).is_err());
    }
}
