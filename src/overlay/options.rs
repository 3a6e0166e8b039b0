//! Overlay configuration.
//!
//! Options are plain serde data with defaults tuned for 1080p footage.
//! Validation happens once at job submission; past that point the render
//! path treats every option value as trustworthy.

use std::path::PathBuf;

use crate::foundation::core::SpeedUnit;
use crate::foundation::error::{TrackburnError, TrackburnResult};
use crate::overlay::text::resolve_font_path;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Settings shared by all overlay panels plus the per-panel blocks.
pub struct OverlayOptions {
    /// Speed gauge configuration.
    #[serde(default)]
    pub gauge: GaugeOptions,
    /// Info panel configuration.
    #[serde(default)]
    pub info_panel: InfoPanelOptions,
    /// Mini-map configuration.
    #[serde(default)]
    pub mini_map: MiniMapOptions,
    /// Unit used for displayed speeds.
    #[serde(default)]
    pub speed_unit: SpeedUnit,
    /// Font file for panel text. Falls back to a host default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
    /// Base font size for panel body text, in pixels.
    #[serde(default = "default_font_size_px")]
    pub font_size_px: f32,
    /// Distance from the video edges to every panel, in pixels.
    #[serde(default = "default_margin_px")]
    pub margin_px: u32,
    /// Opacity of panel background plates, `0..=1`.
    #[serde(default = "default_background_opacity")]
    pub background_opacity: f32,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Speed gauge panel settings.
pub struct GaugeOptions {
    /// Whether the gauge is rendered.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Full-scale dial speed in the displayed unit.
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
    /// Side length of the square gauge panel, in pixels.
    #[serde(default = "default_gauge_size_px")]
    pub size_px: u32,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Info panel settings. Each `show_*` flag adds one line of text.
pub struct InfoPanelOptions {
    /// Whether the info panel is rendered.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Show the current speed line.
    #[serde(default = "default_true")]
    pub show_speed: bool,
    /// Show the current altitude line.
    #[serde(default = "default_true")]
    pub show_altitude: bool,
    /// Show the current latitude/longitude line.
    #[serde(default = "default_true")]
    pub show_coordinates: bool,
    /// Show the current track clock line.
    #[serde(default = "default_true")]
    pub show_time: bool,
    /// Panel width in pixels. Height follows the number of visible lines.
    #[serde(default = "default_info_width_px")]
    pub width_px: u32,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Mini-map panel settings.
pub struct MiniMapOptions {
    /// Whether the mini-map is rendered.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Panel width in pixels.
    #[serde(default = "default_map_side_px")]
    pub width_px: u32,
    /// Panel height in pixels.
    #[serde(default = "default_map_side_px")]
    pub height_px: u32,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            gauge: GaugeOptions::default(),
            info_panel: InfoPanelOptions::default(),
            mini_map: MiniMapOptions::default(),
            speed_unit: SpeedUnit::default(),
            font_path: None,
            font_size_px: default_font_size_px(),
            margin_px: default_margin_px(),
            background_opacity: default_background_opacity(),
        }
    }
}

impl Default for GaugeOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            max_speed: default_max_speed(),
            size_px: default_gauge_size_px(),
        }
    }
}

impl Default for InfoPanelOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            show_speed: true,
            show_altitude: true,
            show_coordinates: true,
            show_time: true,
            width_px: default_info_width_px(),
        }
    }
}

impl Default for MiniMapOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            width_px: default_map_side_px(),
            height_px: default_map_side_px(),
        }
    }
}

impl OverlayOptions {
    /// The panels requested by these options, in compositing order.
    pub fn enabled_panel_count(&self) -> usize {
        [self.gauge.enabled, self.info_panel.enabled, self.mini_map.enabled]
            .into_iter()
            .filter(|on| *on)
            .count()
    }

    /// Validate option ranges and resolve the overlay font.
    pub fn validate(&self) -> TrackburnResult<()> {
        if self.enabled_panel_count() == 0 {
            return Err(TrackburnError::validation(
                "at least one overlay panel must be enabled",
            ));
        }
        if !self.gauge.max_speed.is_finite() || self.gauge.max_speed <= 0.0 {
            return Err(TrackburnError::validation("gauge max_speed must be finite and > 0"));
        }
        for (name, value) in [
            ("gauge size_px", self.gauge.size_px),
            ("info_panel width_px", self.info_panel.width_px),
            ("mini_map width_px", self.mini_map.width_px),
            ("mini_map height_px", self.mini_map.height_px),
        ] {
            if !(64..=2048).contains(&value) {
                return Err(TrackburnError::validation(format!(
                    "{name} must be within 64..=2048 pixels",
                )));
            }
        }
        if !self.font_size_px.is_finite() || !(6.0..=96.0).contains(&self.font_size_px) {
            return Err(TrackburnError::validation(
                "font_size_px must be within 6..=96 pixels",
            ));
        }
        if self.margin_px > 512 {
            return Err(TrackburnError::validation("margin_px must be <= 512 pixels"));
        }
        if !self.background_opacity.is_finite()
            || !(0.0..=1.0).contains(&self.background_opacity)
        {
            return Err(TrackburnError::validation(
                "background_opacity must be within 0..=1",
            ));
        }
        resolve_font_path(self.font_path.as_deref())?;
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_max_speed() -> f64 {
    60.0
}

fn default_gauge_size_px() -> u32 {
    220
}

fn default_info_width_px() -> u32 {
    280
}

fn default_map_side_px() -> u32 {
    240
}

fn default_font_size_px() -> f32 {
    18.0
}

fn default_margin_px() -> u32 {
    16
}

fn default_background_opacity() -> f32 {
    0.55
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/options.rs"]
mod tests;
