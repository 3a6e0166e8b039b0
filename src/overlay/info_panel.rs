//! Info panel.
//!
//! A rounded plate listing the current speed, altitude, position, and
//! track clock as label/value rows. The row set is fixed per job: a
//! datum the whole track lacks (altitude, typically) drops its row
//! instead of rendering a dead placeholder, so the panel height never
//! changes between frames.

use crate::foundation::core::{Point, RoundedRect};
use crate::foundation::error::TrackburnResult;
use crate::overlay::options::{InfoPanelOptions, OverlayOptions};
use crate::overlay::raster::{Painter, Raster, Rgba8};
use crate::overlay::text::{TextBrush, TextEngine};
use crate::track::model::{Track, TrackPoint};

const PLATE: Rgba8 = [16, 18, 24, 255];
const LABEL_BRUSH: TextBrush = TextBrush::rgba(162, 170, 182, 255);
const VALUE_BRUSH: TextBrush = TextBrush::rgba(244, 246, 250, 255);

const PANEL_PADDING: f64 = 12.0;
const PLATE_CORNER_RADIUS: f64 = 10.0;

/// One row of the info panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum InfoLine {
    /// Current speed in the displayed unit.
    Speed,
    /// Current altitude in meters.
    Altitude,
    /// Current latitude/longitude in decimal degrees.
    Coordinates,
    /// Current track clock, UTC.
    Time,
}

impl InfoLine {
    fn label(self) -> &'static str {
        match self {
            InfoLine::Speed => "Speed",
            InfoLine::Altitude => "Altitude",
            InfoLine::Coordinates => "Position",
            InfoLine::Time => "Time",
        }
    }
}

/// Per-frame inputs to the panel values.
pub(crate) struct InfoState<'a> {
    /// Speed in the displayed unit, when defined at this instant.
    pub(crate) speed_display: Option<f64>,
    /// Short unit label appended to the speed value.
    pub(crate) unit_label: &'static str,
    /// Sample in effect at this instant (hold-last), if any.
    pub(crate) point: Option<&'a TrackPoint>,
}

/// Rows this job will render, in top-to-bottom order. Computed once per
/// layer so the panel keeps one height for the whole clip.
pub(crate) fn panel_lines(options: &InfoPanelOptions, track: &Track) -> Vec<InfoLine> {
    let mut lines = Vec::new();
    if options.show_speed {
        lines.push(InfoLine::Speed);
    }
    if options.show_altitude && track.points().iter().any(|p| p.altitude.is_some()) {
        lines.push(InfoLine::Altitude);
    }
    if options.show_coordinates {
        lines.push(InfoLine::Coordinates);
    }
    if options.show_time {
        lines.push(InfoLine::Time);
    }
    lines
}

/// Row pitch derived from the body font size.
pub(crate) fn line_height_px(font_size_px: f32) -> f64 {
    (f64::from(font_size_px) * 1.55).ceil()
}

/// Panel height for `lines` rows. Zero rows means a zero-height panel.
pub(crate) fn panel_height_px(lines: usize, font_size_px: f32) -> u32 {
    if lines == 0 {
        return 0;
    }
    (PANEL_PADDING * 2.0 + line_height_px(font_size_px) * lines as f64).ceil() as u32
}

/// Value text for one row at one instant. Missing data renders as `--`.
pub(crate) fn line_value(line: InfoLine, state: &InfoState<'_>) -> String {
    match line {
        InfoLine::Speed => match state.speed_display {
            Some(v) => format!("{v:.1} {}", state.unit_label),
            None => "--".to_string(),
        },
        InfoLine::Altitude => match state.point.and_then(|p| p.altitude) {
            Some(alt) => format!("{alt:.0} m"),
            None => "--".to_string(),
        },
        InfoLine::Coordinates => match state.point {
            Some(p) => format!("{:.5}, {:.5}", p.lat, p.lon),
            None => "--".to_string(),
        },
        InfoLine::Time => state
            .point
            .and_then(|p| p.timestamp_ms)
            .and_then(chrono::DateTime::from_timestamp_millis)
            .map(|dt| dt.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "--".to_string()),
    }
}

/// Renders one info panel frame for the rows picked by [`panel_lines`].
pub(crate) fn draw(
    painter: &mut Painter,
    text: &mut TextEngine,
    options: &OverlayOptions,
    lines: &[InfoLine],
    state: &InfoState<'_>,
) -> TrackburnResult<Raster> {
    let width = options.info_panel.width_px;
    let height = panel_height_px(lines.len(), options.font_size_px);
    if height == 0 {
        return Ok(Raster::empty());
    }

    let font = text.font().clone();
    let row_h = line_height_px(options.font_size_px);
    let label_size = options.font_size_px * 0.78;
    let mut rows = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let top = PANEL_PADDING + row_h * i as f64;
        let label = text.layout(line.label(), label_size, LABEL_BRUSH, None)?;
        let label_origin =
            Point::new(PANEL_PADDING, top + (row_h - f64::from(label.height())) / 2.0);
        let value = text.layout(&line_value(*line, state), options.font_size_px, VALUE_BRUSH, None)?;
        let value_origin = Point::new(
            f64::from(width) - PANEL_PADDING - f64::from(value.width()),
            top + (row_h - f64::from(value.height())) / 2.0,
        );
        rows.push((label, label_origin, value, value_origin));
    }

    let plate = {
        let mut c = PLATE;
        c[3] = (options.background_opacity * 255.0).round() as u8;
        c
    };

    painter.paint(width, height, |s| {
        s.fill(
            &RoundedRect::new(0.0, 0.0, f64::from(width), f64::from(height), PLATE_CORNER_RADIUS),
            plate,
        );
        for (label, label_origin, value, value_origin) in &rows {
            s.draw_layout(label, &font, *label_origin);
            s.draw_layout(value, &font, *value_origin);
        }
    })
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/info_panel.rs"]
mod tests;
