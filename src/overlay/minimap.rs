//! Mini-map panel.
//!
//! The whole track is drawn as a muted trace, the portion already
//! travelled as an accent overlay, and the current position as a marker
//! dot. The lat/lon projection is fixed per layer from the track's
//! bounding box; each frame only moves the progress cut and the marker.

use crate::foundation::core::{BezPath, Circle, Point, RoundedRect, Vec2};
use crate::foundation::error::TrackburnResult;
use crate::overlay::options::OverlayOptions;
use crate::overlay::raster::{Painter, Raster, Rgba8, Surface};
use crate::track::model::GeoBounds;

const PLATE: Rgba8 = [16, 18, 24, 255];
const TRACE: Rgba8 = [205, 210, 220, 165];
const PROGRESS: Rgba8 = [255, 149, 0, 255];
const MARKER_RING: Rgba8 = [255, 255, 255, 255];
const MARKER_CORE: Rgba8 = [236, 70, 56, 255];

const MAP_PADDING: f64 = 14.0;
const PLATE_CORNER_RADIUS: f64 = 10.0;
const TRACE_HALF_WIDTH: f64 = 1.6;
const PROGRESS_HALF_WIDTH: f64 = 2.2;

/// Uniform-scale mapping from geographic coordinates to panel pixels.
///
/// The track bounding box is fitted inside the padded panel preserving
/// the degree aspect ratio and centered on the leftover axis. A
/// degenerate box (single point, or all points on one meridian or
/// parallel) collapses to the panel center instead of dividing by zero.
#[derive(Clone, Copy, Debug)]
pub(crate) struct MapProjection {
    min_lon: f64,
    max_lat: f64,
    scale: f64,
    x0: f64,
    y0: f64,
}

impl MapProjection {
    pub(crate) fn new(bounds: &GeoBounds, width: u32, height: u32, padding: f64) -> Self {
        let usable_w = (f64::from(width) - 2.0 * padding).max(1.0);
        let usable_h = (f64::from(height) - 2.0 * padding).max(1.0);
        let lon_span = bounds.lon_span();
        let lat_span = bounds.lat_span();
        let sx = if lon_span > 0.0 { usable_w / lon_span } else { f64::INFINITY };
        let sy = if lat_span > 0.0 { usable_h / lat_span } else { f64::INFINITY };
        let mut scale = sx.min(sy);
        if !scale.is_finite() {
            scale = 0.0;
        }
        Self {
            min_lon: bounds.min_lon,
            max_lat: bounds.max_lat,
            scale,
            x0: padding + (usable_w - lon_span * scale) / 2.0,
            y0: padding + (usable_h - lat_span * scale) / 2.0,
        }
    }

    /// Panel pixel for a geographic position. North is up.
    pub(crate) fn project(&self, lat: f64, lon: f64) -> Point {
        Point::new(
            self.x0 + (lon - self.min_lon) * self.scale,
            self.y0 + (self.max_lat - lat) * self.scale,
        )
    }
}

/// Projects every track point once, in track order.
pub(crate) fn project_trace(
    points: impl Iterator<Item = (f64, f64)>,
    projection: &MapProjection,
) -> Vec<Point> {
    points.map(|(lat, lon)| projection.project(lat, lon)).collect()
}

/// Renders one mini-map frame. `current` is the index of the sample in
/// effect, or `None` before the first timestamp (or on untimed tracks),
/// in which case only the static trace is drawn.
pub(crate) fn draw(
    painter: &mut Painter,
    options: &OverlayOptions,
    trace: &[Point],
    current: Option<usize>,
) -> TrackburnResult<Raster> {
    let width = options.mini_map.width_px;
    let height = options.mini_map.height_px;
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
        fill_polyline(s, trace, TRACE_HALF_WIDTH, TRACE);
        if let Some(i) = current {
            let i = i.min(trace.len().saturating_sub(1));
            fill_polyline(s, &trace[..=i], PROGRESS_HALF_WIDTH, PROGRESS);
            s.fill(&Circle::new(trace[i], 6.0), MARKER_RING);
            s.fill(&Circle::new(trace[i], 4.0), MARKER_CORE);
        }
    })
}

/// Fills a polyline as per-segment quads with round joints. There is no
/// stroking in the fill-only pipeline, so width comes from geometry.
fn fill_polyline(s: &mut Surface<'_>, points: &[Point], half_w: f64, color: Rgba8) {
    for pair in points.windows(2) {
        if let Some(quad) = segment_quad(pair[0], pair[1], half_w) {
            s.fill_path(&quad, color);
        }
    }
    for p in points {
        s.fill(&Circle::new(*p, half_w), color);
    }
}

/// Quad spanning a segment, offset `half_w` to each side. `None` when the
/// endpoints coincide and no direction exists.
fn segment_quad(p: Point, q: Point, half_w: f64) -> Option<BezPath> {
    let d = q - p;
    let len = d.hypot();
    if len < 1e-6 {
        return None;
    }
    let n = Vec2::new(-d.y, d.x) * (half_w / len);
    let mut path = BezPath::new();
    path.move_to(p - n);
    path.line_to(q - n);
    path.line_to(q + n);
    path.line_to(p + n);
    path.close_path();
    Some(path)
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/minimap.rs"]
mod tests;
