//! Speed gauge panel.
//!
//! A circular dial sweeping from -120 to +120 degrees around twelve
//! o'clock, with tick marks at even speed divisions, a filled progress
//! band, a needle, and the numeric speed under the hub. Speeds above
//! full scale pin the needle at maximum deflection; an undefined speed
//! reads as zero with a placeholder numeric label.

use crate::foundation::core::{BezPath, Circle, Point, Vec2};
use crate::foundation::error::TrackburnResult;
use crate::overlay::options::OverlayOptions;
use crate::overlay::raster::{Painter, Raster, Rgba8};
use crate::overlay::text::{TextBrush, TextEngine};

/// Needle deflection at zero speed, degrees clockwise from twelve o'clock.
pub(crate) const SWEEP_START_DEG: f64 = -120.0;
/// Needle deflection at full scale.
pub(crate) const SWEEP_END_DEG: f64 = 120.0;

const DIAL_DIVISIONS: u32 = 6;

const PLATE: Rgba8 = [16, 18, 24, 255];
const TRACK_BAND: Rgba8 = [255, 255, 255, 48];
const PROGRESS_BAND: Rgba8 = [255, 149, 0, 255];
const TICK: Rgba8 = [226, 230, 238, 220];
const NEEDLE: Rgba8 = [236, 70, 56, 255];
const HUB: Rgba8 = [222, 226, 234, 255];
const HUB_CORE: Rgba8 = [38, 42, 50, 255];
const LABEL_BRUSH: TextBrush = TextBrush::rgba(196, 202, 212, 255);
const VALUE_BRUSH: TextBrush = TextBrush::rgba(244, 246, 250, 255);
const UNIT_BRUSH: TextBrush = TextBrush::rgba(162, 170, 182, 255);

/// Needle deflection for `speed` on a dial that tops out at `max_speed`.
/// `None` and negative speeds read as zero; overspeed clamps to full scale.
pub(crate) fn needle_angle_deg(speed: Option<f64>, max_speed: f64) -> f64 {
    let s = speed.unwrap_or(0.0).clamp(0.0, max_speed);
    SWEEP_START_DEG + (SWEEP_END_DEG - SWEEP_START_DEG) * (s / max_speed)
}

/// Unit vector for a dial angle, in raster coordinates (y grows downward).
pub(crate) fn dial_direction(angle_deg: f64) -> Vec2 {
    let rad = angle_deg.to_radians();
    Vec2::new(rad.sin(), -rad.cos())
}

/// Tick labels from zero to full scale at even divisions.
pub(crate) fn dial_labels(max_speed: f64) -> Vec<String> {
    (0..=DIAL_DIVISIONS)
        .map(|i| format!("{:.0}", max_speed * f64::from(i) / f64::from(DIAL_DIVISIONS)))
        .collect()
}

/// Closed band between two radii over `a0..a1` degrees, approximated with
/// 3-degree segments. Fill-only rendering has no arc stroking, so the band
/// is built as a polygon.
pub(crate) fn annulus_wedge(
    center: Point,
    r_inner: f64,
    r_outer: f64,
    a0: f64,
    a1: f64,
) -> BezPath {
    let steps = (((a1 - a0).abs() / 3.0).ceil() as usize).max(1);
    let angle_at = |i: usize| a0 + (a1 - a0) * (i as f64 / steps as f64);
    let mut path = BezPath::new();
    path.move_to(center + dial_direction(a0) * r_outer);
    for i in 1..=steps {
        path.line_to(center + dial_direction(angle_at(i)) * r_outer);
    }
    for i in (0..=steps).rev() {
        path.line_to(center + dial_direction(angle_at(i)) * r_inner);
    }
    path.close_path();
    path
}

/// Filled quad along the dial radius at `angle_deg`, spanning `r0..r1`.
fn radial_quad(center: Point, angle_deg: f64, r0: f64, r1: f64, half_w: f64) -> BezPath {
    let dir = dial_direction(angle_deg);
    let perp = Vec2::new(-dir.y, dir.x) * half_w;
    let p0 = center + dir * r0;
    let p1 = center + dir * r1;
    let mut path = BezPath::new();
    path.move_to(p0 - perp);
    path.line_to(p1 - perp);
    path.line_to(p1 + perp);
    path.line_to(p0 + perp);
    path.close_path();
    path
}

/// Tapered needle polygon with a short tail behind the hub.
fn needle_path(center: Point, angle_deg: f64, length: f64, half_w: f64) -> BezPath {
    let dir = dial_direction(angle_deg);
    let perp = Vec2::new(-dir.y, dir.x);
    let tail = center - dir * (length * 0.18);
    let tip = center + dir * length;
    let mut path = BezPath::new();
    path.move_to(tail + perp * half_w);
    path.line_to(tip + perp * (half_w * 0.3));
    path.line_to(tip - perp * (half_w * 0.3));
    path.line_to(tail - perp * half_w);
    path.close_path();
    path
}

/// Renders one gauge frame. `speed_display` is in the displayed unit.
pub(crate) fn draw(
    painter: &mut Painter,
    text: &mut TextEngine,
    options: &OverlayOptions,
    speed_display: Option<f64>,
) -> TrackburnResult<Raster> {
    let gauge = &options.gauge;
    let side = f64::from(gauge.size_px);
    let center = Point::new(side / 2.0, side / 2.0);
    let radius = side * 0.40;
    let font = text.font().clone();

    let label_size = (side * 0.072) as f32;
    let mut tick_texts = Vec::new();
    for (i, label) in dial_labels(gauge.max_speed).into_iter().enumerate() {
        let angle = SWEEP_START_DEG
            + (SWEEP_END_DEG - SWEEP_START_DEG) * (i as f64 / f64::from(DIAL_DIVISIONS));
        let layout = text.layout(&label, label_size, LABEL_BRUSH, None)?;
        let at = center + dial_direction(angle) * (radius * 0.56);
        let origin = Point::new(
            at.x - f64::from(layout.width()) / 2.0,
            at.y - f64::from(layout.height()) / 2.0,
        );
        tick_texts.push((layout, origin));
    }

    let value = match speed_display {
        Some(v) => format!("{v:.0}"),
        None => "--".to_string(),
    };
    let value_layout = text.layout(&value, (side * 0.16) as f32, VALUE_BRUSH, None)?;
    let value_origin = Point::new(
        center.x - f64::from(value_layout.width()) / 2.0,
        center.y + radius * 0.26,
    );
    let unit_layout =
        text.layout(options.speed_unit.label(), (side * 0.08) as f32, UNIT_BRUSH, None)?;
    let unit_origin = Point::new(
        center.x - f64::from(unit_layout.width()) / 2.0,
        value_origin.y + f64::from(value_layout.height()) + 2.0,
    );

    let needle_deg = needle_angle_deg(speed_display, gauge.max_speed);
    let plate = {
        let mut c = PLATE;
        c[3] = (options.background_opacity * 255.0).round() as u8;
        c
    };

    painter.paint(gauge.size_px, gauge.size_px, |s| {
        s.fill(&Circle::new(center, radius * 1.12), plate);
        s.fill_path(
            &annulus_wedge(center, radius * 0.80, radius, SWEEP_START_DEG, SWEEP_END_DEG),
            TRACK_BAND,
        );
        if needle_deg > SWEEP_START_DEG {
            s.fill_path(
                &annulus_wedge(center, radius * 0.80, radius, SWEEP_START_DEG, needle_deg),
                PROGRESS_BAND,
            );
        }
        for i in 0..=DIAL_DIVISIONS {
            let angle = SWEEP_START_DEG
                + (SWEEP_END_DEG - SWEEP_START_DEG) * (f64::from(i) / f64::from(DIAL_DIVISIONS));
            s.fill_path(&radial_quad(center, angle, radius * 0.66, radius * 0.77, 1.6), TICK);
        }
        for i in 0..DIAL_DIVISIONS {
            let angle = SWEEP_START_DEG
                + (SWEEP_END_DEG - SWEEP_START_DEG)
                    * ((f64::from(i) + 0.5) / f64::from(DIAL_DIVISIONS));
            s.fill_path(&radial_quad(center, angle, radius * 0.71, radius * 0.77, 0.9), TICK);
        }
        for (layout, origin) in &tick_texts {
            s.draw_layout(layout, &font, *origin);
        }
        s.fill_path(&needle_path(center, needle_deg, radius * 0.82, side * 0.012), NEEDLE);
        s.fill(&Circle::new(center, side * 0.030), HUB);
        s.fill(&Circle::new(center, side * 0.016), HUB_CORE);
        s.draw_layout(&value_layout, &font, value_origin);
        s.draw_layout(&unit_layout, &font, unit_origin);
    })
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/gauge.rs"]
mod tests;
