//! Per-layer frame sampling.
//!
//! [`LayerRenderer`] walks overlay sample instants `k / overlay_fps` over
//! the video duration, maps each to a track timestamp through the shared
//! offset, paints the panel for that instant, and streams the frames into
//! a [`ClipSink`]. Cancellation is checked between frames, so a cancelled
//! job stops within one frame's work.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::encode::clip::{ClipConfig, ClipSink};
use crate::foundation::core::{
    overlay_frame_count, sample_time_seconds, track_instant_ms, Corner, Point,
};
use crate::foundation::error::{TrackburnError, TrackburnResult};
use crate::overlay::gauge;
use crate::overlay::info_panel::{self, InfoLine, InfoState};
use crate::overlay::minimap::{self, MapProjection};
use crate::overlay::options::OverlayOptions;
use crate::overlay::raster::Painter;
use crate::overlay::text::{resolve_font_path, TextEngine};
use crate::track::model::Track;

const MAP_PADDING: f64 = 14.0;

/// The overlay layers, in their fixed compositing order (first is drawn
/// closest to the video, later layers stack above on overlap).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// Speed gauge dial.
    Gauge,
    /// Label/value info panel.
    InfoPanel,
    /// Track mini-map.
    MiniMap,
}

impl LayerKind {
    /// Every layer in compositing order.
    pub const ALL: [LayerKind; 3] = [LayerKind::Gauge, LayerKind::InfoPanel, LayerKind::MiniMap];

    /// Video corner this layer is anchored to.
    pub fn anchor(self) -> Corner {
        match self {
            LayerKind::Gauge => Corner::BottomRight,
            LayerKind::InfoPanel => Corner::BottomLeft,
            LayerKind::MiniMap => Corner::TopRight,
        }
    }

    /// Stable lowercase name used in logs and clip file names.
    pub fn name(self) -> &'static str {
        match self {
            LayerKind::Gauge => "gauge",
            LayerKind::InfoPanel => "info_panel",
            LayerKind::MiniMap => "mini_map",
        }
    }

    /// Whether these options ask for this layer at all.
    pub fn enabled_in(self, options: &OverlayOptions) -> bool {
        match self {
            LayerKind::Gauge => options.gauge.enabled,
            LayerKind::InfoPanel => options.info_panel.enabled,
            LayerKind::MiniMap => options.mini_map.enabled,
        }
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Time window a layer clip covers, in video-local terms.
#[derive(Clone, Copy, Debug)]
pub struct RenderWindow {
    /// Source video duration in seconds; the clip spans all of it.
    pub duration_seconds: f64,
    /// Seconds added to video time before track lookup.
    pub offset_seconds: f64,
    /// Overlay sampling rate in frames per second.
    pub overlay_fps: u32,
}

enum LayerPrep {
    Gauge,
    Info(Vec<InfoLine>),
    Map(Vec<Point>),
}

/// Paints every frame of one or more overlay layers for a single job.
///
/// Holds the font and the reusable raster context, so one instance should
/// serve all layers of a job sequentially, or one instance per layer when
/// layers render in parallel.
pub struct LayerRenderer {
    painter: Painter,
    text: TextEngine,
    options: OverlayOptions,
}

impl LayerRenderer {
    /// Builds a renderer for `options`, loading the overlay font.
    pub fn new(options: OverlayOptions) -> TrackburnResult<Self> {
        let font_path = resolve_font_path(options.font_path.as_deref())?;
        let font_bytes = std::fs::read(&font_path).map_err(|e| {
            TrackburnError::validation(format!(
                "failed to read overlay font '{}': {e}",
                font_path.display()
            ))
        })?;
        Ok(Self {
            painter: Painter::new(),
            text: TextEngine::new(font_bytes)?,
            options,
        })
    }

    /// The options this renderer was built with.
    pub fn options(&self) -> &OverlayOptions {
        &self.options
    }

    /// Renders every sample of `kind` over `window` into `sink`.
    ///
    /// Returns `Ok(false)` without touching the sink when the layer has
    /// nothing to show (zero duration, or an info panel whose rows all
    /// resolved away). Layers whose data requirements the track cannot
    /// meet fail with [`TrackburnError::NoTrackData`]; a raised `cancel`
    /// flag fails with [`TrackburnError::Cancelled`] between frames.
    pub fn render_layer(
        &mut self,
        track: &Track,
        kind: LayerKind,
        window: &RenderWindow,
        sink: &mut dyn ClipSink,
        cancel: &AtomicBool,
    ) -> TrackburnResult<bool> {
        if track.is_empty() {
            return Err(TrackburnError::no_track_data("track has no points"));
        }
        if matches!(kind, LayerKind::Gauge | LayerKind::InfoPanel) && !track.has_timestamps() {
            return Err(TrackburnError::no_track_data(format!(
                "{kind} requires timestamped track points"
            )));
        }

        let frames = overlay_frame_count(window.duration_seconds, window.overlay_fps);
        if frames == 0 {
            tracing::debug!(layer = %kind, "zero-length window, skipping layer");
            return Ok(false);
        }

        let prep = match kind {
            LayerKind::Gauge => LayerPrep::Gauge,
            LayerKind::InfoPanel => {
                let lines = info_panel::panel_lines(&self.options.info_panel, track);
                if lines.is_empty() {
                    tracing::debug!(layer = %kind, "no info lines to show, skipping layer");
                    return Ok(false);
                }
                LayerPrep::Info(lines)
            }
            LayerKind::MiniMap => {
                let projection = MapProjection::new(
                    &track.bounding_box(),
                    self.options.mini_map.width_px,
                    self.options.mini_map.height_px,
                    MAP_PADDING,
                );
                LayerPrep::Map(minimap::project_trace(
                    track.points().iter().map(|p| (p.lat, p.lon)),
                    &projection,
                ))
            }
        };

        let (width, height) = self.layer_size(kind, &prep);
        sink.begin(ClipConfig { width, height, fps: window.overlay_fps })?;

        let track_start = track.start_ms().unwrap_or(0);
        let unit = self.options.speed_unit;
        for k in 0..frames {
            if cancel.load(Ordering::Relaxed) {
                return Err(TrackburnError::Cancelled);
            }
            let t = sample_time_seconds(k, window.overlay_fps);
            let at_ms = track_instant_ms(track_start, t, window.offset_seconds);

            let frame = match &prep {
                LayerPrep::Gauge => {
                    let speed = track.speed_at(at_ms).map(|kmh| unit.from_kmh(kmh));
                    gauge::draw(&mut self.painter, &mut self.text, &self.options, speed)?
                }
                LayerPrep::Info(lines) => {
                    let state = InfoState {
                        speed_display: track.speed_at(at_ms).map(|kmh| unit.from_kmh(kmh)),
                        unit_label: unit.label(),
                        point: track.position_at(at_ms),
                    };
                    info_panel::draw(&mut self.painter, &mut self.text, &self.options, lines, &state)?
                }
                LayerPrep::Map(trace) => {
                    let current = track.index_at(at_ms);
                    minimap::draw(&mut self.painter, &self.options, trace, current)?
                }
            };
            sink.push_frame(&frame)?;
        }

        sink.finish()?;
        tracing::debug!(layer = %kind, frames, "layer rendered");
        Ok(true)
    }

    fn layer_size(&self, kind: LayerKind, prep: &LayerPrep) -> (u32, u32) {
        match (kind, prep) {
            (LayerKind::Gauge, _) => (self.options.gauge.size_px, self.options.gauge.size_px),
            (LayerKind::InfoPanel, LayerPrep::Info(lines)) => (
                self.options.info_panel.width_px,
                info_panel::panel_height_px(lines.len(), self.options.font_size_px),
            ),
            (LayerKind::InfoPanel, _) => (self.options.info_panel.width_px, 0),
            (LayerKind::MiniMap, _) => {
                (self.options.mini_map.width_px, self.options.mini_map.height_px)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/layer.rs"]
mod tests;
