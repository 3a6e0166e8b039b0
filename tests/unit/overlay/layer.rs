use super::*;
use crate::encode::clip::MemoryClipSink;
use crate::overlay::text::default_font_path;
use crate::track::model::{Track, TrackPoint};

fn point(lat: f64, lon: f64, ts: Option<i64>) -> TrackPoint {
    TrackPoint { lat, lon, altitude: None, timestamp_ms: ts }
}

fn timed_track() -> Track {
    Track::from_points(vec![
        point(48.0, 2.0, Some(0)),
        point(48.001, 2.001, Some(5_000)),
        point(48.002, 2.002, Some(10_000)),
    ])
    .unwrap()
}

fn untimed_track() -> Track {
    Track::from_points(vec![point(48.0, 2.0, None), point(48.001, 2.001, None)]).unwrap()
}

fn window(duration: f64) -> RenderWindow {
    RenderWindow { duration_seconds: duration, offset_seconds: 0.0, overlay_fps: 4 }
}

fn renderer() -> Option<LayerRenderer> {
    default_font_path()?;
    LayerRenderer::new(OverlayOptions::default()).ok()
}

#[test]
fn layers_anchor_to_their_fixed_corners() {
    assert_eq!(LayerKind::Gauge.anchor(), Corner::BottomRight);
    assert_eq!(LayerKind::InfoPanel.anchor(), Corner::BottomLeft);
    assert_eq!(LayerKind::MiniMap.anchor(), Corner::TopRight);
}

#[test]
fn compositing_order_is_gauge_info_map() {
    assert_eq!(
        LayerKind::ALL,
        [LayerKind::Gauge, LayerKind::InfoPanel, LayerKind::MiniMap]
    );
}

#[test]
fn enabled_in_tracks_per_panel_flags() {
    let mut options = OverlayOptions::default();
    options.info_panel.enabled = false;
    assert!(LayerKind::Gauge.enabled_in(&options));
    assert!(!LayerKind::InfoPanel.enabled_in(&options));
    assert!(LayerKind::MiniMap.enabled_in(&options));
}

#[test]
fn layer_names_are_stable() {
    assert_eq!(LayerKind::Gauge.name(), "gauge");
    assert_eq!(LayerKind::InfoPanel.name(), "info_panel");
    assert_eq!(LayerKind::MiniMap.name(), "mini_map");
    assert_eq!(LayerKind::MiniMap.to_string(), "mini_map");
}

#[test]
fn minimap_layer_streams_one_frame_per_sample() {
    let Some(mut renderer) = renderer() else { return };
    let track = timed_track();
    let mut sink = MemoryClipSink::new();
    let cancel = AtomicBool::new(false);

    let produced = renderer
        .render_layer(&track, LayerKind::MiniMap, &window(1.0), &mut sink, &cancel)
        .unwrap();
    assert!(produced);
    assert!(sink.is_finished());
    assert_eq!(sink.frames().len(), 4);
    let config = sink.config().unwrap();
    assert_eq!((config.width, config.height, config.fps), (240, 240, 4));
}

#[test]
fn fractional_duration_rounds_frame_count_up() {
    let Some(mut renderer) = renderer() else { return };
    let track = timed_track();
    let mut sink = MemoryClipSink::new();
    let cancel = AtomicBool::new(false);

    renderer
        .render_layer(&track, LayerKind::MiniMap, &window(1.1), &mut sink, &cancel)
        .unwrap();
    assert_eq!(sink.frames().len(), 5);
}

#[test]
fn gauge_requires_timestamps() {
    let Some(mut renderer) = renderer() else { return };
    let mut sink = MemoryClipSink::new();
    let cancel = AtomicBool::new(false);

    let err = renderer
        .render_layer(&untimed_track(), LayerKind::Gauge, &window(1.0), &mut sink, &cancel)
        .unwrap_err();
    assert!(matches!(err, TrackburnError::NoTrackData(_)));
    assert!(sink.config().is_none(), "failed layer must not open its sink");
}

#[test]
fn info_panel_requires_timestamps() {
    let Some(mut renderer) = renderer() else { return };
    let mut sink = MemoryClipSink::new();
    let cancel = AtomicBool::new(false);

    let err = renderer
        .render_layer(&untimed_track(), LayerKind::InfoPanel, &window(1.0), &mut sink, &cancel)
        .unwrap_err();
    assert!(matches!(err, TrackburnError::NoTrackData(_)));
}

#[test]
fn minimap_accepts_untimed_tracks() {
    let Some(mut renderer) = renderer() else { return };
    let mut sink = MemoryClipSink::new();
    let cancel = AtomicBool::new(false);

    let produced = renderer
        .render_layer(&untimed_track(), LayerKind::MiniMap, &window(0.5), &mut sink, &cancel)
        .unwrap();
    assert!(produced);
    assert_eq!(sink.frames().len(), 2);
}

#[test]
fn raised_cancel_flag_stops_the_layer() {
    let Some(mut renderer) = renderer() else { return };
    let track = timed_track();
    let mut sink = MemoryClipSink::new();
    let cancel = AtomicBool::new(true);

    let err = renderer
        .render_layer(&track, LayerKind::MiniMap, &window(10.0), &mut sink, &cancel)
        .unwrap_err();
    assert!(matches!(err, TrackburnError::Cancelled));
    assert!(!sink.is_finished());
    assert!(sink.frames().is_empty());
}

#[test]
fn info_panel_with_no_rows_skips_the_sink() {
    if default_font_path().is_none() {
        return;
    }
    let mut options = OverlayOptions::default();
    options.info_panel.show_speed = false;
    options.info_panel.show_altitude = false;
    options.info_panel.show_coordinates = false;
    options.info_panel.show_time = false;
    let Ok(mut renderer) = LayerRenderer::new(options) else { return };

    let mut sink = MemoryClipSink::new();
    let cancel = AtomicBool::new(false);
    let produced = renderer
        .render_layer(&timed_track(), LayerKind::InfoPanel, &window(1.0), &mut sink, &cancel)
        .unwrap();
    assert!(!produced);
    assert!(sink.config().is_none());
}

#[test]
fn zero_duration_window_produces_no_clip() {
    let Some(mut renderer) = renderer() else { return };
    let mut sink = MemoryClipSink::new();
    let cancel = AtomicBool::new(false);

    let produced = renderer
        .render_layer(&timed_track(), LayerKind::Gauge, &window(0.0), &mut sink, &cancel)
        .unwrap();
    assert!(!produced);
    assert!(sink.config().is_none());
}
