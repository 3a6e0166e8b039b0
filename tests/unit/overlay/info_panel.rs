use super::*;
use crate::overlay::options::InfoPanelOptions;
use crate::track::model::{Track, TrackPoint};

fn point(lat: f64, lon: f64, altitude: Option<f64>, ts: Option<i64>) -> TrackPoint {
    TrackPoint { lat, lon, altitude, timestamp_ms: ts }
}

fn track_with_altitude(has_altitude: bool) -> Track {
    let alt = |i: i64| if has_altitude { Some(100.0 + i as f64) } else { None };
    Track::from_points(vec![
        point(48.0, 2.0, alt(0), Some(0)),
        point(48.001, 2.001, alt(1), Some(10_000)),
    ])
    .unwrap()
}

#[test]
fn altitude_row_exists_only_when_the_track_carries_altitude() {
    let opts = InfoPanelOptions::default();
    let with = panel_lines(&opts, &track_with_altitude(true));
    assert!(with.contains(&InfoLine::Altitude));

    let without = panel_lines(&opts, &track_with_altitude(false));
    assert!(!without.contains(&InfoLine::Altitude));
    assert_eq!(
        without,
        vec![InfoLine::Speed, InfoLine::Coordinates, InfoLine::Time]
    );
}

#[test]
fn disabled_flags_drop_rows() {
    let opts = InfoPanelOptions {
        show_speed: false,
        show_time: false,
        ..InfoPanelOptions::default()
    };
    let lines = panel_lines(&opts, &track_with_altitude(true));
    assert_eq!(lines, vec![InfoLine::Altitude, InfoLine::Coordinates]);
}

#[test]
fn no_rows_means_zero_height() {
    let opts = InfoPanelOptions {
        show_speed: false,
        show_altitude: false,
        show_coordinates: false,
        show_time: false,
        ..InfoPanelOptions::default()
    };
    let lines = panel_lines(&opts, &track_with_altitude(true));
    assert!(lines.is_empty());
    assert_eq!(panel_height_px(0, 18.0), 0);
}

#[test]
fn panel_height_follows_row_count() {
    let lh = line_height_px(18.0);
    assert_eq!(lh, 28.0);
    assert_eq!(panel_height_px(4, 18.0), (24.0 + 4.0 * lh) as u32);
    assert!(panel_height_px(1, 18.0) < panel_height_px(2, 18.0));
}

#[test]
fn values_format_with_unit_and_precision() {
    let p = point(48.123456, 2.654321, Some(123.6), Some(1_700_000_000_000));
    let state = InfoState {
        speed_display: Some(12.34),
        unit_label: "km/h",
        point: Some(&p),
    };
    assert_eq!(line_value(InfoLine::Speed, &state), "12.3 km/h");
    assert_eq!(line_value(InfoLine::Altitude, &state), "124 m");
    assert_eq!(line_value(InfoLine::Coordinates, &state), "48.12346, 2.65432");
    assert_eq!(line_value(InfoLine::Time, &state), "22:13:20");
}

#[test]
fn missing_data_renders_placeholders() {
    let state = InfoState { speed_display: None, unit_label: "km/h", point: None };
    assert_eq!(line_value(InfoLine::Speed, &state), "--");
    assert_eq!(line_value(InfoLine::Altitude, &state), "--");
    assert_eq!(line_value(InfoLine::Coordinates, &state), "--");
    assert_eq!(line_value(InfoLine::Time, &state), "--");
}

#[test]
fn untimed_sample_has_placeholder_clock() {
    let p = point(48.0, 2.0, None, None);
    let state = InfoState { speed_display: None, unit_label: "km/h", point: Some(&p) };
    assert_eq!(line_value(InfoLine::Time, &state), "--");
}
