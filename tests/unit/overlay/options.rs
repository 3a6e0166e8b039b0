use super::*;
use crate::foundation::core::SpeedUnit;
use crate::foundation::error::TrackburnError;

fn fake_font_file() -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "trackburn_options_test_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("font.ttf");
    std::fs::write(&path, b"stub").unwrap();
    path
}

#[test]
fn empty_json_deserializes_to_defaults() {
    let opts: OverlayOptions = serde_json::from_str("{}").unwrap();
    assert!(opts.gauge.enabled);
    assert_eq!(opts.gauge.max_speed, 60.0);
    assert_eq!(opts.gauge.size_px, 220);
    assert!(opts.info_panel.show_altitude);
    assert_eq!(opts.mini_map.width_px, 240);
    assert_eq!(opts.speed_unit, SpeedUnit::Kmh);
    assert_eq!(opts.margin_px, 16);
    assert_eq!(opts.background_opacity, 0.55);
}

#[test]
fn partial_json_overrides_only_named_fields() {
    let opts: OverlayOptions =
        serde_json::from_str(r#"{"gauge": {"max_speed": 90.0}, "speed_unit": "ms"}"#).unwrap();
    assert_eq!(opts.gauge.max_speed, 90.0);
    assert!(opts.gauge.enabled);
    assert_eq!(opts.speed_unit, SpeedUnit::Ms);
}

#[test]
fn defaults_validate_with_a_present_font() {
    let mut opts = OverlayOptions::default();
    opts.font_path = Some(fake_font_file());
    opts.validate().unwrap();
}

#[test]
fn all_panels_disabled_is_rejected() {
    let mut opts = OverlayOptions::default();
    opts.gauge.enabled = false;
    opts.info_panel.enabled = false;
    opts.mini_map.enabled = false;
    let err = opts.validate().unwrap_err();
    assert!(matches!(err, TrackburnError::Validation(_)));
    assert!(err.to_string().contains("at least one overlay panel"));
}

#[test]
fn non_finite_max_speed_is_rejected() {
    let mut opts = OverlayOptions::default();
    opts.gauge.max_speed = f64::NAN;
    assert!(opts.validate().is_err());
    opts.gauge.max_speed = 0.0;
    assert!(opts.validate().is_err());
}

#[test]
fn panel_sizes_outside_range_are_rejected() {
    let mut opts = OverlayOptions::default();
    opts.gauge.size_px = 32;
    assert!(opts.validate().unwrap_err().to_string().contains("gauge size_px"));

    let mut opts = OverlayOptions::default();
    opts.mini_map.height_px = 4096;
    assert!(opts.validate().unwrap_err().to_string().contains("mini_map height_px"));
}

#[test]
fn background_opacity_must_be_a_unit_fraction() {
    let mut opts = OverlayOptions::default();
    opts.background_opacity = 1.5;
    assert!(opts.validate().is_err());
    opts.background_opacity = -0.1;
    assert!(opts.validate().is_err());
}

#[test]
fn oversized_margin_is_rejected() {
    let mut opts = OverlayOptions::default();
    opts.margin_px = 513;
    assert!(opts.validate().is_err());
}

#[test]
fn missing_configured_font_is_a_validation_error() {
    let mut opts = OverlayOptions::default();
    opts.font_path = Some("/nonexistent/path/font.ttf".into());
    let err = opts.validate().unwrap_err();
    assert!(err.to_string().contains("overlay font not found"));
}

#[test]
fn enabled_panel_count_tracks_flags() {
    let mut opts = OverlayOptions::default();
    assert_eq!(opts.enabled_panel_count(), 3);
    opts.info_panel.enabled = false;
    assert_eq!(opts.enabled_panel_count(), 2);
}
