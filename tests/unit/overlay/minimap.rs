use super::*;
use crate::overlay::options::OverlayOptions;
use crate::overlay::raster::Painter;
use crate::track::model::GeoBounds;

fn bounds(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> GeoBounds {
    GeoBounds { min_lat, max_lat, min_lon, max_lon }
}

#[test]
fn projection_fits_the_wide_axis_and_centers_the_other() {
    // Spans 20 degrees of longitude by 10 of latitude in a square panel.
    let proj = MapProjection::new(&bounds(10.0, 20.0, 30.0, 50.0), 240, 240, 14.0);

    let top_left = proj.project(20.0, 30.0);
    assert!((top_left.x - 14.0).abs() < 1e-9);
    assert!((top_left.y - 67.0).abs() < 1e-9);

    let bottom_right = proj.project(10.0, 50.0);
    assert!((bottom_right.x - 226.0).abs() < 1e-9);
    assert!((bottom_right.y - 173.0).abs() < 1e-9);
}

#[test]
fn north_is_up() {
    let proj = MapProjection::new(&bounds(10.0, 20.0, 30.0, 50.0), 240, 240, 14.0);
    let north = proj.project(20.0, 40.0);
    let south = proj.project(10.0, 40.0);
    assert!(north.y < south.y);
}

#[test]
fn degenerate_bounds_collapse_to_panel_center() {
    let proj = MapProjection::new(&bounds(48.0, 48.0, 2.0, 2.0), 200, 100, 10.0);
    let at = proj.project(48.0, 2.0);
    assert!((at.x - 100.0).abs() < 1e-9);
    assert!((at.y - 50.0).abs() < 1e-9);
}

#[test]
fn single_meridian_track_still_projects() {
    let proj = MapProjection::new(&bounds(10.0, 20.0, 5.0, 5.0), 240, 240, 14.0);
    let top = proj.project(20.0, 5.0);
    let bottom = proj.project(10.0, 5.0);
    assert!((top.x - 120.0).abs() < 1e-9);
    assert!((bottom.x - 120.0).abs() < 1e-9);
    assert!((bottom.y - top.y - 212.0).abs() < 1e-9);
}

#[test]
fn segment_quad_skips_coincident_points() {
    use crate::foundation::core::Point;
    assert!(segment_quad(Point::new(1.0, 1.0), Point::new(1.0, 1.0), 2.0).is_none());
    assert!(segment_quad(Point::new(1.0, 1.0), Point::new(4.0, 1.0), 2.0).is_some());
}

#[test]
fn draw_produces_panel_sized_raster_without_fonts() {
    let options = OverlayOptions::default();
    let proj = MapProjection::new(&bounds(10.0, 20.0, 30.0, 50.0), 240, 240, 14.0);
    let trace = project_trace(
        [(10.0, 30.0), (15.0, 40.0), (20.0, 50.0)].into_iter(),
        &proj,
    );

    let mut painter = Painter::new();
    let raster = draw(&mut painter, &options, &trace, Some(1)).unwrap();
    assert_eq!(raster.width, 240);
    assert_eq!(raster.height, 240);
    // Plate covers the panel interior.
    assert!(raster.pixel(120, 120).unwrap()[3] > 0);
}

#[test]
fn current_marker_is_clamped_into_the_trace() {
    let options = OverlayOptions::default();
    let proj = MapProjection::new(&bounds(10.0, 20.0, 30.0, 50.0), 240, 240, 14.0);
    let trace = project_trace([(10.0, 30.0), (20.0, 50.0)].into_iter(), &proj);

    let mut painter = Painter::new();
    // Out-of-range index must not panic.
    let raster = draw(&mut painter, &options, &trace, Some(99)).unwrap();
    assert!(!raster.is_empty());
}

#[test]
fn no_current_position_draws_only_the_static_trace() {
    let options = OverlayOptions::default();
    let proj = MapProjection::new(&bounds(10.0, 20.0, 30.0, 50.0), 240, 240, 14.0);
    let trace = project_trace([(10.0, 30.0), (20.0, 50.0)].into_iter(), &proj);

    let mut painter = Painter::new();
    let with_marker = draw(&mut painter, &options, &trace, Some(1)).unwrap();
    let without = draw(&mut painter, &options, &trace, None).unwrap();
    assert_ne!(with_marker.data, without.data);
}
