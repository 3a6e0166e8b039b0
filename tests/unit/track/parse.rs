use super::*;

#[test]
fn gx_track_pairs_when_and_coord_by_index() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2" xmlns:gx="http://www.google.com/kml/ext/2.2">
  <Document><Placemark>
    <gx:Track>
      <when>2023-09-10T10:00:00Z</when>
      <when>2023-09-10T10:00:10Z</when>
      <when>2023-09-10T10:00:20Z</when>
      <gx:coord>2.000 48.000 35.0</gx:coord>
      <gx:coord>2.001 48.000 36.5</gx:coord>
      <gx:coord>2.002 48.000</gx:coord>
    </gx:Track>
  </Placemark></Document>
</kml>"#;
    let track = Track::parse(xml.as_bytes()).unwrap();
    assert_eq!(track.len(), 3);

    let p0 = &track.points()[0];
    assert!((p0.lat - 48.0).abs() < 1e-10);
    assert!((p0.lon - 2.0).abs() < 1e-10);
    assert_eq!(p0.altitude, Some(35.0));
    assert!(p0.timestamp_ms.is_some());
    assert!(track.points()[2].altitude.is_none());

    let span = track.end_ms().unwrap() - track.start_ms().unwrap();
    assert_eq!(span, 20_000);
    assert!(track.speed_at(track.start_ms().unwrap() + 5_000).is_some());
}

#[test]
fn count_mismatch_falls_back_to_even_interpolation() {
    // 5 timestamps against 10 coordinates: times spread evenly over the
    // full [min, max] span, one per coordinate.
    let mut whens = String::new();
    for i in 0..5 {
        whens.push_str(&format!("<when>1970-01-01T00:00:{:02}Z</when>", i * 10));
    }
    let mut coords = String::new();
    for i in 0..10 {
        coords.push_str(&format!("<gx:coord>2.{i:03} 48.0</gx:coord>"));
    }
    let xml = format!(
        r#"<kml xmlns:gx="http://www.google.com/kml/ext/2.2"><Placemark><gx:Track>{whens}{coords}</gx:Track></Placemark></kml>"#
    );

    let track = Track::parse(xml.as_bytes()).unwrap();
    assert_eq!(track.len(), 10);

    let times: Vec<i64> = track
        .points()
        .iter()
        .map(|p| p.timestamp_ms.unwrap())
        .collect();
    assert_eq!(times[0], 0);
    assert_eq!(*times.last().unwrap(), 40_000);
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
    // Interior stamps sit on the even grid span * i / (n - 1).
    assert_eq!(times[1], (40_000.0_f64 / 9.0).round() as i64);
    assert_eq!(times[5], (40_000.0_f64 * 5.0 / 9.0).round() as i64);
}

#[test]
fn linestring_coordinates_parse_untimed() {
    let xml = r#"<kml><Placemark><LineString><coordinates>
      2.0,48.0,100.0
      2.001,48.0,101.5
      2.002,48.0
    </coordinates></LineString></Placemark></kml>"#;
    let track = Track::parse(xml.as_bytes()).unwrap();
    assert_eq!(track.len(), 3);
    assert!(!track.has_timestamps());
    assert_eq!(track.points()[1].altitude, Some(101.5));
    assert_eq!(track.points()[2].altitude, None);
}

#[test]
fn point_coordinates_parse_too() {
    let xml = r#"<kml><Placemark><Point><coordinates>2.2945,48.8584</coordinates></Point></Placemark></kml>"#;
    let track = Track::parse(xml.as_bytes()).unwrap();
    assert_eq!(track.len(), 1);
    assert!((track.points()[0].lat - 48.8584).abs() < 1e-10);
}

#[test]
fn fragments_concatenate_in_document_order() {
    let xml = r#"<kml xmlns:gx="http://www.google.com/kml/ext/2.2">
      <Placemark><gx:Track>
        <when>1970-01-01T00:00:01Z</when>
        <gx:coord>2.0 48.0</gx:coord>
      </gx:Track></Placemark>
      <Placemark><gx:Track>
        <when>1970-01-01T00:00:02Z</when>
        <gx:coord>2.1 48.1</gx:coord>
      </gx:Track></Placemark>
    </kml>"#;
    let track = Track::parse(xml.as_bytes()).unwrap();
    assert_eq!(track.len(), 2);
    assert_eq!(track.start_ms(), Some(1_000));
    assert_eq!(track.end_ms(), Some(2_000));
}

#[test]
fn when_without_zone_is_taken_as_utc() {
    let xml = r#"<kml xmlns:gx="x"><gx:Track>
      <when>1970-01-01T00:00:05</when>
      <gx:coord>2.0 48.0</gx:coord>
    </gx:Track></kml>"#;
    let track = Track::parse(xml.as_bytes()).unwrap();
    assert_eq!(track.points()[0].timestamp_ms, Some(5_000));
}

#[test]
fn unparseable_entries_are_skipped_not_fatal() {
    // One garbage coord drops out; 2 valid coords against 3 whens then
    // takes the interpolation path, pinning first/last to the span edges.
    let xml = r#"<kml xmlns:gx="x"><gx:Track>
      <when>1970-01-01T00:00:00Z</when>
      <when>1970-01-01T00:00:10Z</when>
      <when>1970-01-01T00:00:20Z</when>
      <gx:coord>2.0 48.0</gx:coord>
      <gx:coord>garbage</gx:coord>
      <gx:coord>2.2 48.2</gx:coord>
    </gx:Track></kml>"#;
    let track = Track::parse(xml.as_bytes()).unwrap();
    assert_eq!(track.len(), 2);
    assert_eq!(track.points()[0].timestamp_ms, Some(0));
    assert_eq!(track.points()[1].timestamp_ms, Some(20_000));
}

#[test]
fn no_extractable_coordinates_is_malformed() {
    let empty = r#"<kml><Document><Placemark><name>n</name></Placemark></Document></kml>"#;
    assert!(matches!(
        Track::parse(empty.as_bytes()),
        Err(TrackburnError::MalformedTrack(_))
    ));
    assert!(matches!(
        Track::parse(b"not xml at all"),
        Err(TrackburnError::MalformedTrack(_))
    ));
}

#[test]
fn out_of_range_coordinates_are_malformed() {
    let xml = r#"<kml><LineString><coordinates>200.0,48.0</coordinates></LineString></kml>"#;
    assert!(matches!(
        Track::parse(xml.as_bytes()),
        Err(TrackburnError::MalformedTrack(_))
    ));
}

#[test]
fn pair_times_rules() {
    assert_eq!(pair_times(&[], 3), None);
    assert_eq!(pair_times(&[5, 10], 2), Some(vec![5, 10]));
    // Mismatch spreads over [min, max] regardless of input order.
    assert_eq!(pair_times(&[100, 0], 3), Some(vec![0, 50, 100]));
    assert_eq!(pair_times(&[7, 3], 1), Some(vec![3]));
}
