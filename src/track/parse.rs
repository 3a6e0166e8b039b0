use quick_xml::Reader;
use quick_xml::events::Event;

use crate::foundation::error::{TrackburnError, TrackburnResult};
use crate::track::model::{Track, TrackPoint};

impl Track {
    /// Parse raw KML bytes into a track.
    ///
    /// Elements are matched by local name, so namespace prefixes do not
    /// matter. Two shapes are understood, and multiple fragments
    /// concatenate in document order:
    ///
    /// - `Track` (the `gx:` extension) with parallel `<when>` and
    ///   `<coord>` (`lon lat [alt]`) children. When the two counts match
    ///   exactly they pair by index; otherwise times are distributed
    ///   linearly over the full `[min, max]` stamp span across the
    ///   available coordinates, which is logged as a degradation because
    ///   it can misplace individual samples.
    /// - `<coordinates>` blobs (`lon,lat[,alt]` tuples) from `LineString`
    ///   or `Point` geometry, which carry no per-point times.
    ///
    /// Individual unparseable entries are skipped and counted; the parse
    /// fails with [`TrackburnError::MalformedTrack`] only when no
    /// coordinate sequence can be extracted at all, or when an extracted
    /// coordinate lies outside the valid lat/lon ranges.
    pub fn parse(raw: &[u8]) -> TrackburnResult<Self> {
        let xml = std::str::from_utf8(raw)
            .map_err(|e| TrackburnError::malformed_track(format!("track is not UTF-8: {e}")))?;
        let mut reader = Reader::from_str(xml);
        let mut points: Vec<TrackPoint> = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"Track" => collect_gx_track(&mut reader, &mut points)?,
                    b"coordinates" => {
                        let text = reader.read_text(e.name()).map_err(xml_err)?;
                        collect_coordinate_tuples(&text, &mut points);
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(xml_err(e)),
                _ => {}
            }
        }

        if points.is_empty() {
            return Err(TrackburnError::malformed_track(
                "no coordinate sequence found in track input",
            ));
        }
        Track::from_points(points)
    }
}

fn xml_err(e: quick_xml::Error) -> TrackburnError {
    TrackburnError::malformed_track(format!("invalid track XML: {e}"))
}

/// Read one `gx:Track` fragment: parallel `<when>`/`<coord>` sequences,
/// paired after the closing tag.
fn collect_gx_track(reader: &mut Reader<&[u8]>, out: &mut Vec<TrackPoint>) -> TrackburnResult<()> {
    let mut whens: Vec<i64> = Vec::new();
    let mut coords: Vec<(f64, f64, Option<f64>)> = Vec::new();
    let mut skipped = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"when" => {
                    let text = reader.read_text(e.name()).map_err(xml_err)?;
                    match parse_when_ms(text.trim()) {
                        Some(ms) => whens.push(ms),
                        None => skipped += 1,
                    }
                }
                b"coord" => {
                    let text = reader.read_text(e.name()).map_err(xml_err)?;
                    match parse_coord_triple(&text) {
                        Some(c) => coords.push(c),
                        None => skipped += 1,
                    }
                }
                _ => {}
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"Track" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_err(e)),
            _ => {}
        }
    }

    if skipped > 0 {
        tracing::warn!(skipped, "ignored unparseable entries in track fragment");
    }
    if coords.is_empty() {
        return Ok(());
    }

    let times = pair_times(&whens, coords.len());
    for (i, (lon, lat, altitude)) in coords.into_iter().enumerate() {
        out.push(TrackPoint {
            lat,
            lon,
            altitude,
            timestamp_ms: times.as_ref().map(|t| t[i]),
        });
    }
    Ok(())
}

/// Pair `n` coordinates with their timestamps.
///
/// Equal counts pair by index. A count mismatch falls back to distributing
/// times linearly across the full `[min, max]` span, one per coordinate;
/// real GPS sampling is rarely uniform, so the fallback is logged rather
/// than applied silently. No timestamps at all yields an untimed track.
fn pair_times(whens: &[i64], n: usize) -> Option<Vec<i64>> {
    if whens.is_empty() {
        return None;
    }
    if whens.len() == n {
        return Some(whens.to_vec());
    }

    tracing::warn!(
        timestamps = whens.len(),
        coordinates = n,
        "timestamp/coordinate count mismatch; distributing times evenly across the track span"
    );
    let t0 = *whens.iter().min()?;
    let t1 = *whens.iter().max()?;
    if n == 1 {
        return Some(vec![t0]);
    }
    let span = (t1 - t0) as f64;
    Some(
        (0..n)
            .map(|i| t0 + (span * (i as f64) / ((n - 1) as f64)).round() as i64)
            .collect(),
    )
}

/// `<when>` stamps are RFC 3339; some loggers omit the zone, in which case
/// the stamp is taken as UTC.
fn parse_when_ms(s: &str) -> Option<i64> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// `gx:coord` payload: `lon lat [alt]`, space separated.
fn parse_coord_triple(s: &str) -> Option<(f64, f64, Option<f64>)> {
    let mut it = s.split_whitespace();
    let lon = it.next()?.parse::<f64>().ok()?;
    let lat = it.next()?.parse::<f64>().ok()?;
    let alt = it.next().and_then(|a| a.parse::<f64>().ok());
    Some((lon, lat, alt))
}

/// `<coordinates>` payload: whitespace-separated `lon,lat[,alt]` tuples.
fn collect_coordinate_tuples(text: &str, out: &mut Vec<TrackPoint>) {
    let mut skipped = 0usize;
    for tuple in text.split_whitespace() {
        let mut it = tuple.split(',');
        let lon = it.next().and_then(|v| v.parse::<f64>().ok());
        let lat = it.next().and_then(|v| v.parse::<f64>().ok());
        match (lon, lat) {
            (Some(lon), Some(lat)) => {
                let altitude = it.next().and_then(|v| v.parse::<f64>().ok());
                out.push(TrackPoint {
                    lat,
                    lon,
                    altitude,
                    timestamp_ms: None,
                });
            }
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::warn!(skipped, "ignored unparseable coordinate tuples");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/track/parse.rs"]
mod tests;
