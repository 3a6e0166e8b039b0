use crate::foundation::error::{TrackburnError, TrackburnResult};

/// Mean Earth radius in kilometres, as used by the speed computation.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// One geographic sample from a GPS log.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrackPoint {
    /// Latitude in degrees, must lie in [-90, 90].
    pub lat: f64,
    /// Longitude in degrees, must lie in [-180, 180].
    pub lon: f64,
    /// Altitude in metres, when the log carries one.
    #[serde(default)]
    pub altitude: Option<f64>,
    /// Absolute sample time in Unix milliseconds, when the log carries one.
    #[serde(default)]
    pub timestamp_ms: Option<i64>,
}

/// Geographic bounding box of a track, in degrees.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoBounds {
    /// Southernmost latitude.
    pub min_lat: f64,
    /// Northernmost latitude.
    pub max_lat: f64,
    /// Westernmost longitude.
    pub min_lon: f64,
    /// Easternmost longitude.
    pub max_lon: f64,
}

impl GeoBounds {
    /// Latitude extent in degrees (0 for a degenerate box).
    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Longitude extent in degrees (0 for a degenerate box).
    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }
}

/// A parsed GPS track: a non-empty ordered point sequence plus its derived
/// time span. Immutable once built.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Track {
    points: Vec<TrackPoint>,
    start_ms: Option<i64>,
    end_ms: Option<i64>,
}

impl Track {
    /// Build a track from caller-supplied points.
    ///
    /// Points are stably sorted by timestamp (samples without a timestamp
    /// sort ahead of timed ones; a fully untimed track keeps its input
    /// order). Fails with [`TrackburnError::MalformedTrack`] when the list
    /// is empty or any coordinate lies outside the valid lat/lon ranges,
    /// matching what [`Track::parse`] reports for the same data.
    pub fn from_points(mut points: Vec<TrackPoint>) -> TrackburnResult<Self> {
        if points.is_empty() {
            return Err(TrackburnError::malformed_track("track contains no points"));
        }
        for p in &points {
            if !p.lat.is_finite() || !(-90.0..=90.0).contains(&p.lat) {
                return Err(TrackburnError::malformed_track(format!(
                    "latitude {} outside [-90, 90]",
                    p.lat
                )));
            }
            if !p.lon.is_finite() || !(-180.0..=180.0).contains(&p.lon) {
                return Err(TrackburnError::malformed_track(format!(
                    "longitude {} outside [-180, 180]",
                    p.lon
                )));
            }
        }
        points.sort_by_key(|p| p.timestamp_ms);
        let start_ms = points.iter().filter_map(|p| p.timestamp_ms).min();
        let end_ms = points.iter().filter_map(|p| p.timestamp_ms).max();
        Ok(Self {
            points,
            start_ms,
            end_ms,
        })
    }

    /// All samples in track order.
    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false: a track is non-empty by construction. Present so the
    /// usual `len`/`is_empty` pairing holds.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Earliest sample timestamp, when any sample is timed.
    pub fn start_ms(&self) -> Option<i64> {
        self.start_ms
    }

    /// Latest sample timestamp, when any sample is timed.
    pub fn end_ms(&self) -> Option<i64> {
        self.end_ms
    }

    /// Whether any sample carries a timestamp. Layers that query by time
    /// (gauge, info panel) are unusable when this is false.
    pub fn has_timestamps(&self) -> bool {
        self.start_ms.is_some()
    }

    /// Index of the last timed sample with `timestamp <= at_ms`, or `None`
    /// when no such sample exists. Shared by [`Track::position_at`] and the
    /// mini-map progress sub-path so the two can never disagree.
    pub fn index_at(&self, at_ms: i64) -> Option<usize> {
        let upto = self
            .points
            .partition_point(|p| p.timestamp_ms.is_none_or(|ts| ts <= at_ms));
        if upto == 0 {
            return None;
        }
        let idx = upto - 1;
        self.points[idx].timestamp_ms.map(|_| idx)
    }

    /// Last-known sample at `at_ms`, verbatim.
    ///
    /// Position is held, never interpolated: the displayed coordinate must
    /// stay in lockstep with the speed computed between the same two
    /// samples. `None` when no sample has a timestamp at or before `at_ms`.
    pub fn position_at(&self, at_ms: i64) -> Option<&TrackPoint> {
        self.index_at(at_ms).map(|i| &self.points[i])
    }

    /// Speed in km/h at `at_ms`, derived from the sample pair bracketing
    /// that instant.
    ///
    /// Takes the last sample P with `timestamp <= at_ms` and its successor
    /// P', and returns haversine-distance(P, P') over the elapsed hours.
    /// `None` when there is no P, no P' (past the last sample, which is
    /// never extrapolated), or the pair does not advance in time.
    pub fn speed_at(&self, at_ms: i64) -> Option<f64> {
        let i = self.index_at(at_ms)?;
        let p = &self.points[i];
        let q = self.points.get(i + 1)?;
        let dt_hours = (q.timestamp_ms? - p.timestamp_ms?) as f64 / 3_600_000.0;
        if dt_hours <= 0.0 {
            return None;
        }
        Some(haversine_km(p, q) / dt_hours)
    }

    /// Bounding box over all samples. The box may be degenerate (a single
    /// point, or a purely north-south leg).
    pub fn bounding_box(&self) -> GeoBounds {
        let mut b = GeoBounds {
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            min_lon: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
        };
        for p in &self.points {
            b.min_lat = b.min_lat.min(p.lat);
            b.max_lat = b.max_lat.max(p.lat);
            b.min_lon = b.min_lon.min(p.lon);
            b.max_lon = b.max_lon.max(p.lon);
        }
        b
    }
}

/// Great-circle distance between two samples in kilometres (haversine,
/// mean Earth radius 6371 km).
pub fn haversine_km(a: &TrackPoint, b: &TrackPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
#[path = "../../tests/unit/track/model.rs"]
mod tests;
