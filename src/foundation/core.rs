pub use kurbo::{Affine, BezPath, Circle, Point, Rect, RoundedRect, Vec2};

/// Unit used when presenting speeds to the viewer.
///
/// Track-model queries always return km/h; conversion happens at the
/// presentation edge so the gauge and the info panel can never disagree.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SpeedUnit {
    /// Kilometres per hour.
    #[default]
    Kmh,
    /// Metres per second.
    Ms,
}

impl SpeedUnit {
    /// Convert a km/h value into this unit.
    pub fn from_kmh(self, kmh: f64) -> f64 {
        match self {
            SpeedUnit::Kmh => kmh,
            SpeedUnit::Ms => kmh / 3.6,
        }
    }

    /// Short label shown next to numeric speeds.
    pub fn label(self) -> &'static str {
        match self {
            SpeedUnit::Kmh => "km/h",
            SpeedUnit::Ms => "m/s",
        }
    }
}

/// Screen corner an overlay layer is anchored to during composition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    /// Top-left of the frame.
    TopLeft,
    /// Top-right of the frame.
    TopRight,
    /// Bottom-left of the frame.
    BottomLeft,
    /// Bottom-right of the frame.
    BottomRight,
}

/// Number of overlay frames sampled for a clip of `duration_seconds` at
/// `overlay_fps`: `ceil(duration * fps)`, never negative.
pub fn overlay_frame_count(duration_seconds: f64, overlay_fps: u32) -> u64 {
    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return 0;
    }
    (duration_seconds * f64::from(overlay_fps)).ceil() as u64
}

/// Video-local instant of overlay frame `k` at `overlay_fps`, in seconds.
pub fn sample_time_seconds(k: u64, overlay_fps: u32) -> f64 {
    (k as f64) / f64::from(overlay_fps)
}

/// Map a video-local elapsed time to an absolute track timestamp.
///
/// `track_start_ms + (video_time_seconds + offset_seconds) * 1000`, where
/// the offset compensates for clock drift between camera and GPS logger.
/// Every consumer of track time goes through this one mapping.
pub fn track_instant_ms(track_start_ms: i64, video_time_seconds: f64, offset_seconds: f64) -> i64 {
    track_start_ms + ((video_time_seconds + offset_seconds) * 1000.0).round() as i64
}
