//! Job submission contract.

use std::path::PathBuf;

use crate::foundation::error::{TrackburnError, TrackburnResult};
use crate::overlay::options::OverlayOptions;
use crate::track::model::Track;

/// Where the GPS track for a job comes from.
///
/// Raw sources are parsed at job start with the same pairing and ordering
/// rules as a pre-parsed track, so every entry point yields identical
/// track semantics.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TrackSource {
    /// Path to a KML file, read and parsed at job start.
    KmlFile(PathBuf),
    /// Raw KML bytes, parsed at job start.
    KmlBytes(Vec<u8>),
    /// A track the caller parsed beforehand.
    Parsed(Track),
}

/// Everything a caller provides to run one overlay job.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct JobSpec {
    /// Source video file.
    pub video_path: PathBuf,
    /// Final output file; parent directories are created as needed.
    pub output_path: PathBuf,
    /// Track input.
    pub track: TrackSource,
    /// Seconds added to video time before every track lookup, compensating
    /// for clock drift between the camera and the GPS logger.
    #[serde(default)]
    pub offset_seconds: f64,
    /// Overlay sampling rate in frames per second.
    #[serde(default = "default_overlay_fps")]
    pub overlay_fps: u32,
    /// Output video frame rate; `None` keeps the source rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_fps: Option<u32>,
    /// Panel selection and appearance.
    #[serde(default)]
    pub overlay: OverlayOptions,
}

impl JobSpec {
    /// Spec with defaults for everything beyond the three required inputs.
    pub fn new(
        video_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        track: TrackSource,
    ) -> Self {
        Self {
            video_path: video_path.into(),
            output_path: output_path.into(),
            track,
            offset_seconds: 0.0,
            overlay_fps: default_overlay_fps(),
            output_fps: None,
            overlay: OverlayOptions::default(),
        }
    }

    /// Structural validation, run at submission before any work starts.
    ///
    /// Path existence is deliberately not checked here; the runner does
    /// that as its first step so a submitted job reports missing files
    /// through its own event stream.
    pub fn validate(&self) -> TrackburnResult<()> {
        if self.video_path.as_os_str().is_empty() {
            return Err(TrackburnError::validation("video path must not be empty"));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(TrackburnError::validation("output path must not be empty"));
        }
        if let TrackSource::KmlFile(path) = &self.track {
            if path.as_os_str().is_empty() {
                return Err(TrackburnError::validation("track path must not be empty"));
            }
        }
        if !self.offset_seconds.is_finite() {
            return Err(TrackburnError::validation("offset seconds must be finite"));
        }
        if !(1..=30).contains(&self.overlay_fps) {
            return Err(TrackburnError::validation(format!(
                "overlay fps {} outside 1..=30",
                self.overlay_fps
            )));
        }
        if let Some(fps) = self.output_fps {
            if !(1..=240).contains(&fps) {
                return Err(TrackburnError::validation(format!(
                    "output fps {fps} outside 1..=240"
                )));
            }
        }
        self.overlay.validate()
    }

    /// Produce the track, parsing raw sources.
    pub fn load_track(&self) -> TrackburnResult<Track> {
        match &self.track {
            TrackSource::KmlFile(path) => {
                let raw = std::fs::read(path).map_err(|e| {
                    TrackburnError::validation(format!(
                        "failed to read track '{}': {e}",
                        path.display()
                    ))
                })?;
                Track::parse(&raw)
            }
            TrackSource::KmlBytes(bytes) => Track::parse(bytes),
            TrackSource::Parsed(track) => Ok(track.clone()),
        }
    }
}

fn default_overlay_fps() -> u32 {
    5
}

#[cfg(test)]
#[path = "../../tests/unit/job/spec.rs"]
mod tests;
