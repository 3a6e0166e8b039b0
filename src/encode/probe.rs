//! Source media inspection.
//!
//! Runs `ffprobe` once per job and reduces its JSON to the handful of
//! facts the pipeline needs. Parsing is split from process spawning so
//! tests can feed canned probe output.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::foundation::error::{TrackburnError, TrackburnResult};

/// Facts about a source video file, as reported by `ffprobe`.
#[derive(Clone, Debug, serde::Serialize)]
pub struct MediaInfo {
    /// Absolute or caller-relative source path that was probed.
    pub source_path: PathBuf,
    /// Container duration in seconds.
    pub duration_seconds: f64,
    /// Video width in pixels.
    pub width: u32,
    /// Video height in pixels.
    pub height: u32,
    /// Whether at least one audio stream is present.
    pub has_audio: bool,
    /// Codec name of the first video stream.
    pub video_codec: String,
}

/// Probe `source_path` through `ffprobe`.
pub fn probe_media(source_path: &Path) -> TrackburnResult<MediaInfo> {
    if !source_path.is_file() {
        return Err(TrackburnError::probe_failed(format!(
            "source video not found: '{}'",
            source_path.display()
        )));
    }

    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| TrackburnError::probe_failed(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(TrackburnError::probe_failed(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    parse_probe_output(&out.stdout, source_path)
}

/// Reduce raw `ffprobe` JSON to a [`MediaInfo`].
pub(crate) fn parse_probe_output(json: &[u8], source_path: &Path) -> TrackburnResult<MediaInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        codec_name: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| TrackburnError::probe_failed(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            TrackburnError::probe_failed(format!(
                "no video stream found in '{}'",
                source_path.display()
            ))
        })?;
    let width = video_stream
        .width
        .ok_or_else(|| TrackburnError::probe_failed("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| TrackburnError::probe_failed("missing video height from ffprobe"))?;
    let duration_seconds = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| {
            TrackburnError::probe_failed(format!(
                "missing or invalid duration for '{}'",
                source_path.display()
            ))
        })?;
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));
    let video_codec = video_stream
        .codec_name
        .clone()
        .unwrap_or_else(|| "unknown".to_string());

    Ok(MediaInfo {
        source_path: source_path.to_path_buf(),
        duration_seconds,
        width,
        height,
        has_audio,
        video_codec,
    })
}

/// Return `true` when `ffprobe` can be invoked from `PATH`.
pub fn is_ffprobe_on_path() -> bool {
    Command::new("ffprobe")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
