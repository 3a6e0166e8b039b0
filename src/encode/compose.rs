//! Final overlay composite.
//!
//! One `ffmpeg` invocation overlays every layer clip onto the source
//! video with a `-filter_complex` chain, carrying source audio through
//! when present. Overlay clips run at the low overlay rate; the overlay
//! filter holds each frame until the next sample, which upsamples them
//! to the video rate without re-encoding work on our side.
//!
//! Encoder progress is read from the `-stats` line on stderr; other
//! stderr lines are forwarded to the caller and kept for error reports.

use std::fmt::Write as _;
use std::io::{BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::encode::clip::{ensure_parent_dir, is_ffmpeg_on_path};
use crate::foundation::core::Corner;
use crate::foundation::error::{TrackburnError, TrackburnResult};

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);
const STDERR_TAIL_LINES: usize = 32;

/// One rendered overlay clip and where it lands on the video.
#[derive(Clone, Debug)]
pub struct ComposeLayer {
    /// Path to the alpha-preserving clip file.
    pub clip_path: std::path::PathBuf,
    /// Video corner the clip is anchored to.
    pub corner: Corner,
}

/// Inputs for one composite run.
#[derive(Debug)]
pub struct ComposeRequest<'a> {
    /// Source video file.
    pub source: &'a Path,
    /// Final output file.
    pub output: &'a Path,
    /// Overlay clips in compositing order; must be non-empty.
    pub layers: &'a [ComposeLayer],
    /// Distance from the video edges, in pixels.
    pub margin_px: u32,
    /// Source duration in seconds, used to scale encoder progress.
    pub duration_seconds: f64,
    /// Output frame rate; `None` keeps the source rate.
    pub output_fps: Option<u32>,
}

/// Overlay-filter position expressions for a corner at `margin_px`.
pub(crate) fn overlay_position(corner: Corner, margin_px: u32) -> (String, String) {
    let near = margin_px.to_string();
    match corner {
        Corner::TopLeft => (near.clone(), near),
        Corner::TopRight => (format!("W-w-{margin_px}"), near),
        Corner::BottomLeft => (near, format!("H-h-{margin_px}")),
        Corner::BottomRight => (format!("W-w-{margin_px}"), format!("H-h-{margin_px}")),
    }
}

/// Builds the `-filter_complex` chain and the label of its final output.
///
/// Input 0 is the source video; overlay clip `i` is input `i + 1`. Each
/// step overlays one clip onto the running result, so later layers stack
/// above earlier ones where they overlap.
pub(crate) fn build_filter_graph(layers: &[ComposeLayer], margin_px: u32) -> (String, String) {
    let mut graph = String::new();
    let mut prev = "0:v".to_string();
    for (i, layer) in layers.iter().enumerate() {
        let (x, y) = overlay_position(layer.corner, margin_px);
        let out = format!("ov{}", i + 1);
        if i > 0 {
            graph.push(';');
        }
        let _ = write!(graph, "[{prev}][{}:v]overlay=x={x}:y={y}[{out}]", i + 1);
        prev = out;
    }
    (graph, format!("[{prev}]"))
}

/// Full `ffmpeg` argument list for a composite run.
pub(crate) fn build_compose_args(request: &ComposeRequest<'_>) -> Vec<String> {
    let (graph, final_label) = build_filter_graph(request.layers, request.margin_px);

    let mut args: Vec<String> = ["-y", "-loglevel", "error", "-stats"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    args.push("-i".to_string());
    args.push(request.source.to_string_lossy().into_owned());
    for layer in request.layers {
        args.push("-i".to_string());
        args.push(layer.clip_path.to_string_lossy().into_owned());
    }
    args.push("-filter_complex".to_string());
    args.push(graph);
    args.push("-map".to_string());
    args.push(final_label);
    // `0:a?` keeps source audio when it exists and is a no-op otherwise.
    args.push("-map".to_string());
    args.push("0:a?".to_string());
    args.extend(
        ["-c:v", "libx264", "-pix_fmt", "yuv420p", "-c:a", "aac", "-movflags", "+faststart"]
            .iter()
            .map(|s| s.to_string()),
    );
    if let Some(fps) = request.output_fps {
        args.push("-r".to_string());
        args.push(fps.to_string());
    }
    args.push(request.output.to_string_lossy().into_owned());
    args
}

/// Composites overlay clips onto the source video.
///
/// `on_progress` receives raw encoder percentages in `0..=100` as the
/// `-stats` line advances; `on_log` receives every other stderr line. A
/// raised `cancel` flag kills the encoder and fails with
/// [`TrackburnError::Cancelled`].
pub fn compose_overlays(
    request: &ComposeRequest<'_>,
    cancel: &AtomicBool,
    mut on_progress: impl FnMut(f64),
    mut on_log: impl FnMut(&str),
) -> TrackburnResult<()> {
    if request.layers.is_empty() {
        return Err(TrackburnError::validation(
            "composite requires at least one overlay clip",
        ));
    }
    ensure_parent_dir(request.output)?;
    if !is_ffmpeg_on_path() {
        return Err(TrackburnError::encode_failed(
            "ffmpeg is required for compositing, but was not found on PATH",
        ));
    }

    let args = build_compose_args(request);
    tracing::debug!(output = %request.output.display(), layers = request.layers.len(), "spawning composite");

    let mut child = Command::new("ffmpeg")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            TrackburnError::encode_failed(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
    let stderr = child.stderr.take().ok_or_else(|| {
        TrackburnError::encode_failed("failed to open ffmpeg stderr (unexpected)")
    })?;

    let child = Mutex::new(child);
    let finished = AtomicBool::new(false);
    let mut read_error: Option<std::io::Error> = None;
    let mut tail: Vec<String> = Vec::new();

    let status = std::thread::scope(|scope| {
        // Kill the encoder promptly when the job is cancelled mid-encode.
        scope.spawn(|| {
            while !finished.load(Ordering::Relaxed) {
                if cancel.load(Ordering::Relaxed) {
                    if let Ok(mut c) = child.lock() {
                        let _ = c.kill();
                    }
                    break;
                }
                std::thread::sleep(CANCEL_POLL_INTERVAL);
            }
        });

        let mut reader = BufReader::new(stderr);
        let mut pending: Vec<u8> = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            // `-stats` lines end with a carriage return, ordinary log
            // lines with a newline; split on both.
            match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    for &b in &chunk[..n] {
                        if b == b'\r' || b == b'\n' {
                            consume_stderr_line(
                                &mut pending,
                                request.duration_seconds,
                                &mut on_progress,
                                &mut on_log,
                                &mut tail,
                            );
                        } else {
                            pending.push(b);
                        }
                    }
                }
                Err(e) => {
                    read_error = Some(e);
                    break;
                }
            }
        }
        consume_stderr_line(&mut pending, request.duration_seconds, &mut on_progress, &mut on_log, &mut tail);

        finished.store(true, Ordering::Relaxed);
        child
            .lock()
            .map_err(|_| TrackburnError::encode_failed("ffmpeg process lock poisoned"))?
            .wait()
            .map_err(|e| {
                TrackburnError::encode_failed(format!("failed to wait for ffmpeg to finish: {e}"))
            })
    })?;

    if cancel.load(Ordering::Relaxed) {
        return Err(TrackburnError::Cancelled);
    }
    if let Some(e) = read_error {
        return Err(TrackburnError::encode_failed(format!(
            "ffmpeg stderr read failed: {e}"
        )));
    }
    if !status.success() {
        return Err(TrackburnError::encode_failed(format!(
            "ffmpeg exited with status {}: {}",
            status,
            tail.join(" | ")
        )));
    }
    Ok(())
}

fn consume_stderr_line(
    pending: &mut Vec<u8>,
    total_seconds: f64,
    on_progress: &mut impl FnMut(f64),
    on_log: &mut impl FnMut(&str),
    tail: &mut Vec<String>,
) {
    if pending.is_empty() {
        return;
    }
    let line = String::from_utf8_lossy(pending).into_owned();
    pending.clear();
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    if let Some(percent) = parse_encode_progress(line, total_seconds) {
        on_progress(percent);
    } else {
        if tail.len() == STDERR_TAIL_LINES {
            tail.remove(0);
        }
        tail.push(line.to_string());
        on_log(line);
    }
}

/// Percent complete from an ffmpeg `-stats` line, like
/// `frame=  123 fps= 60 ... time=00:01:02.05 ... speed=1.5x`.
pub(crate) fn parse_encode_progress(line: &str, total_seconds: f64) -> Option<f64> {
    let time = extract_value(line, "time=")?;
    let seconds = parse_time_str(&time)?;
    if total_seconds <= 0.0 {
        return Some(0.0);
    }
    Some((seconds / total_seconds * 100.0).clamp(0.0, 100.0))
}

/// Extract a value from an ffmpeg `key=value` stats line.
fn extract_value(line: &str, key: &str) -> Option<String> {
    let start = line.find(key)? + key.len();
    let rest = line[start..].trim_start();
    let end = rest.find(|c: char| c.is_whitespace()).unwrap_or(rest.len());
    let value = &rest[..end];
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse an ffmpeg time string like `00:01:02.05` into seconds.
fn parse_time_str(s: &str) -> Option<f64> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 3 {
        return None;
    }
    let hours: f64 = parts[0].parse().ok()?;
    let minutes: f64 = parts[1].parse().ok()?;
    let seconds: f64 = parts[2].parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}
