//! Overlay clip encoding.
//!
//! Each overlay layer becomes a short alpha-preserving clip that the final
//! composite consumes. Frames stream to the system `ffmpeg` as raw RGBA
//! over stdin; the clip itself uses the PNG codec in a QuickTime container
//! because that pairing round-trips the alpha channel losslessly.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::foundation::error::{TrackburnError, TrackburnResult};
use crate::overlay::raster::Raster;

/// Configuration provided to a [`ClipSink`] before the first frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Clip frame rate.
    pub fps: u32,
}

/// Sink contract for consuming overlay frames in sample order.
///
/// `push_frame` is called with frames of exactly the configured size, in
/// strictly increasing sample order, between one `begin` and one `finish`.
pub trait ClipSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, config: ClipConfig) -> TrackburnResult<()>;
    /// Push the next frame.
    fn push_frame(&mut self, frame: &Raster) -> TrackburnResult<()>;
    /// Called once after the last frame; completes the clip.
    fn finish(&mut self) -> TrackburnResult<()>;
}

/// Sink that spawns the system `ffmpeg` and streams raw frames to stdin.
pub struct FfmpegClipSink {
    out_path: PathBuf,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    config: Option<ClipConfig>,
    frames_written: u64,
}

impl FfmpegClipSink {
    /// Create a sink encoding into `out_path` (conventionally `.mov`).
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            config: None,
            frames_written: 0,
        }
    }
}

impl ClipSink for FfmpegClipSink {
    fn begin(&mut self, config: ClipConfig) -> TrackburnResult<()> {
        if config.width == 0 || config.height == 0 {
            return Err(TrackburnError::validation("clip width/height must be non-zero"));
        }
        if config.fps == 0 {
            return Err(TrackburnError::validation("clip fps must be non-zero"));
        }

        ensure_parent_dir(&self.out_path)?;
        if !is_ffmpeg_on_path() {
            return Err(TrackburnError::encode_failed(
                "ffmpeg is required for overlay encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg("-y");

        // Input: raw straight-alpha RGBA8 frames over stdin.
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", config.width, config.height),
            "-r",
            &config.fps.to_string(),
            "-i",
            "pipe:0",
        ]);

        // Output: PNG frames in MOV, the alpha-preserving intermediate.
        cmd.args(["-an", "-c:v", "png", "-pix_fmt", "rgba"]);
        cmd.arg(&self.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            TrackburnError::encode_failed(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            TrackburnError::encode_failed("failed to open ffmpeg stdin (unexpected)")
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| {
            TrackburnError::encode_failed("failed to open ffmpeg stderr (unexpected)")
        })?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.scratch = vec![0u8; (config.width * config.height * 4) as usize];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.config = Some(config);
        self.frames_written = 0;
        Ok(())
    }

    fn push_frame(&mut self, frame: &Raster) -> TrackburnResult<()> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| TrackburnError::encode_failed("clip sink not started"))?;
        if frame.width != config.width || frame.height != config.height {
            return Err(TrackburnError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, config.width, config.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(TrackburnError::validation(
                "frame data size mismatch with width*height*4",
            ));
        }

        // Rendered frames are premultiplied; rawvideo rgba is straight alpha.
        unpremultiply_rgba8(&mut self.scratch, &frame.data)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(TrackburnError::encode_failed("clip sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            TrackburnError::encode_failed(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> TrackburnResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| TrackburnError::encode_failed("clip sink not started"))?;

        let status = child.wait().map_err(|e| {
            TrackburnError::encode_failed(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| TrackburnError::encode_failed("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| {
                    TrackburnError::encode_failed(format!("ffmpeg stderr read failed: {e}"))
                })?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(TrackburnError::encode_failed(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        tracing::debug!(
            clip = %self.out_path.display(),
            frames = self.frames_written,
            "overlay clip finished"
        );
        self.config = None;
        Ok(())
    }
}

impl Drop for FfmpegClipSink {
    fn drop(&mut self) {
        // Reached with a live child only when the clip was abandoned
        // mid-stream (cancellation or render error).
        if let Some(mut child) = self.child.take() {
            drop(self.stdin.take());
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct MemoryClipSink {
    config: Option<ClipConfig>,
    frames: Vec<Raster>,
    finished: bool,
}

impl MemoryClipSink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&ClipConfig> {
        self.config.as_ref()
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[Raster] {
        &self.frames
    }

    /// True once `finish` has run.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl ClipSink for MemoryClipSink {
    fn begin(&mut self, config: ClipConfig) -> TrackburnResult<()> {
        self.config = Some(config);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, frame: &Raster) -> TrackburnResult<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> TrackburnResult<()> {
        self.finished = true;
        Ok(())
    }
}

/// Convert premultiplied RGBA8 to straight-alpha RGBA8.
fn unpremultiply_rgba8(dst: &mut [u8], src_premul: &[u8]) -> TrackburnResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(TrackburnError::validation(
            "unpremultiply_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = s[3] as u16;
        if a == 0 {
            d.copy_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        d[0] = ((s[0] as u16 * 255 + a / 2) / a).min(255) as u8;
        d[1] = ((s[1] as u16 * 255 + a / 2) / a).min(255) as u8;
        d[2] = ((s[2] as u16 * 255 + a / 2) / a).min(255) as u8;
        d[3] = s[3];
    }

    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> TrackburnResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
