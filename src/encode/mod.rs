//! ffmpeg-backed media I/O.
//!
//! Everything that touches the system `ffmpeg`/`ffprobe` binaries lives
//! here: alpha-preserving overlay clip encoding, source probing, and the
//! final overlay composite. The rest of the crate only sees typed results
//! and the [`clip::ClipSink`] seam, which tests satisfy in memory.

/// Streaming overlay clips to an alpha-capable intermediate file.
pub mod clip;
/// Final composite of overlay clips onto the source video.
pub mod compose;
/// Source media inspection via `ffprobe`.
pub mod probe;
