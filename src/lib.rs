//! Trackburn burns GPS track overlays into video.
//!
//! A [`JobSpec`] names a source video, a KML track, and the overlay panels to
//! draw. Submitting it to a [`JobScheduler`] returns a [`JobHandle`]:
//!
//! - Subscribe to [`JobEvent`]s for progress, log lines, and the outcome
//! - Cancel at any point; partial output is cleaned up
//! - Look the job up again later through the scheduler's store
//!
//! The pipeline itself parses the track, rasterizes the speed gauge, info
//! panel, and mini-map as transparent clips, and drives `ffmpeg` to overlay
//! them onto the source video.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Overlay clip encoding, media probing, and ffmpeg composition.
pub mod encode;
/// Error taxonomy and crate-wide value types.
pub mod foundation;
/// Job specs, scheduling, eventing, and the job registry.
pub mod job;
/// Overlay panel layout and rasterization.
pub mod overlay;
/// KML track parsing and the time-indexed track model.
pub mod track;

pub use crate::foundation::core::{Corner, SpeedUnit};
pub use crate::foundation::error::{TrackburnError, TrackburnResult};

pub use crate::encode::clip::{ClipConfig, ClipSink, FfmpegClipSink, MemoryClipSink};
pub use crate::encode::compose::{ComposeLayer, ComposeRequest, compose_overlays};
pub use crate::encode::probe::{MediaInfo, probe_media};
pub use crate::job::event::{JobEmitter, JobEvent, JobHandle, JobId, JobState, LogStream};
pub use crate::job::runner::{JobRunner, OverlayJobRunner};
pub use crate::job::scheduler::{JobScheduler, SchedulerConfig};
pub use crate::job::spec::{JobSpec, TrackSource};
pub use crate::job::store::JobStore;
pub use crate::overlay::layer::{LayerKind, LayerRenderer, RenderWindow};
pub use crate::overlay::options::{GaugeOptions, InfoPanelOptions, MiniMapOptions, OverlayOptions};
pub use crate::track::model::{GeoBounds, Track, TrackPoint};
