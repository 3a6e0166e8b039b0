//! One job end to end: validate, probe, render layers, composite.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::Context as _;
use rayon::prelude::*;

use crate::encode::clip::FfmpegClipSink;
use crate::encode::compose::{compose_overlays, ComposeLayer, ComposeRequest};
use crate::encode::probe::probe_media;
use crate::foundation::error::{TrackburnError, TrackburnResult};
use crate::job::event::{JobEmitter, JobId, LogStream};
use crate::job::spec::JobSpec;
use crate::overlay::layer::{LayerKind, LayerRenderer, RenderWindow};
use crate::overlay::options::OverlayOptions;
use crate::track::model::Track;

/// Progress reached once inputs are validated.
const VALIDATED_PERCENT: f64 = 5.0;
/// Progress reached once the source video is probed.
const PROBED_PERCENT: f64 = 10.0;
/// Progress reached once every overlay layer clip is rendered.
const RENDERED_PERCENT: f64 = 20.0;
/// Share of overall progress covered by the final encode.
const ENCODE_SHARE: f64 = 75.0;

/// Executes one job handed over by the scheduler.
pub trait JobRunner: Send + Sync {
    /// Run `spec` to completion, reporting through `emitter` and honoring
    /// `cancel` between units of work.
    fn run(
        &self,
        id: JobId,
        spec: &JobSpec,
        emitter: &JobEmitter,
        cancel: &AtomicBool,
    ) -> TrackburnResult<()>;
}

/// The production runner: renders overlay clips and drives ffmpeg.
pub struct OverlayJobRunner;

impl JobRunner for OverlayJobRunner {
    fn run(
        &self,
        id: JobId,
        spec: &JobSpec,
        emitter: &JobEmitter,
        cancel: &AtomicBool,
    ) -> TrackburnResult<()> {
        run_job(id, spec, emitter, cancel)
    }
}

/// Runs one overlay job end to end.
///
/// Progress lands at fixed marks per stage: 5% after validation, 10%
/// after probing, 20% once every layer clip is rendered (split evenly
/// across enabled layers), and the encoder's own percentage maps onto the
/// remaining span. Overlay clips live in a job-scoped temp directory that
/// is removed on every exit path.
#[tracing::instrument(skip_all, fields(job = %id))]
pub fn run_job(
    id: JobId,
    spec: &JobSpec,
    emitter: &JobEmitter,
    cancel: &AtomicBool,
) -> TrackburnResult<()> {
    spec.validate()?;
    if !spec.video_path.is_file() {
        return Err(TrackburnError::validation(format!(
            "source video not found: {}",
            spec.video_path.display()
        )));
    }
    let track = spec.load_track()?;
    check_cancel(cancel)?;
    emitter.progress(VALIDATED_PERCENT, Some("inputs validated"));

    let media = probe_media(&spec.video_path)?;
    check_cancel(cancel)?;
    emitter.progress(PROBED_PERCENT, Some("source video probed"));

    let temp = JobTempDir::create(id)?;
    let window = RenderWindow {
        duration_seconds: media.duration_seconds,
        offset_seconds: spec.offset_seconds,
        overlay_fps: spec.overlay_fps,
    };
    let enabled = enabled_layers(&spec.overlay);
    let clips = render_layers(spec, &track, &enabled, &window, temp.path(), emitter, cancel)?;
    check_cancel(cancel)?;
    if clips.is_empty() {
        return Err(TrackburnError::no_track_data(
            "no overlay layer could be rendered for this track",
        ));
    }
    emitter.progress(RENDERED_PERCENT, Some("overlay layers rendered"));

    let request = ComposeRequest {
        source: &spec.video_path,
        output: &spec.output_path,
        layers: &clips,
        margin_px: spec.overlay.margin_px,
        duration_seconds: media.duration_seconds,
        output_fps: spec.output_fps,
    };
    compose_overlays(
        &request,
        cancel,
        |p| emitter.progress(encode_progress_percent(p), None),
        |line| emitter.log(LogStream::Stderr, line),
    )?;
    emitter.progress(100.0, Some("encode complete"));
    tracing::info!(output = %spec.output_path.display(), "job complete");
    Ok(())
}

/// Enabled layers in their fixed compositing order.
fn enabled_layers(options: &OverlayOptions) -> Vec<LayerKind> {
    LayerKind::ALL
        .iter()
        .copied()
        .filter(|kind| kind.enabled_in(options))
        .collect()
}

/// Progress after `completed` of `total` layer clips are done.
fn layer_progress_percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return RENDERED_PERCENT;
    }
    PROBED_PERCENT + (RENDERED_PERCENT - PROBED_PERCENT) * completed as f64 / total as f64
}

/// Overall percent for a raw encoder percent in `0..=100`.
fn encode_progress_percent(encoder_percent: f64) -> f64 {
    RENDERED_PERCENT + (encoder_percent / 100.0) * ENCODE_SHARE
}

/// Renders every enabled layer into its own clip file, in parallel.
///
/// Layers that cannot render for lack of track data are skipped with a
/// system log line instead of failing the job; the returned clips keep
/// compositing order.
fn render_layers(
    spec: &JobSpec,
    track: &Track,
    enabled: &[LayerKind],
    window: &RenderWindow,
    temp_dir: &Path,
    emitter: &JobEmitter,
    cancel: &AtomicBool,
) -> TrackburnResult<Vec<ComposeLayer>> {
    let completed = AtomicUsize::new(0);
    let results: Vec<TrackburnResult<Option<ComposeLayer>>> = enabled
        .par_iter()
        .map(|&kind| {
            let clip = render_one_layer(spec, track, kind, window, temp_dir, emitter, cancel)?;
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            let message = format!("{kind} layer rendered");
            emitter.progress(layer_progress_percent(done, enabled.len()), Some(&message));
            Ok(clip)
        })
        .collect();

    if cancel.load(Ordering::Relaxed) {
        return Err(TrackburnError::Cancelled);
    }
    let mut clips = Vec::new();
    for result in results {
        if let Some(clip) = result? {
            clips.push(clip);
        }
    }
    Ok(clips)
}

fn render_one_layer(
    spec: &JobSpec,
    track: &Track,
    kind: LayerKind,
    window: &RenderWindow,
    temp_dir: &Path,
    emitter: &JobEmitter,
    cancel: &AtomicBool,
) -> TrackburnResult<Option<ComposeLayer>> {
    let mut renderer = LayerRenderer::new(spec.overlay.clone())?;
    let clip_path = temp_dir.join(format!("{}.mov", kind.name()));
    let mut sink = FfmpegClipSink::new(&clip_path);
    match renderer.render_layer(track, kind, window, &mut sink, cancel) {
        Ok(true) => Ok(Some(ComposeLayer {
            clip_path,
            corner: kind.anchor(),
        })),
        Ok(false) => {
            emitter.log(
                LogStream::System,
                format!("layer {kind} has nothing to draw, skipped"),
            );
            Ok(None)
        }
        Err(TrackburnError::NoTrackData(reason)) => {
            tracing::warn!(layer = %kind, %reason, "layer skipped");
            emitter.log(LogStream::System, format!("skipping {kind} layer: {reason}"));
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn check_cancel(cancel: &AtomicBool) -> TrackburnResult<()> {
    if cancel.load(Ordering::Relaxed) {
        return Err(TrackburnError::Cancelled);
    }
    Ok(())
}

/// Job-scoped temporary directory for overlay clips.
///
/// Removal happens on drop, so cleanup runs on success, failure, and
/// cancellation alike.
struct JobTempDir {
    path: PathBuf,
}

impl JobTempDir {
    fn create(id: JobId) -> TrackburnResult<Self> {
        let path = std::env::temp_dir().join(format!("trackburn_job_{id}"));
        std::fs::create_dir_all(&path)
            .with_context(|| format!("failed to create temp dir '{}'", path.display()))?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for JobTempDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove job temp dir");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/runner.rs"]
mod tests;
