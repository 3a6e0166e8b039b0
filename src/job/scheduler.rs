//! Worker pool with a concurrency ceiling.
//!
//! Submissions beyond the ceiling wait in an unbounded queue; each worker
//! runs one job at a time, so at most `max_running_jobs` encoder
//! subprocesses exist at once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::foundation::error::{TrackburnError, TrackburnResult};
use crate::job::event::{JobEmitter, JobHandle, JobId, JobState, LogStream};
use crate::job::runner::{JobRunner, OverlayJobRunner};
use crate::job::spec::JobSpec;
use crate::job::store::JobStore;

/// Scheduler tuning, consumed at construction.
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Maximum number of concurrently running jobs; further submissions
    /// queue until a worker frees up.
    pub max_running_jobs: usize,
    /// How long finished jobs stay retrievable from the store.
    pub job_ttl: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_running_jobs: 3,
            job_ttl: Duration::from_secs(3600),
        }
    }
}

struct QueuedJob {
    id: JobId,
    spec: JobSpec,
    emitter: JobEmitter,
    cancel: Arc<AtomicBool>,
}

/// Accepts jobs, runs them on a bounded worker pool, and keeps their
/// handles in a [`JobStore`] until they expire.
pub struct JobScheduler {
    store: Arc<JobStore>,
    queue: Option<Sender<QueuedJob>>,
    workers: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    /// Scheduler running the production overlay runner.
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_runner(config, Arc::new(OverlayJobRunner))
    }

    /// Scheduler with an injected runner.
    pub fn with_runner(config: SchedulerConfig, runner: Arc<dyn JobRunner>) -> Self {
        let (tx, rx) = unbounded::<QueuedJob>();
        let workers = (0..config.max_running_jobs.max(1))
            .map(|_| {
                let rx = rx.clone();
                let runner = runner.clone();
                std::thread::spawn(move || worker_loop(rx, runner))
            })
            .collect();
        Self {
            store: Arc::new(JobStore::new(config.job_ttl)),
            queue: Some(tx),
            workers,
        }
    }

    /// Validate and enqueue one job.
    ///
    /// Structurally invalid job descriptions are rejected here; everything
    /// after acceptance is reported through the handle's event stream.
    pub fn submit(&self, spec: JobSpec) -> TrackburnResult<JobHandle> {
        spec.validate()?;
        let id = JobId::new();
        let (handle, emitter, cancel) = JobHandle::new(id);
        self.store.insert(handle.clone());
        let Some(queue) = &self.queue else {
            return Err(TrackburnError::validation("scheduler is shut down"));
        };
        queue
            .send(QueuedJob {
                id,
                spec,
                emitter,
                cancel,
            })
            .map_err(|_| anyhow::anyhow!("job queue disconnected"))?;
        tracing::info!(job = %id, "job queued");
        Ok(handle)
    }

    /// Look up a live (unexpired) job.
    pub fn job(&self, id: JobId) -> Option<JobHandle> {
        self.store.get(id)
    }

    /// Request cancellation of a job. Returns false for unknown ids.
    pub fn cancel(&self, id: JobId) -> bool {
        match self.store.get(id) {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// The backing job store.
    pub fn store(&self) -> &JobStore {
        &self.store
    }
}

impl Drop for JobScheduler {
    // Stops accepting work and waits for in-flight jobs to finish.
    fn drop(&mut self) {
        self.queue.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(queue: Receiver<QueuedJob>, runner: Arc<dyn JobRunner>) {
    while let Ok(job) = queue.recv() {
        execute(&job, runner.as_ref());
    }
}

/// Runs one dequeued job and emits its terminal event.
///
/// A job cancelled while still queued reaches `Cancelled` without the
/// runner ever starting. The state is advanced before the terminal event
/// fires, so an observer that sees the event reads the final state.
fn execute(job: &QueuedJob, runner: &dyn JobRunner) {
    let hub = job.emitter.hub();
    if job.cancel.load(Ordering::Relaxed) {
        job.emitter.log(LogStream::System, "job cancelled before start");
        hub.set_state(JobState::Cancelled);
        job.emitter.done(false);
        return;
    }
    hub.set_state(JobState::Running);
    match runner.run(job.id, &job.spec, &job.emitter, &job.cancel) {
        Ok(()) => {
            hub.set_state(JobState::Done);
            job.emitter.done(true);
        }
        Err(TrackburnError::Cancelled) => {
            job.emitter.log(LogStream::System, "job cancelled");
            hub.set_state(JobState::Cancelled);
            job.emitter.done(false);
        }
        Err(e) => {
            tracing::error!(job = %job.id, error = %e, "job failed");
            hub.set_state(JobState::Failed);
            job.emitter.error(e.to_string());
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/scheduler.rs"]
mod tests;
