//! Job identity, state, and the observable event stream.
//!
//! One job owns one [`EventHub`] and the pipeline is its sole writer. Any
//! number of observers may subscribe before or after completion: live
//! events fan out to every subscriber, and the single terminal event is
//! retained so a late subscriber still learns how the job ended.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver};

/// Opaque job identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct JobId(uuid::Uuid);

impl JobId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle of a job.
///
/// `Pending -> Running -> {Done, Failed, Cancelled}`; terminal states
/// admit no further transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Accepted and queued, not yet running.
    Pending,
    /// A worker is executing the job.
    Running,
    /// Finished successfully.
    Done,
    /// Finished with an unrecoverable error.
    Failed,
    /// Stopped by an explicit cancel request.
    Cancelled,
}

impl JobState {
    /// Whether this state admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Failed | JobState::Cancelled)
    }
}

/// Origin of a log line in the event stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStream {
    /// Encoder standard output.
    Stdout,
    /// Encoder standard error.
    Stderr,
    /// Lines produced by the pipeline itself.
    System,
}

impl std::fmt::Display for LogStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LogStream::Stdout => "stdout",
            LogStream::Stderr => "stderr",
            LogStream::System => "system",
        };
        f.write_str(label)
    }
}

/// One entry in a job's observable event stream.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    /// Overall completion, optionally naming the stage just finished.
    Progress {
        /// Percent complete, 0 to 100, non-decreasing within a job.
        percent: f64,
        /// Short human-readable stage description.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// A line of diagnostic output.
    Log {
        /// Where the line came from.
        stream: LogStream,
        /// The line itself.
        message: String,
    },
    /// Terminal: the job finished. `success: false` covers both failure
    /// after start and cancellation; [`JobState`] tells those apart.
    Done {
        /// Whether an output file was produced.
        success: bool,
    },
    /// Terminal: the job failed, with a human-readable reason.
    Error {
        /// What went wrong.
        message: String,
    },
}

impl JobEvent {
    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobEvent::Done { .. } | JobEvent::Error { .. })
    }
}

#[derive(Debug)]
struct HubInner {
    subscribers: Vec<crossbeam_channel::Sender<JobEvent>>,
    terminal: Option<JobEvent>,
    highest_percent: f64,
    state: JobState,
}

/// Broadcast hub for one job's event stream.
///
/// Progress monotonicity is enforced here, so every producer thread
/// inherits the guarantee. Exactly one terminal event passes through;
/// anything emitted after it is dropped.
#[derive(Debug)]
pub struct EventHub {
    inner: Mutex<HubInner>,
}

impl EventHub {
    /// Hub for a freshly accepted job, in [`JobState::Pending`].
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HubInner {
                subscribers: Vec::new(),
                terminal: None,
                highest_percent: 0.0,
                state: JobState::Pending,
            }),
        }
    }

    /// Current job state.
    pub fn state(&self) -> JobState {
        self.inner.lock().map(|i| i.state).unwrap_or(JobState::Failed)
    }

    /// Advance the job state. Terminal states are sticky: once one is
    /// reached, further transitions are ignored.
    pub(crate) fn set_state(&self, next: JobState) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        if inner.state.is_terminal() {
            tracing::debug!(current = ?inner.state, refused = ?next, "state change after terminal ignored");
            return;
        }
        inner.state = next;
    }

    /// Attach an observer.
    ///
    /// A subscriber attaching after the terminal event fired receives that
    /// terminal event immediately and nothing else.
    pub fn subscribe(&self) -> Receiver<JobEvent> {
        let (tx, rx) = unbounded();
        if let Ok(mut inner) = self.inner.lock() {
            match &inner.terminal {
                Some(terminal) => {
                    let _ = tx.send(terminal.clone());
                }
                None => inner.subscribers.push(tx),
            }
        }
        rx
    }

    /// Broadcast `event` to every subscriber.
    ///
    /// Progress percentages below the high-water mark are raised to it
    /// (the initial 0 stands), and nothing is emitted after the terminal
    /// event.
    pub fn emit(&self, mut event: JobEvent) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        if inner.terminal.is_some() {
            tracing::debug!(?event, "event after terminal dropped");
            return;
        }
        if let JobEvent::Progress { percent, .. } = &mut event {
            if !percent.is_finite() || *percent < inner.highest_percent {
                *percent = inner.highest_percent;
            }
            inner.highest_percent = *percent;
        }
        let terminal = event.is_terminal();
        if terminal {
            inner.terminal = Some(event.clone());
        }
        inner.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        if terminal {
            // Dropping the senders closes every subscriber's stream.
            inner.subscribers.clear();
        }
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Write handle for one job's event stream.
#[derive(Clone)]
pub struct JobEmitter {
    hub: Arc<EventHub>,
}

impl JobEmitter {
    /// Emitter writing into `hub`.
    pub fn new(hub: Arc<EventHub>) -> Self {
        Self { hub }
    }

    /// Emit a progress event.
    pub fn progress(&self, percent: f64, message: Option<&str>) {
        self.hub.emit(JobEvent::Progress {
            percent,
            message: message.map(str::to_string),
        });
    }

    /// Emit a log line.
    pub fn log(&self, stream: LogStream, message: impl Into<String>) {
        self.hub.emit(JobEvent::Log {
            stream,
            message: message.into(),
        });
    }

    /// Emit the terminal done event.
    pub fn done(&self, success: bool) {
        self.hub.emit(JobEvent::Done { success });
    }

    /// Emit the terminal error event.
    pub fn error(&self, message: impl Into<String>) {
        self.hub.emit(JobEvent::Error {
            message: message.into(),
        });
    }

    pub(crate) fn hub(&self) -> &EventHub {
        &self.hub
    }
}

/// Caller-facing handle to a submitted job.
///
/// Cheap to clone; every clone observes the same job.
#[derive(Clone, Debug)]
pub struct JobHandle {
    id: JobId,
    created_at: DateTime<Utc>,
    hub: Arc<EventHub>,
    cancel: Arc<AtomicBool>,
}

impl JobHandle {
    /// Build a handle plus the matching emitter and cancel flag.
    pub(crate) fn new(id: JobId) -> (Self, JobEmitter, Arc<AtomicBool>) {
        let hub = Arc::new(EventHub::new());
        let cancel = Arc::new(AtomicBool::new(false));
        let handle = Self {
            id,
            created_at: Utc::now(),
            hub: hub.clone(),
            cancel: cancel.clone(),
        };
        (handle, JobEmitter::new(hub), cancel)
    }

    /// The job's identifier.
    pub fn id(&self) -> JobId {
        self.id
    }

    /// When the job was accepted.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Current state.
    pub fn state(&self) -> JobState {
        self.hub.state()
    }

    /// Attach an observer to the event stream.
    pub fn events(&self) -> Receiver<JobEvent> {
        self.hub.subscribe()
    }

    /// Request cancellation.
    ///
    /// Idempotent: repeated calls, and calls after the job already reached
    /// a terminal state, change nothing further.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/event.rs"]
mod tests;
