//! In-memory registry of submitted jobs.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::job::event::{JobHandle, JobId};

type ClockFn = dyn Fn() -> DateTime<Utc> + Send + Sync;

struct StoredJob {
    handle: JobHandle,
    terminal_seen: Option<DateTime<Utc>>,
}

/// Keeps job handles retrievable for their lifetime plus a grace period.
///
/// A job expires `ttl` after a sweep first observes it in a terminal
/// state; sweeps run on every access, so no background thread is needed.
/// The clock is injectable and tests drive it directly.
pub struct JobStore {
    ttl: Duration,
    clock: Box<ClockFn>,
    inner: Mutex<HashMap<JobId, StoredJob>>,
}

impl JobStore {
    /// Store using the real clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Box::new(Utc::now))
    }

    /// Store reading time from `clock`.
    pub fn with_clock(ttl: Duration, clock: Box<ClockFn>) -> Self {
        Self {
            ttl,
            clock,
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Record a submitted job.
    pub fn insert(&self, handle: JobHandle) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.insert(
                handle.id(),
                StoredJob {
                    handle,
                    terminal_seen: None,
                },
            );
            self.sweep(&mut inner);
        }
    }

    /// Fetch a job by id, if it has not expired.
    pub fn get(&self, id: JobId) -> Option<JobHandle> {
        let mut inner = self.inner.lock().ok()?;
        self.sweep(&mut inner);
        inner.get(&id).map(|job| job.handle.clone())
    }

    /// Forget a job immediately.
    pub fn remove(&self, id: JobId) -> Option<JobHandle> {
        let mut inner = self.inner.lock().ok()?;
        inner.remove(&id).map(|job| job.handle)
    }

    /// All unexpired jobs, in no particular order.
    pub fn jobs(&self) -> Vec<JobHandle> {
        let Ok(mut inner) = self.inner.lock() else {
            return Vec::new();
        };
        self.sweep(&mut inner);
        inner.values().map(|job| job.handle.clone()).collect()
    }

    /// Number of unexpired jobs.
    pub fn len(&self) -> usize {
        let Ok(mut inner) = self.inner.lock() else {
            return 0;
        };
        self.sweep(&mut inner);
        inner.len()
    }

    /// Whether the store holds no jobs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stamp newly terminal jobs, drop those terminal for at least the ttl.
    fn sweep(&self, inner: &mut HashMap<JobId, StoredJob>) {
        let now = (self.clock)();
        for job in inner.values_mut() {
            if job.terminal_seen.is_none() && job.handle.state().is_terminal() {
                job.terminal_seen = Some(now);
            }
        }
        let ttl = self.ttl;
        inner.retain(|_, job| match job.terminal_seen {
            Some(seen) => (now - seen).to_std().map(|age| age < ttl).unwrap_or(true),
            None => true,
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/store.rs"]
mod tests;
