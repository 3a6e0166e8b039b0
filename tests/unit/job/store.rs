use super::*;
use crate::job::event::{JobEmitter, JobState};
use std::sync::Arc;

fn store_with_clock(ttl_secs: u64) -> (JobStore, Arc<Mutex<DateTime<Utc>>>) {
    let now = Arc::new(Mutex::new(Utc::now()));
    let clock = now.clone();
    let store = JobStore::with_clock(
        Duration::from_secs(ttl_secs),
        Box::new(move || *clock.lock().unwrap()),
    );
    (store, now)
}

fn advance(clock: &Arc<Mutex<DateTime<Utc>>>, seconds: i64) {
    let mut guard = clock.lock().unwrap();
    *guard = *guard + chrono::Duration::seconds(seconds);
}

fn job_pair() -> (JobHandle, JobEmitter) {
    let (handle, emitter, _cancel) = JobHandle::new(JobId::new());
    (handle, emitter)
}

fn handle_in_state(state: JobState) -> JobHandle {
    let (handle, emitter) = job_pair();
    if state != JobState::Pending {
        emitter.hub().set_state(state);
    }
    handle
}

#[test]
fn live_jobs_never_expire() {
    let (store, clock) = store_with_clock(60);
    let pending = handle_in_state(JobState::Pending);
    let running = handle_in_state(JobState::Running);
    store.insert(pending.clone());
    store.insert(running.clone());

    advance(&clock, 1_000_000);
    assert_eq!(store.len(), 2);
    assert!(store.get(pending.id()).is_some());
    assert!(store.get(running.id()).is_some());
}

#[test]
fn finished_jobs_expire_once_the_ttl_has_passed() {
    let (store, clock) = store_with_clock(60);
    let handle = handle_in_state(JobState::Done);
    store.insert(handle.clone());

    advance(&clock, 59);
    assert!(store.get(handle.id()).is_some());

    advance(&clock, 1);
    assert!(store.get(handle.id()).is_none());
    assert!(store.is_empty());
}

#[test]
fn retention_clock_starts_when_the_terminal_state_is_first_seen() {
    let (store, clock) = store_with_clock(60);
    let (handle, emitter) = job_pair();
    emitter.hub().set_state(JobState::Running);
    store.insert(handle.clone());

    // Finishes while nobody is looking; the next access stamps it.
    advance(&clock, 500);
    emitter.hub().set_state(JobState::Done);
    advance(&clock, 500);
    assert_eq!(store.len(), 1);

    advance(&clock, 59);
    assert!(store.get(handle.id()).is_some());
    advance(&clock, 1);
    assert!(store.get(handle.id()).is_none());
}

#[test]
fn remove_forgets_a_job_immediately() {
    let (store, _clock) = store_with_clock(60);
    let handle = handle_in_state(JobState::Running);
    store.insert(handle.clone());

    assert!(store.remove(handle.id()).is_some());
    assert!(store.get(handle.id()).is_none());
    assert!(store.remove(handle.id()).is_none());
}

#[test]
fn jobs_lists_only_unexpired_entries() {
    let (store, clock) = store_with_clock(60);
    let finished = handle_in_state(JobState::Failed);
    let running = handle_in_state(JobState::Running);
    store.insert(finished.clone());
    store.insert(running.clone());

    advance(&clock, 120);
    let remaining = store.jobs();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id(), running.id());
}
