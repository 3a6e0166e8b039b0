use super::*;
use crossbeam_channel::TryRecvError;

#[test]
fn events_fan_out_to_every_subscriber() {
    let hub = EventHub::new();
    let a = hub.subscribe();
    let b = hub.subscribe();
    hub.emit(JobEvent::Log {
        stream: LogStream::System,
        message: "starting".into(),
    });
    hub.emit(JobEvent::Done { success: true });

    let a: Vec<JobEvent> = a.try_iter().collect();
    let b: Vec<JobEvent> = b.try_iter().collect();
    assert_eq!(a, b);
    assert_eq!(a.len(), 2);
    assert!(a[1].is_terminal());
}

#[test]
fn progress_percent_never_decreases() {
    let hub = EventHub::new();
    let rx = hub.subscribe();
    hub.emit(JobEvent::Progress { percent: 10.0, message: None });
    hub.emit(JobEvent::Progress { percent: 5.0, message: None });
    hub.emit(JobEvent::Progress { percent: 20.0, message: None });

    let got: Vec<f64> = rx
        .try_iter()
        .map(|e| match e {
            JobEvent::Progress { percent, .. } => percent,
            other => panic!("unexpected event {other:?}"),
        })
        .collect();
    assert_eq!(got, vec![10.0, 10.0, 20.0]);
}

#[test]
fn non_finite_percent_is_held_at_the_high_water_mark() {
    let hub = EventHub::new();
    let rx = hub.subscribe();
    hub.emit(JobEvent::Progress { percent: 40.0, message: None });
    hub.emit(JobEvent::Progress { percent: f64::NAN, message: None });

    let got: Vec<JobEvent> = rx.try_iter().collect();
    assert_eq!(got[1], JobEvent::Progress { percent: 40.0, message: None });
}

#[test]
fn nothing_is_emitted_after_the_terminal_event() {
    let hub = EventHub::new();
    let rx = hub.subscribe();
    hub.emit(JobEvent::Done { success: false });
    hub.emit(JobEvent::Progress { percent: 50.0, message: None });
    hub.emit(JobEvent::Error { message: "late".into() });

    let got: Vec<JobEvent> = rx.try_iter().collect();
    assert_eq!(got, vec![JobEvent::Done { success: false }]);
    // The stream closes with the terminal event.
    assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));
}

#[test]
fn late_subscriber_still_receives_the_terminal_event() {
    let hub = EventHub::new();
    hub.emit(JobEvent::Progress { percent: 50.0, message: None });
    hub.emit(JobEvent::Error { message: "boom".into() });

    let got: Vec<JobEvent> = hub.subscribe().iter().collect();
    assert_eq!(got, vec![JobEvent::Error { message: "boom".into() }]);
}

#[test]
fn terminal_state_is_sticky() {
    let hub = EventHub::new();
    assert_eq!(hub.state(), JobState::Pending);
    hub.set_state(JobState::Running);
    assert_eq!(hub.state(), JobState::Running);
    hub.set_state(JobState::Cancelled);
    hub.set_state(JobState::Running);
    hub.set_state(JobState::Done);
    assert_eq!(hub.state(), JobState::Cancelled);
}

#[test]
fn cancel_is_idempotent_on_the_handle() {
    let (handle, emitter, cancel) = JobHandle::new(JobId::new());
    handle.cancel();
    handle.cancel();
    assert!(handle.is_cancel_requested());
    assert!(cancel.load(Ordering::Relaxed));

    emitter.hub().set_state(JobState::Cancelled);
    handle.cancel();
    assert_eq!(handle.state(), JobState::Cancelled);
}

#[test]
fn handle_clones_observe_the_same_job() {
    let (handle, emitter, _cancel) = JobHandle::new(JobId::new());
    let clone = handle.clone();
    assert_eq!(handle.id(), clone.id());
    assert_eq!(handle.created_at(), clone.created_at());

    let rx = clone.events();
    emitter.done(true);
    assert_eq!(rx.iter().count(), 1);
    assert_eq!(handle.state(), clone.state());
}

#[test]
fn events_serialize_with_a_type_tag() {
    let progress = serde_json::to_value(JobEvent::Progress { percent: 12.5, message: None }).unwrap();
    assert_eq!(progress["type"], "progress");
    assert_eq!(progress["percent"], 12.5);
    assert!(progress.get("message").is_none());

    let log = serde_json::to_value(JobEvent::Log {
        stream: LogStream::Stderr,
        message: "x".into(),
    })
    .unwrap();
    assert_eq!(log["type"], "log");
    assert_eq!(log["stream"], "stderr");

    let done = serde_json::to_value(JobEvent::Done { success: true }).unwrap();
    assert_eq!(done["type"], "done");
    assert_eq!(done["success"], true);
}

#[test]
fn job_ids_are_unique_and_display_as_uuid() {
    let a = JobId::new();
    let b = JobId::new();
    assert_ne!(a, b);
    assert_eq!(a.to_string().len(), 36);
}

#[test]
fn terminal_states_are_exactly_the_three_final_ones() {
    assert!(!JobState::Pending.is_terminal());
    assert!(!JobState::Running.is_terminal());
    assert!(JobState::Done.is_terminal());
    assert!(JobState::Failed.is_terminal());
    assert!(JobState::Cancelled.is_terminal());
}
