//! Cancellable, observable job execution.
//!
//! A [`scheduler::JobScheduler`] accepts [`spec::JobSpec`]s, runs each on a
//! bounded worker pool through a [`runner::JobRunner`], and publishes typed
//! [`event::JobEvent`]s to any number of subscribers. Handles stay
//! retrievable in a [`store::JobStore`] until they expire.

/// Event types, the broadcast hub, and job handles.
pub mod event;
/// The end-to-end orchestrator behind each job.
pub mod runner;
/// Worker pool with a concurrency ceiling.
pub mod scheduler;
/// The job submission contract.
pub mod spec;
/// Registry of live and recently finished jobs.
pub mod store;
