//! # Jobs
//!
//! Long-running jobs whose progress clients can read in two ways:
//!
//! * **Short poll**: [`JobTracker::status`] returns the current snapshot at once.
//! * **Long poll**: [`JobTracker::wait`] resolves when the job finishes, driven by
//!   a per-job watch channel rather than periodic checks.
//!
//! Every job advances on its own cancellable task by a fixed step per interval
//! until it reaches 100%. With a [`beacon_hub::Hub`] attached, each change is
//! also pushed to SSE subscribers as a `job` event.
//!
//! With the `server` feature the crate also exposes [`api::jobs_router`].

#[cfg(feature = "server")]
pub mod api;
mod error;
mod job;
mod tracker;

pub use crate::error::{JobError, JobErrorExt};
pub use crate::job::{JobId, JobState, JobStatus};
pub use crate::tracker::{JobTracker, TrackerConfig};
