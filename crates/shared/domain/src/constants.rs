//! Names shared by the server, the OpenAPI document and event consumers.

pub const SYSTEM_TAG: &str = "System";
pub const EVENTS_TAG: &str = "Events";
pub const JOBS_TAG: &str = "Jobs";

/// SSE event name of the clock producer.
pub const TICK_EVENT: &str = "tick";
/// SSE event name of job progress updates.
pub const JOB_EVENT: &str = "job";

/// Progress value of a finished job.
pub const JOB_COMPLETE: u8 = 100;
