use beacon_domain::constants::JOB_COMPLETE;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

const SUFFIX_LEN: usize = 6;
const SUFFIX_ALPHABET: [char; 32] = [
    '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'j', 'k', 'm',
    'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '0',
];

/// Job identifier, `job:<unix-millis>-<suffix>` when generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    #[must_use]
    pub fn generate() -> Self {
        let suffix = nanoid::nanoid!(SUFFIX_LEN, &SUFFIX_ALPHABET);
        Self(format!("job:{}-{suffix}", Utc::now().timestamp_millis()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Running,
    Completed,
    Cancelled,
}

/// Point-in-time view of one job.
#[beacon_derive::api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub id: JobId,
    /// Percent complete, `0..=100`.
    pub progress: u8,
    pub state: JobState,
}

impl JobStatus {
    pub(crate) const fn started(id: JobId) -> Self {
        Self { id, progress: 0, state: JobState::Running }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state != JobState::Running
    }

    /// Adds `step` percent; returns whether the job changed.
    pub(crate) fn advance(&mut self, step: u8) -> bool {
        if self.is_finished() {
            return false;
        }
        self.progress = self.progress.saturating_add(step).min(JOB_COMPLETE);
        if self.progress == JOB_COMPLETE {
            self.state = JobState::Completed;
        }
        true
    }

    pub(crate) fn cancel(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.state = JobState::Cancelled;
        true
    }
}
