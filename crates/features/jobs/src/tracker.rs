use crate::error::JobError;
use crate::job::{JobId, JobStatus};
use beacon_domain::config::JobsConfig;
use beacon_domain::constants::JOB_EVENT;
use beacon_hub::{Event, Hub};
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, info, trace, warn};

/// Advancement settings for every job of a tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    pub step: u8,
    pub step_interval: Duration,
    /// Publish each progress change to the hub, if one is attached.
    pub publish_progress: bool,
    /// Longest wait a blocking poll may ask for.
    pub max_wait: Duration,
    /// How long a finished or cancelled job stays queryable before eviction.
    pub retain: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::from(&JobsConfig::default())
    }
}

impl From<&JobsConfig> for TrackerConfig {
    fn from(config: &JobsConfig) -> Self {
        Self {
            step: config.step,
            step_interval: Duration::from_millis(config.step_interval_ms),
            publish_progress: config.publish_progress,
            max_wait: Duration::from_secs(config.max_wait_secs),
            retain: Duration::from_secs(config.retain_secs),
        }
    }
}

impl TrackerConfig {
    fn validate(self) -> Result<Self, JobError> {
        if self.step == 0 {
            return Err(JobError::InvalidConfiguration {
                message: "step must be greater than zero".into(),
                context: None,
            });
        }
        if self.step_interval.is_zero() {
            return Err(JobError::InvalidConfiguration {
                message: "step_interval must be greater than zero".into(),
                context: None,
            });
        }
        Ok(self)
    }
}

#[derive(Debug)]
struct JobEntry {
    status: Arc<watch::Sender<JobStatus>>,
    task: AbortHandle,
}

#[derive(Debug)]
struct TrackerInner {
    jobs: RwLock<FxHashMap<JobId, JobEntry>>,
    config: TrackerConfig,
    hub: Option<Hub>,
}

impl Drop for TrackerInner {
    fn drop(&mut self) {
        for entry in self.jobs.get_mut().values() {
            entry.task.abort();
        }
    }
}

/// Tracks jobs whose progress advances on a timer.
///
/// Each job is driven by its own cancellable task. Readers either take an
/// instant snapshot ([`JobTracker::status`]) or wait on the job's watch channel
/// until it finishes ([`JobTracker::wait`]).
#[derive(Debug, Clone)]
pub struct JobTracker {
    inner: Arc<TrackerInner>,
}

impl JobTracker {
    /// # Errors
    /// Returns [`JobError::InvalidConfiguration`] for a zero step or interval.
    pub fn new(config: TrackerConfig) -> Result<Self, JobError> {
        Self::build(config, None)
    }

    /// Like [`JobTracker::new`], publishing `job` events to `hub` when enabled.
    ///
    /// # Errors
    /// Returns [`JobError::InvalidConfiguration`] for a zero step or interval.
    pub fn with_hub(config: TrackerConfig, hub: Hub) -> Result<Self, JobError> {
        Self::build(config, Some(hub))
    }

    fn build(config: TrackerConfig, hub: Option<Hub>) -> Result<Self, JobError> {
        let config = config.validate()?;
        Ok(Self {
            inner: Arc::new(TrackerInner { jobs: RwLock::default(), config, hub }),
        })
    }

    #[must_use]
    pub fn config(&self) -> TrackerConfig {
        self.inner.config
    }

    /// Starts a new job at 0% and returns its id.
    ///
    /// # Errors
    /// Returns [`JobError::AlreadyScheduled`] in the unlikely event of an id collision.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn submit(&self) -> Result<JobId, JobError> {
        let id = JobId::generate();
        self.schedule(id.clone())?;
        Ok(id)
    }

    /// Starts advancing the job `id`.
    ///
    /// Finished jobs are evicted `retain` after they complete or are cancelled;
    /// their id can be scheduled again afterwards.
    ///
    /// # Errors
    /// Returns [`JobError::AlreadyScheduled`] if `id` is still tracked.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn schedule(&self, id: JobId) -> Result<(), JobError> {
        let mut jobs = self.inner.jobs.write();
        if jobs.contains_key(&id) {
            return Err(JobError::AlreadyScheduled {
                message: id.to_string().into(),
                context: None,
            });
        }

        let status = Arc::new(watch::Sender::new(JobStatus::started(id.clone())));
        let hub = self.inner.config.publish_progress.then(|| self.inner.hub.clone()).flatten();
        let task = tokio::spawn(advance(
            Arc::clone(&status),
            self.inner.config,
            hub,
            Arc::downgrade(&self.inner),
        ));

        jobs.insert(id.clone(), JobEntry { status, task: task.abort_handle() });
        info!(job = %id, "Job submitted");
        Ok(())
    }

    /// Current status without waiting (short poll).
    ///
    /// # Errors
    /// Returns [`JobError::NotFound`] for an unknown id.
    pub fn status(&self, id: &JobId) -> Result<JobStatus, JobError> {
        let jobs = self.inner.jobs.read();
        let entry = jobs.get(id).ok_or_else(|| JobError::not_found(id))?;
        Ok(entry.status.borrow().clone())
    }

    /// All tracked jobs, ordered by id.
    #[must_use]
    pub fn list(&self) -> Vec<JobStatus> {
        let mut all: Vec<JobStatus> =
            self.inner.jobs.read().values().map(|entry| entry.status.borrow().clone()).collect();
        all.sort_unstable_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Waits until the job completes or is cancelled (long poll).
    ///
    /// # Errors
    /// * [`JobError::NotFound`] for an unknown id.
    /// * [`JobError::Timeout`] if the job is still running after `timeout`.
    pub async fn wait(&self, id: &JobId, timeout: Duration) -> Result<JobStatus, JobError> {
        let mut status = {
            let jobs = self.inner.jobs.read();
            jobs.get(id).ok_or_else(|| JobError::not_found(id))?.status.subscribe()
        };

        match tokio::time::timeout(timeout, status.wait_for(JobStatus::is_finished)).await {
            Ok(Ok(finished)) => Ok(finished.clone()),
            Ok(Err(_)) => Err(JobError::Internal {
                message: "progress channel closed".into(),
                context: Some(id.to_string().into()),
            }),
            Err(_) => Err(JobError::Timeout {
                message: format!("still running after {}ms", timeout.as_millis()).into(),
                context: Some(id.to_string().into()),
            }),
        }
    }

    /// Stops advancing the job. Returns its final status; cancelling a finished
    /// job changes nothing.
    ///
    /// # Errors
    /// Returns [`JobError::NotFound`] for an unknown id.
    pub fn cancel(&self, id: &JobId) -> Result<JobStatus, JobError> {
        let jobs = self.inner.jobs.read();
        let entry = jobs.get(id).ok_or_else(|| JobError::not_found(id))?;

        entry.task.abort();
        if entry.status.send_if_modified(JobStatus::cancel) {
            info!(job = %id, "Job cancelled");
            retire(Arc::downgrade(&self.inner), id.clone());
        }
        Ok(entry.status.borrow().clone())
    }

    /// Aborts every running job. Used on process shutdown.
    pub fn shutdown(&self) -> usize {
        let jobs = self.inner.jobs.read();
        let mut cancelled = 0;
        for (id, entry) in jobs.iter() {
            entry.task.abort();
            if entry.status.send_if_modified(JobStatus::cancel) {
                retire(Arc::downgrade(&self.inner), id.clone());
                cancelled += 1;
            }
        }
        debug!(cancelled, "Job tracker stopped");
        cancelled
    }
}

async fn advance(
    status: Arc<watch::Sender<JobStatus>>,
    config: TrackerConfig,
    hub: Option<Hub>,
    tracker: Weak<TrackerInner>,
) {
    let mut ticker = tokio::time::interval(config.step_interval);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if !status.send_if_modified(|s| s.advance(config.step)) {
            return;
        }

        let snapshot = status.borrow().clone();
        trace!(job = %snapshot.id, progress = snapshot.progress, "Job advanced");
        if let Some(hub) = &hub {
            publish_progress(hub, &snapshot).await;
        }

        if snapshot.is_finished() {
            info!(job = %snapshot.id, "Job completed");
            retire(tracker, snapshot.id);
            return;
        }
    }
}

/// Drops the finished job `id` from the tracker once the retention period is over.
fn retire(tracker: Weak<TrackerInner>, id: JobId) {
    let Some(retain) = tracker.upgrade().map(|inner| inner.config.retain) else {
        return;
    };
    tokio::spawn(async move {
        tokio::time::sleep(retain).await;
        let Some(inner) = tracker.upgrade() else {
            return;
        };
        let mut jobs = inner.jobs.write();
        if jobs.get(&id).is_some_and(|entry| entry.status.borrow().is_finished()) {
            jobs.remove(&id);
            debug!(job = %id, "Finished job evicted");
        }
    });
}

async fn publish_progress(hub: &Hub, status: &JobStatus) {
    let payload = match serde_json::to_vec(status) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(job = %status.id, error = %e, "Failed to encode job progress");
            return;
        },
    };
    if let Err(e) = hub.publish(Event::named(JOB_EVENT, payload)).await {
        trace!(job = %status.id, error = %e, "Job progress not published");
    }
}
