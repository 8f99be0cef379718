use beacon_hub::Hub;
use beacon_jobs::*;
use std::time::Duration;
use tokio::time::{Instant, sleep};

fn tracker() -> JobTracker {
    JobTracker::new(TrackerConfig { publish_progress: false, ..TrackerConfig::default() })
        .expect("valid tracker config")
}

#[tokio::test(start_paused = true)]
async fn test_progress_advances_by_step() {
    let jobs = tracker();
    let id = jobs.submit().unwrap();
    assert_eq!(jobs.status(&id).unwrap().progress, 0);

    sleep(Duration::from_millis(4500)).await;

    let status = jobs.status(&id).unwrap();
    assert_eq!(status.progress, 20);
    assert_eq!(status.state, JobState::Running);
}

#[tokio::test(start_paused = true)]
async fn test_wait_resolves_on_completion() {
    let jobs = tracker();
    let id = jobs.submit().unwrap();
    let started = Instant::now();

    let status = jobs.wait(&id, Duration::from_secs(60)).await.unwrap();

    assert_eq!(status.progress, 100);
    assert_eq!(status.state, JobState::Completed);
    assert_eq!(started.elapsed(), Duration::from_secs(20));

    // A finished job answers immediately.
    let again = jobs.wait(&id, Duration::ZERO).await.unwrap();
    assert_eq!(again, status);
}

#[tokio::test(start_paused = true)]
async fn test_wait_times_out_while_running() {
    let jobs = tracker();
    let id = jobs.submit().unwrap();

    let err = jobs.wait(&id, Duration::from_secs(3)).await.unwrap_err();
    assert!(matches!(err, JobError::Timeout { .. }));
    assert_eq!(jobs.status(&id).unwrap().progress, 10);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_freezes_progress_and_is_idempotent() {
    let jobs = tracker();
    let id = jobs.submit().unwrap();
    sleep(Duration::from_secs(5)).await;

    let cancelled = jobs.cancel(&id).unwrap();
    assert_eq!(cancelled.state, JobState::Cancelled);
    assert_eq!(cancelled.progress, 20);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(jobs.status(&id).unwrap(), cancelled);
    assert_eq!(jobs.cancel(&id).unwrap(), cancelled);
    assert_eq!(jobs.wait(&id, Duration::from_secs(1)).await.unwrap(), cancelled);
}

#[tokio::test(start_paused = true)]
async fn test_waiter_observes_cancellation() {
    let jobs = tracker();
    let id = jobs.submit().unwrap();

    let waiter = {
        let jobs = jobs.clone();
        let id = id.clone();
        tokio::spawn(async move { jobs.wait(&id, Duration::from_secs(60)).await })
    };
    sleep(Duration::from_secs(3)).await;
    jobs.cancel(&id).unwrap();

    let status = waiter.await.unwrap().unwrap();
    assert_eq!(status.state, JobState::Cancelled);
    assert_eq!(status.progress, 10);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_schedule_is_rejected() {
    let jobs = tracker();
    jobs.schedule(JobId::from("job:fixed")).unwrap();

    let err = jobs.schedule(JobId::from("job:fixed")).unwrap_err();
    assert!(matches!(err, JobError::AlreadyScheduled { .. }));
    assert_eq!(jobs.list().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_job_is_not_found() {
    let jobs = tracker();
    let missing = JobId::from("job:missing");

    assert!(matches!(jobs.status(&missing), Err(JobError::NotFound { .. })));
    assert!(matches!(jobs.cancel(&missing), Err(JobError::NotFound { .. })));
    assert!(matches!(
        jobs.wait(&missing, Duration::from_secs(1)).await,
        Err(JobError::NotFound { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_running_jobs() {
    let jobs = tracker();
    let finished = JobId::from("job:done");
    jobs.schedule(finished.clone()).unwrap();
    jobs.wait(&finished, Duration::from_secs(60)).await.unwrap();

    let first = jobs.submit().unwrap();
    let second = jobs.submit().unwrap();
    assert_eq!(jobs.shutdown(), 2);

    assert_eq!(jobs.status(&first).unwrap().state, JobState::Cancelled);
    assert_eq!(jobs.status(&second).unwrap().state, JobState::Cancelled);
    assert_eq!(jobs.status(&finished).unwrap().state, JobState::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_finished_jobs_are_evicted_after_retention() {
    let jobs = JobTracker::new(TrackerConfig {
        publish_progress: false,
        retain: Duration::from_secs(60),
        ..TrackerConfig::default()
    })
    .unwrap();

    let cancelled: Vec<JobId> = (0..50).map(|_| jobs.submit().unwrap()).collect();
    for id in &cancelled {
        jobs.cancel(id).unwrap();
    }
    let completed = jobs.submit().unwrap();
    jobs.wait(&completed, Duration::from_secs(60)).await.unwrap();

    // Cancelled 20s ago, completed just now: everything is still queryable.
    assert_eq!(jobs.list().len(), 51);

    sleep(Duration::from_secs(45)).await;
    assert_eq!(jobs.list().len(), 1, "cancelled jobs are gone after 60s");
    assert!(matches!(jobs.status(&cancelled[0]), Err(JobError::NotFound { .. })));
    assert_eq!(jobs.status(&completed).unwrap().state, JobState::Completed);

    sleep(Duration::from_secs(20)).await;
    assert!(jobs.list().is_empty());
    assert!(matches!(jobs.status(&completed), Err(JobError::NotFound { .. })));

    // An evicted id can be scheduled again.
    jobs.schedule(completed.clone()).unwrap();
    assert_eq!(jobs.status(&completed).unwrap().progress, 0);
}

#[tokio::test(start_paused = true)]
async fn test_running_jobs_are_never_evicted() {
    let jobs = JobTracker::new(TrackerConfig {
        publish_progress: false,
        step: 1,
        retain: Duration::ZERO,
        ..TrackerConfig::default()
    })
    .unwrap();
    let id = jobs.submit().unwrap();

    sleep(Duration::from_secs(30)).await;
    assert_eq!(jobs.status(&id).unwrap().state, JobState::Running);
}

#[test]
fn test_zero_step_is_rejected() {
    let err = JobTracker::new(TrackerConfig { step: 0, ..TrackerConfig::default() }).unwrap_err();
    assert!(matches!(err, JobError::InvalidConfiguration { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_progress_is_pushed_to_hub() {
    let hub = Hub::with_defaults();
    let mut subscriber = hub.attach().await.unwrap();
    let config = TrackerConfig { step: 50, ..TrackerConfig::default() };
    let jobs = JobTracker::with_hub(config, hub.clone()).unwrap();

    let id = jobs.submit().unwrap();

    let mut seen = Vec::new();
    for _ in 0..2 {
        let event = subscriber.recv().await.expect("job event");
        assert_eq!(event.name(), Some("job"));
        seen.push(serde_json::from_slice::<JobStatus>(event.data()).unwrap());
    }

    assert!(seen.iter().all(|status| status.id == id));
    assert_eq!(seen[0].progress, 50);
    assert_eq!(seen[1].progress, 100);
    assert_eq!(seen[1].state, JobState::Completed);
}
