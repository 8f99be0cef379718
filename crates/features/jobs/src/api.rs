//! HTTP surface of the job tracker.

use crate::{JobError, JobId, JobStatus, JobTracker};
use axum::Json;
use axum::extract::{FromRef, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use beacon_derive::{api_handler, api_model};
use beacon_domain::constants::JOBS_TAG;
use std::time::Duration;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Error payload of the job endpoints.
#[api_model]
pub struct JobErrorBody {
    pub error: String,
}

#[api_model(rename_all = "snake_case")]
#[derive(Default)]
pub struct WaitQuery {
    /// Seconds to wait before answering with the running status.
    pub timeout_secs: Option<u64>,
}

impl IntoResponse for JobError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::AlreadyScheduled { .. } => StatusCode::CONFLICT,
            Self::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            Self::InvalidConfiguration { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        };
        (status, Json(JobErrorBody { error: self.to_string() })).into_response()
    }
}

#[api_handler(
    post,
    path = "/jobs",
    responses((status = CREATED, description = "Job started", body = JobStatus)),
    tag = JOBS_TAG,
)]
pub async fn submit_handler(
    State(jobs): State<JobTracker>,
) -> Result<impl IntoResponse, JobError> {
    let id = jobs.submit()?;
    Ok((StatusCode::CREATED, Json(jobs.status(&id)?)))
}

#[api_handler(
    get,
    path = "/jobs",
    responses((status = OK, description = "All tracked jobs", body = Vec<JobStatus>)),
    tag = JOBS_TAG,
)]
pub async fn list_handler(State(jobs): State<JobTracker>) -> Json<Vec<JobStatus>> {
    Json(jobs.list())
}

#[api_handler(
    get,
    path = "/jobs/{id}",
    params(("id" = String, Path, description = "Job id")),
    responses(
        (status = OK, description = "Current progress", body = JobStatus),
        (status = NOT_FOUND, description = "Unknown job", body = JobErrorBody),
    ),
    tag = JOBS_TAG,
)]
pub async fn status_handler(
    State(jobs): State<JobTracker>,
    Path(id): Path<String>,
) -> Result<Json<JobStatus>, JobError> {
    Ok(Json(jobs.status(&JobId::from(id))?))
}

#[api_handler(
    delete,
    path = "/jobs/{id}",
    params(("id" = String, Path, description = "Job id")),
    responses(
        (status = OK, description = "Final status", body = JobStatus),
        (status = NOT_FOUND, description = "Unknown job", body = JobErrorBody),
    ),
    tag = JOBS_TAG,
)]
pub async fn cancel_handler(
    State(jobs): State<JobTracker>,
    Path(id): Path<String>,
) -> Result<Json<JobStatus>, JobError> {
    Ok(Json(jobs.cancel(&JobId::from(id))?))
}

/// Long poll: answers `200` once the job finished, or `202` with the running
/// status when the wait ran out.
#[api_handler(
    get,
    path = "/jobs/{id}/wait",
    params(
        ("id" = String, Path, description = "Job id"),
        ("timeout_secs" = Option<u64>, Query, description = "Seconds to wait, capped by the server"),
    ),
    responses(
        (status = OK, description = "Job finished", body = JobStatus),
        (status = ACCEPTED, description = "Still running", body = JobStatus),
        (status = NOT_FOUND, description = "Unknown job", body = JobErrorBody),
    ),
    tag = JOBS_TAG,
)]
pub async fn wait_handler(
    State(jobs): State<JobTracker>,
    Path(id): Path<String>,
    Query(query): Query<WaitQuery>,
) -> Result<(StatusCode, Json<JobStatus>), JobError> {
    let id = JobId::from(id);
    let max_wait = jobs.config().max_wait;
    let timeout =
        query.timeout_secs.map_or(max_wait, |secs| Duration::from_secs(secs).min(max_wait));

    match jobs.wait(&id, timeout).await {
        Ok(status) => Ok((StatusCode::OK, Json(status))),
        Err(JobError::Timeout { .. }) => {
            let status = jobs.status(&id)?;
            let code = if status.is_finished() { StatusCode::OK } else { StatusCode::ACCEPTED };
            Ok((code, Json(status)))
        },
        Err(e) => Err(e),
    }
}

/// Routes under `/jobs`, for any state the tracker can be extracted from.
pub fn jobs_router<S>() -> OpenApiRouter<S>
where
    S: Send + Sync + Clone + 'static,
    JobTracker: FromRef<S>,
{
    OpenApiRouter::<S>::new()
        .routes(routes!(submit_handler, list_handler))
        .routes(routes!(status_handler, cancel_handler))
        .routes(routes!(wait_handler))
}
