use crate::AppState;
use axum::Router;
use beacon_jobs::api::jobs_router;
use beacon_kernel::server::{events_router, system_router};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};

#[derive(OpenApi)]
#[openapi(info(title = "Beacon", description = "Server-push broadcast hub"))]
struct ApiDoc;

/// Full application router: health, SSE events, jobs and the `/api` reference UI.
pub fn init(state: AppState) -> Router {
    let (routes, api_doc) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(system_router())
        .merge(events_router())
        .merge(jobs_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .split_for_parts();

    Router::new().merge(routes).merge(Scalar::with_url("/api", api_doc))
}
