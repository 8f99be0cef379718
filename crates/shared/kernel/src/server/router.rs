use super::{events, health};
use axum::extract::FromRef;
use beacon_domain::config::ApiConfig;
use beacon_hub::Hub;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

pub fn system_router<S>() -> OpenApiRouter<S>
where
    S: Send + Sync + Clone + 'static,
    Hub: FromRef<S>,
{
    OpenApiRouter::<S>::new().routes(routes!(health::health_handler))
}

/// `GET /events` (SSE stream) and `POST /events` (publish).
pub fn events_router<S>() -> OpenApiRouter<S>
where
    S: Send + Sync + Clone + 'static,
    Hub: FromRef<S>,
    ApiConfig: FromRef<S>,
{
    OpenApiRouter::<S>::new().routes(routes!(events::subscribe_handler, events::publish_handler))
}
