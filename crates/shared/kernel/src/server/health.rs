use axum::extract::State;
use axum::http::header;
use axum::{Json, response::IntoResponse};
use beacon_derive::{api_handler, api_model};
use beacon_domain::constants::SYSTEM_TAG;
use beacon_hub::Hub;
use std::sync::LazyLock;
use std::time::Instant;

#[api_model]
/// Health check response
pub struct HealthResponse {
    /// `up` while the hub accepts connections, `draining` after shutdown
    status: &'static str,
    version: &'static str,
    /// Uptime in seconds
    uptime: u64,
    /// Attached SSE subscribers
    subscribers: usize,
}

static START_TIME: LazyLock<Instant> = LazyLock::new(Instant::now);

#[api_handler(
    get,
    path = "/health",
    responses((status = OK, description = "Healthcheck endpoint", body = HealthResponse)),
    tag = SYSTEM_TAG,
)]
pub(super) async fn health_handler(State(hub): State<Hub>) -> impl IntoResponse {
    let body = HealthResponse {
        status: if hub.is_closed() { "draining" } else { "up" },
        version: env!("CARGO_PKG_VERSION"),
        uptime: START_TIME.elapsed().as_secs(),
        subscribers: hub.subscriber_count(),
    };

    (
        [
            (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
            (header::PRAGMA, "no-cache"),
        ],
        Json(body),
    )
}
