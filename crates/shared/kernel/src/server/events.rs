//! SSE connection adapter.
//!
//! Each `GET /events` request attaches one subscriber and streams its events
//! as SSE frames. When the client goes away axum drops the body stream, which
//! drops the subscriber handle and detaches it from the hub.

use super::error::ApiError;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::sse::{self, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use beacon_derive::{api_handler, api_model};
use beacon_domain::config::{ApiConfig, HubSettings, OverflowMode};
use beacon_domain::constants::EVENTS_TAG;
use beacon_hub::{Delivery, Event, Hub, HubConfig, OverflowPolicy};
use futures_util::StreamExt;
use std::borrow::Cow;
use std::convert::Infallible;
use std::time::Duration;
use tracing::debug;

/// Hub settings as the broadcast hub expects them.
#[must_use]
pub fn hub_config(settings: &HubSettings) -> HubConfig {
    let overflow = match settings.overflow {
        OverflowMode::Drop => OverflowPolicy::DropEvent,
        OverflowMode::Disconnect => OverflowPolicy::Disconnect,
    };
    HubConfig::default()
        .with_subscriber_capacity(settings.subscriber_capacity)
        .with_publish_capacity(settings.publish_capacity)
        .with_overflow(overflow)
}

/// Renders one hub event as an SSE frame.
///
/// The sequence number becomes the `id:` field. Carriage returns in the
/// payload are normalized to line feeds, so a multi-line payload becomes
/// several `data:` lines of the same frame.
#[must_use]
pub fn sse_frame(event: &Event) -> sse::Event {
    let text = event.text();
    let data = if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        text
    };

    let mut frame = sse::Event::default().id(event.seq().to_string());
    if let Some(name) = event.name().filter(|name| is_valid_event_name(name)) {
        frame = frame.event(name);
    }
    frame.data(data)
}

fn is_valid_event_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['\r', '\n'])
}

#[api_model(rename_all = "snake_case")]
#[derive(Default)]
pub struct PublishQuery {
    /// SSE event name; unnamed events reach the `message` listener.
    pub event: Option<String>,
}

/// Outcome of `POST /events`.
#[api_model]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DeliveryResponse {
    pub seq: u64,
    pub delivered: usize,
    pub dropped: usize,
    pub disconnected: usize,
}

impl From<Delivery> for DeliveryResponse {
    fn from(delivery: Delivery) -> Self {
        Self {
            seq: delivery.seq,
            delivered: delivery.delivered,
            dropped: delivery.dropped,
            disconnected: delivery.disconnected,
        }
    }
}

#[api_handler(
    get,
    path = "/events",
    responses(
        (status = OK, description = "Server-sent event stream", content_type = "text/event-stream"),
        (status = SERVICE_UNAVAILABLE, description = "Hub shutting down", body = super::ApiErrorBody),
    ),
    tag = EVENTS_TAG,
)]
pub(super) async fn subscribe_handler(
    State(hub): State<Hub>,
    State(config): State<ApiConfig>,
) -> Result<Response, ApiError> {
    let subscriber = hub.attach().await?;
    debug!(subscriber = %subscriber.id(), "SSE stream opened");

    let stream = subscriber.into_stream().map(|event| Ok::<_, Infallible>(sse_frame(&event)));
    let keep_alive = config.hub.keep_alive_secs;
    let sse = if keep_alive == 0 {
        Sse::new(stream).into_response()
    } else {
        Sse::new(stream)
            .keep_alive(KeepAlive::new().interval(Duration::from_secs(keep_alive)))
            .into_response()
    };

    Ok(([(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")], sse).into_response())
}

#[api_handler(
    post,
    path = "/events",
    params(("event" = Option<String>, Query, description = "SSE event name")),
    request_body(content = String, description = "Event payload", content_type = "text/plain"),
    responses(
        (status = OK, description = "Delivered to every attached subscriber", body = DeliveryResponse),
        (status = BAD_REQUEST, description = "Invalid event name", body = super::ApiErrorBody),
        (status = SERVICE_UNAVAILABLE, description = "Hub shutting down", body = super::ApiErrorBody),
    ),
    tag = EVENTS_TAG,
)]
pub(super) async fn publish_handler(
    State(hub): State<Hub>,
    Query(query): Query<PublishQuery>,
    body: Bytes,
) -> Result<Json<DeliveryResponse>, ApiError> {
    let event = match query.event {
        Some(name) if !is_valid_event_name(&name) => {
            return Err(ApiError::BadRequest {
                message: "event name must be non-empty and single-line".into(),
                context: Some("publish".into()),
            });
        },
        Some(name) => Event::named(name, body),
        None => Event::new(body),
    };

    let delivery = hub.broadcast(event).await?;
    debug!(seq = delivery.seq, delivered = delivery.delivered, "Event published over HTTP");
    Ok(Json(delivery.into()))
}
