#![allow(dead_code)]

use beacon_hub::{Event, Hub, HubConfig, OverflowPolicy, Subscriber};
use std::sync::Arc;
use std::time::Duration;

pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

pub fn hub_with(subscriber_capacity: usize, overflow: OverflowPolicy) -> Hub {
    Hub::spawn(
        HubConfig::default().with_subscriber_capacity(subscriber_capacity).with_overflow(overflow),
    )
    .expect("valid hub config")
}

pub async fn next_event(subscriber: &mut Subscriber) -> Option<Arc<Event>> {
    tokio::time::timeout(RECV_TIMEOUT, subscriber.recv()).await.expect("subscriber stalled")
}

pub async fn next_text(subscriber: &mut Subscriber) -> String {
    let event = next_event(subscriber).await.expect("subscriber stream ended early");
    event.text().into_owned()
}

/// Drains whatever is already queued without waiting.
pub fn drain(subscriber: &mut Subscriber) -> Vec<Arc<Event>> {
    std::iter::from_fn(|| subscriber.try_recv()).collect()
}
