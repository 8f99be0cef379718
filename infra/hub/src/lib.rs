//! # Broadcast Hub
//!
//! Pushes events to a changing set of long-lived subscriber connections.
//!
//! ## Overview
//!
//! A [`Hub`] owns one control loop (a tokio task) which is the only writer of the
//! membership registry. Attach, detach and publish requests are messages on a
//! single FIFO stream, processed strictly one at a time, so the registry needs
//! no locks and a publish never interleaves with a membership change.
//!
//! ```text
//!  Adapter ─ attach ──┐
//!  Adapter ─ detach ──┼─► [control stream] ─► control loop ─┬─► [queue S1] ─► Subscriber 1
//!  Producer ─ publish ┘        (FIFO)          (registry)   ├─► [queue S2] ─► Subscriber 2
//!                                                           └─► [queue SN] ─► Subscriber N
//! ```
//!
//! ## Guarantees
//!
//! * Per-subscriber FIFO: events published while a handle is attached arrive in
//!   publish order.
//! * Once a detach has been acknowledged, nothing is delivered to that handle.
//! * A slow subscriber never stalls the others: every queue is bounded and a
//!   full queue resolves through the configured [`OverflowPolicy`].
//! * No ordering across subscribers, and none between independent producers.
//!
//! ## Example
//!
//! ```rust
//! use beacon_hub::{Hub, HubConfig, HubError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), HubError> {
//!     let hub = Hub::spawn(HubConfig::default())?;
//!
//!     let mut subscriber = hub.attach().await?;
//!     hub.publish("alpha").await?;
//!
//!     let event = subscriber.recv().await.expect("attached subscriber receives");
//!     assert_eq!(event.data().as_ref(), b"alpha");
//!
//!     hub.detach(&subscriber).await;
//!     hub.shutdown().await;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod event;
mod hub;
mod registry;
mod subscriber;

pub use config::{DEFAULT_PUBLISH_CAPACITY, DEFAULT_SUBSCRIBER_CAPACITY, HubConfig, OverflowPolicy};
pub use error::{HubError, HubErrorExt};
pub use event::Event;
pub use hub::{Delivery, Hub, HubStats};
pub use subscriber::{Subscriber, SubscriberId, SubscriberState};
