use crate::event::Event;
use crate::hub::Control;
use futures_util::Stream;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::{mpsc, oneshot};
use tracing::trace;

/// Identifier of one attached connection, unique per hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Lifecycle of a subscriber handle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    /// Registered; receives every event admitted from now on.
    Attached,
    /// Close requested; the control loop has not processed the detach yet.
    Detaching,
    /// Removed from the registry; no further deliveries.
    Detached,
}

const ATTACHED: u8 = 0;
const DETACHING: u8 = 1;
const DETACHED: u8 = 2;

/// State shared between a handle and its registry entry.
#[derive(Debug)]
pub(crate) struct Liveness(AtomicU8);

impl Liveness {
    pub(crate) const fn new() -> Self {
        Self(AtomicU8::new(ATTACHED))
    }

    pub(crate) fn load(&self) -> SubscriberState {
        match self.0.load(Ordering::Acquire) {
            ATTACHED => SubscriberState::Attached,
            DETACHING => SubscriberState::Detaching,
            _ => SubscriberState::Detached,
        }
    }

    /// `Attached -> Detaching`; true only for the caller that made the transition.
    pub(crate) fn begin_detach(&self) -> bool {
        self.0.compare_exchange(ATTACHED, DETACHING, Ordering::AcqRel, Ordering::Acquire).is_ok()
    }

    pub(crate) fn mark_detached(&self) {
        self.0.store(DETACHED, Ordering::Release);
    }
}

/// Delivery end of one attached connection.
///
/// Owned exclusively by the connection that attached it. The hub keeps only
/// the sending half of the queue. Dropping the handle closes it, so a
/// connection that goes away without calling [`Subscriber::close`] is still
/// detached.
pub struct Subscriber {
    id: SubscriberId,
    receiver: mpsc::Receiver<Arc<Event>>,
    liveness: Arc<Liveness>,
    control: mpsc::UnboundedSender<Control>,
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("queued", &self.receiver.len())
            .finish_non_exhaustive()
    }
}

impl Subscriber {
    pub(crate) const fn new(
        id: SubscriberId,
        receiver: mpsc::Receiver<Arc<Event>>,
        liveness: Arc<Liveness>,
        control: mpsc::UnboundedSender<Control>,
    ) -> Self {
        Self { id, receiver, liveness, control }
    }

    #[must_use]
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> SubscriberState {
        self.liveness.load()
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.state() == SubscriberState::Attached
    }

    /// Number of events waiting in this handle's queue.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.receiver.len()
    }

    /// Waits for the next event.
    ///
    /// Returns `None` once the handle has been detached and its queue drained.
    pub async fn recv(&mut self) -> Option<Arc<Event>> {
        self.receiver.recv().await
    }

    /// Takes the next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<Event>> {
        self.receiver.try_recv().ok()
    }

    /// Requests a detach. Idempotent: only the first call reaches the hub.
    ///
    /// Does not wait for the control loop; use [`Hub::detach`](crate::Hub::detach)
    /// when the caller needs the acknowledgement.
    pub fn close(&self) {
        if !self.liveness.begin_detach() {
            return;
        }
        trace!(subscriber = %self.id, "Subscriber closing");
        // A closed control stream means the hub already dropped every member.
        let _ = self.control.send(Control::Detach { id: self.id, ack: None });
    }

    /// Closes the handle and waits until the control loop has removed it.
    ///
    /// Nothing is delivered to the handle once this resolves. Safe to call
    /// repeatedly and after the hub has shut down.
    pub async fn detach(&self) {
        self.liveness.begin_detach();
        let (ack, done) = oneshot::channel();
        if self.control.send(Control::Detach { id: self.id, ack: Some(ack) }).is_ok() {
            let _ = done.await;
        }
    }

    /// Turns the handle into a stream of events; dropping the stream closes the handle.
    pub fn into_stream(self) -> impl Stream<Item = Arc<Event>> + Send + 'static {
        futures_util::stream::unfold(self, |mut subscriber| async move {
            subscriber.recv().await.map(|event| (event, subscriber))
        })
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.close();
    }
}
