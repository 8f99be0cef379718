use crate::config::{HubConfig, OverflowPolicy};
use crate::error::HubError;
use crate::event::Event;
use crate::registry::{Member, Registry};
use crate::subscriber::{Liveness, Subscriber, SubscriberId};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError, mpsc, oneshot, watch};
use tracing::{debug, info, trace};

/// Messages processed by the control loop, strictly in arrival order.
#[derive(Debug)]
pub(crate) enum Control {
    Attach { id: SubscriberId, member: Member, ack: oneshot::Sender<()> },
    Detach { id: SubscriberId, ack: Option<oneshot::Sender<()>> },
    Publish { event: Event, permit: OwnedSemaphorePermit, ack: Option<oneshot::Sender<Delivery>> },
    Members { reply: oneshot::Sender<Vec<SubscriberId>> },
    Shutdown { ack: oneshot::Sender<usize> },
}

/// Outcome of fanning out one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Sequence number the hub assigned to the event.
    pub seq: u64,
    /// Subscribers whose queue accepted the event.
    pub delivered: usize,
    /// Subscribers that skipped the event because their queue was full.
    pub dropped: usize,
    /// Subscribers removed while delivering (full queue under
    /// [`OverflowPolicy::Disconnect`], or a receiver that disappeared).
    pub disconnected: usize,
}

/// Running totals published by the control loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    pub subscribers: usize,
    pub published: u64,
    pub delivered: u64,
    pub dropped: u64,
    pub disconnected: u64,
}

#[derive(Debug)]
struct HubInner {
    control: mpsc::UnboundedSender<Control>,
    permits: Arc<Semaphore>,
    stats: watch::Receiver<HubStats>,
    config: HubConfig,
    next_id: AtomicU64,
}

/// Handle to a broadcast hub. Cheap to clone; all clones drive the same control loop.
#[derive(Debug, Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

impl Hub {
    /// Validates `config` and starts the control loop on the current tokio runtime.
    ///
    /// # Errors
    /// Returns [`HubError::InvalidCapacity`] if a capacity is zero.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn spawn(config: HubConfig) -> Result<Self, HubError> {
        Ok(Self::start(config.validate()?))
    }

    /// Starts a hub with [`HubConfig::default`].
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::start(HubConfig::default())
    }

    fn start(config: HubConfig) -> Self {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (stats_tx, stats_rx) = watch::channel(HubStats::default());
        let permits = Arc::new(Semaphore::new(config.publish_capacity));

        let control_loop = ControlLoop {
            registry: Registry::default(),
            overflow: config.overflow,
            next_seq: 0,
            control: control_rx,
            permits: Arc::clone(&permits),
            stats: stats_tx,
        };
        tokio::spawn(control_loop.run());

        info!(
            subscriber_capacity = config.subscriber_capacity,
            publish_capacity = config.publish_capacity,
            overflow = ?config.overflow,
            "Broadcast hub started"
        );

        Self {
            inner: Arc::new(HubInner {
                control: control_tx,
                permits,
                stats: stats_rx,
                config,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    /// Registers a new subscriber and returns its handle once the control loop admitted it.
    ///
    /// Every event admitted after this call resolves is delivered to the handle
    /// (subject to the overflow policy).
    ///
    /// # Errors
    /// Returns [`HubError::Closed`] after shutdown.
    pub async fn attach(&self) -> Result<Subscriber, HubError> {
        let id = SubscriberId::new(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::channel(self.inner.config.subscriber_capacity);
        let liveness = Arc::new(Liveness::new());
        let (ack, admitted) = oneshot::channel();

        let member = Member::new(sender, Arc::clone(&liveness));
        // Built before the attach is sent: if this future is dropped while
        // waiting for admission, dropping the handle queues the matching detach.
        let subscriber = Subscriber::new(id, receiver, liveness, self.inner.control.clone());
        self.send(Control::Attach { id, member, ack }, "attach")?;
        admitted.await.map_err(|_| HubError::closed("attach"))?;

        Ok(subscriber)
    }

    /// Removes `subscriber` from the registry and waits for the acknowledgement.
    ///
    /// After this resolves, the control loop never delivers to the handle again.
    /// Detaching an already-detached handle is a no-op, as is detaching after shutdown.
    pub async fn detach(&self, subscriber: &Subscriber) {
        subscriber.detach().await;
    }

    /// Hands `event` to the control loop.
    ///
    /// Suspends only while the publish queue is at capacity, never while
    /// subscribers are being served. Publishing with no subscribers is a no-op.
    ///
    /// # Errors
    /// Returns [`HubError::Closed`] after shutdown.
    pub async fn publish(&self, event: impl Into<Event>) -> Result<(), HubError> {
        let permit = self.acquire().await?;
        self.send(Control::Publish { event: event.into(), permit, ack: None }, "publish")
    }

    /// Like [`Hub::publish`] but never suspends.
    ///
    /// # Errors
    /// Returns [`HubError::ChannelFull`] when the publish queue is at capacity
    /// and [`HubError::Closed`] after shutdown.
    pub fn try_publish(&self, event: impl Into<Event>) -> Result<(), HubError> {
        let permit = Arc::clone(&self.inner.permits).try_acquire_owned().map_err(|e| match e {
            TryAcquireError::Closed => HubError::closed("try_publish"),
            TryAcquireError::NoPermits => HubError::ChannelFull {
                message: format!("{} publishes pending", self.inner.config.publish_capacity).into(),
                context: Some("try_publish".into()),
            },
        })?;
        self.send(Control::Publish { event: event.into(), permit, ack: None }, "try_publish")
    }

    /// Publishes `event` and waits until it has been handed to every attached
    /// subscriber's queue.
    ///
    /// # Errors
    /// Returns [`HubError::Closed`] after shutdown.
    pub async fn broadcast(&self, event: impl Into<Event>) -> Result<Delivery, HubError> {
        let permit = self.acquire().await?;
        let (ack, delivered) = oneshot::channel();
        self.send(Control::Publish { event: event.into(), permit, ack: Some(ack) }, "broadcast")?;
        delivered.await.map_err(|_| HubError::closed("broadcast"))
    }

    /// Ids currently in the registry, sorted.
    ///
    /// # Errors
    /// Returns [`HubError::Closed`] after shutdown.
    pub async fn members(&self) -> Result<Vec<SubscriberId>, HubError> {
        let (reply, members) = oneshot::channel();
        self.send(Control::Members { reply }, "members")?;
        members.await.map_err(|_| HubError::closed("members"))
    }

    /// Attached subscribers as of the last processed control message.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.stats.borrow().subscribers
    }

    #[must_use]
    pub fn stats(&self) -> HubStats {
        *self.inner.stats.borrow()
    }

    /// Receiver that observes every stats update.
    #[must_use]
    pub fn watch_stats(&self) -> watch::Receiver<HubStats> {
        self.inner.stats.clone()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.control.is_closed()
    }

    /// Stops the control loop, detaching every subscriber.
    ///
    /// Returns how many subscribers were still attached. Publishes queued
    /// behind the shutdown are discarded. Calling it again returns `0`.
    pub async fn shutdown(&self) -> usize {
        let (ack, done) = oneshot::channel();
        if self.send(Control::Shutdown { ack }, "shutdown").is_err() {
            return 0;
        }
        done.await.unwrap_or(0)
    }

    async fn acquire(&self) -> Result<OwnedSemaphorePermit, HubError> {
        Arc::clone(&self.inner.permits)
            .acquire_owned()
            .await
            .map_err(|_| HubError::closed("publish"))
    }

    fn send(&self, message: Control, operation: &'static str) -> Result<(), HubError> {
        self.inner.control.send(message).map_err(|_| HubError::closed(operation))
    }
}

/// The single writer of the membership registry.
struct ControlLoop {
    registry: Registry,
    overflow: OverflowPolicy,
    next_seq: u64,
    control: mpsc::UnboundedReceiver<Control>,
    permits: Arc<Semaphore>,
    stats: watch::Sender<HubStats>,
}

impl ControlLoop {
    async fn run(mut self) {
        while let Some(message) = self.control.recv().await {
            match message {
                Control::Attach { id, member, ack } => self.attach(id, member, ack),
                Control::Detach { id, ack } => self.detach(id, ack),
                Control::Publish { event, permit, ack } => {
                    self.fan_out(event, ack);
                    drop(permit);
                },
                Control::Members { reply } => {
                    let _ = reply.send(self.registry.ids());
                },
                Control::Shutdown { ack } => {
                    let detached = self.stop();
                    let _ = ack.send(detached);
                    return;
                },
            }
        }

        // Every handle and every hub clone is gone.
        self.stop();
    }

    fn attach(&mut self, id: SubscriberId, member: Member, ack: oneshot::Sender<()>) {
        if self.registry.insert(id, member) {
            debug!(subscriber = %id, subscribers = self.registry.len(), "Subscriber attached");
            self.refresh_count();
        } else {
            trace!(subscriber = %id, "Duplicate attach ignored");
        }
        let _ = ack.send(());
    }

    fn detach(&mut self, id: SubscriberId, ack: Option<oneshot::Sender<()>>) {
        if self.registry.remove(id) {
            debug!(subscriber = %id, subscribers = self.registry.len(), "Subscriber detached");
            self.refresh_count();
        } else {
            trace!(subscriber = %id, "Detach of unknown subscriber ignored");
        }
        if let Some(ack) = ack {
            let _ = ack.send(());
        }
    }

    fn fan_out(&mut self, event: Event, ack: Option<oneshot::Sender<Delivery>>) {
        self.next_seq += 1;
        let event = Arc::new(event.stamped(self.next_seq));
        let mut delivery = Delivery { seq: self.next_seq, ..Delivery::default() };

        self.registry.deliver(&event, self.overflow, &mut delivery);
        trace!(
            seq = delivery.seq,
            delivered = delivery.delivered,
            dropped = delivery.dropped,
            disconnected = delivery.disconnected,
            "Event dispatched"
        );

        let subscribers = self.registry.len();
        self.stats.send_modify(|stats| {
            stats.subscribers = subscribers;
            stats.published += 1;
            stats.delivered += delivery.delivered as u64;
            stats.dropped += delivery.dropped as u64;
            stats.disconnected += delivery.disconnected as u64;
        });

        if let Some(ack) = ack {
            let _ = ack.send(delivery);
        }
    }

    fn stop(&mut self) -> usize {
        self.permits.close();
        self.control.close();
        let detached = self.registry.clear();
        self.refresh_count();
        info!(detached, "Broadcast hub stopped");
        detached
    }

    fn refresh_count(&self) {
        let subscribers = self.registry.len();
        self.stats.send_modify(|stats| stats.subscribers = subscribers);
    }
}
