//! Membership registry owned by the control loop.
//!
//! Nothing outside the loop ever touches it, which is why it is a plain map.

use crate::config::OverflowPolicy;
use crate::event::Event;
use crate::hub::Delivery;
use crate::subscriber::{Liveness, SubscriberId};
use fxhash::FxHashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

#[derive(Debug)]
pub(crate) struct Member {
    sender: mpsc::Sender<Arc<Event>>,
    liveness: Arc<Liveness>,
}

impl Member {
    pub(crate) const fn new(sender: mpsc::Sender<Arc<Event>>, liveness: Arc<Liveness>) -> Self {
        Self { sender, liveness }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    members: FxHashMap<SubscriberId, Member>,
}

impl Registry {
    /// Registers a member. Returns `false` (and keeps the existing entry) on a duplicate.
    pub(crate) fn insert(&mut self, id: SubscriberId, member: Member) -> bool {
        if self.members.contains_key(&id) {
            return false;
        }
        self.members.insert(id, member);
        true
    }

    /// Removes a member and marks it detached. Absent ids are a no-op.
    pub(crate) fn remove(&mut self, id: SubscriberId) -> bool {
        self.members.remove(&id).is_some_and(|member| {
            member.liveness.mark_detached();
            true
        })
    }

    /// Detaches everyone, closing every delivery queue.
    pub(crate) fn clear(&mut self) -> usize {
        let count = self.members.len();
        for (_, member) in self.members.drain() {
            member.liveness.mark_detached();
        }
        count
    }

    pub(crate) fn len(&self) -> usize {
        self.members.len()
    }

    pub(crate) fn ids(&self) -> Vec<SubscriberId> {
        let mut ids: Vec<SubscriberId> = self.members.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Hands `event` to every member's queue without waiting on any of them.
    ///
    /// Full queues resolve through `overflow`; closed queues are always evicted.
    pub(crate) fn deliver(
        &mut self,
        event: &Arc<Event>,
        overflow: OverflowPolicy,
        delivery: &mut Delivery,
    ) {
        let mut evicted = Vec::new();

        for (id, member) in &self.members {
            match member.sender.try_send(Arc::clone(event)) {
                Ok(()) => delivery.delivered += 1,
                Err(TrySendError::Full(_)) => match overflow {
                    OverflowPolicy::DropEvent => {
                        delivery.dropped += 1;
                        debug!(subscriber = %id, seq = event.seq(), "Event dropped: queue full");
                    },
                    OverflowPolicy::Disconnect => {
                        evicted.push(*id);
                        warn!(subscriber = %id, seq = event.seq(), "Subscriber disconnected: queue full");
                    },
                },
                Err(TrySendError::Closed(_)) => {
                    evicted.push(*id);
                    debug!(subscriber = %id, "Subscriber evicted: receiver gone");
                },
            }
        }

        delivery.disconnected += evicted.len();
        for id in evicted {
            self.remove(id);
        }
    }
}
