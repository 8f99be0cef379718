use crate::error::HubError;

/// Default per-subscriber queue size.
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 64;
/// Default number of publishes admitted but not yet fanned out.
pub const DEFAULT_PUBLISH_CAPACITY: usize = 1024;
const MIN_CAPACITY: usize = 1;

/// What the control loop does when a subscriber's queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Drop the event for that subscriber only and keep it attached (lossy broadcast).
    #[default]
    DropEvent,
    /// Force-detach the subscriber; its stream ends after draining what is queued.
    Disconnect,
}

/// Hub sizing and backpressure settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubConfig {
    /// Capacity of every subscriber's delivery queue.
    pub subscriber_capacity: usize,
    /// Publishes that may wait for the control loop before producers suspend.
    pub publish_capacity: usize,
    /// Policy applied to a subscriber whose queue is full.
    pub overflow: OverflowPolicy,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            subscriber_capacity: DEFAULT_SUBSCRIBER_CAPACITY,
            publish_capacity: DEFAULT_PUBLISH_CAPACITY,
            overflow: OverflowPolicy::default(),
        }
    }
}

impl HubConfig {
    #[must_use]
    pub const fn with_subscriber_capacity(mut self, capacity: usize) -> Self {
        self.subscriber_capacity = capacity;
        self
    }

    #[must_use]
    pub const fn with_publish_capacity(mut self, capacity: usize) -> Self {
        self.publish_capacity = capacity;
        self
    }

    #[must_use]
    pub const fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    pub(crate) fn validate(self) -> Result<Self, HubError> {
        validate_capacity("subscriber_capacity", self.subscriber_capacity)?;
        validate_capacity("publish_capacity", self.publish_capacity)?;
        Ok(self)
    }
}

fn validate_capacity(field: &'static str, capacity: usize) -> Result<(), HubError> {
    if capacity < MIN_CAPACITY {
        return Err(HubError::InvalidCapacity {
            message: format!("{field} must be >= {MIN_CAPACITY}").into(),
            context: None,
        });
    }
    Ok(())
}
