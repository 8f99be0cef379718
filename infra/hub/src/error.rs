use std::borrow::Cow;

/// Errors surfaced by [`Hub`](crate::Hub) operations.
///
/// Slow or vanished subscribers are never reported here; they are resolved
/// inside the control loop.
#[beacon_derive::beacon_error]
pub enum HubError {
    /// The control loop has stopped (the hub was shut down).
    #[error("Hub closed{}: {message}", format_context(.context))]
    Closed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The publish queue is at capacity (only reported by non-waiting calls).
    #[error("Channel full{}: {message}", format_context(.context))]
    ChannelFull { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Capacity must be greater than zero for bounded queues.
    #[error("Invalid capacity{}: {message}", format_context(.context))]
    InvalidCapacity { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl HubError {
    pub(crate) fn closed(operation: &'static str) -> Self {
        Self::Closed { message: "control loop is not running".into(), context: Some(operation.into()) }
    }
}
