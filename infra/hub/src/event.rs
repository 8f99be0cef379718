use bytes::Bytes;
use std::borrow::Cow;

/// An immutable event payload with an optional name.
///
/// Events carry no identity beyond their content. The hub stamps each admitted
/// event with a sequence number reflecting admission order; an event that was
/// never published reports `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    seq: u64,
    name: Option<Cow<'static, str>>,
    data: Bytes,
}

impl Event {
    /// Creates an unnamed event.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { seq: 0, name: None, data: data.into() }
    }

    /// Creates a named event (rendered as the SSE `event:` field).
    pub fn named(name: impl Into<Cow<'static, str>>, data: impl Into<Bytes>) -> Self {
        Self { seq: 0, name: Some(name.into()), data: data.into() }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Position in the hub's admission order, starting at 1.
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub const fn data(&self) -> &Bytes {
        &self.data
    }

    /// Payload as text, replacing invalid UTF-8 sequences.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn stamped(mut self, seq: u64) -> Self {
        self.seq = seq;
        self
    }
}

impl From<&'static str> for Event {
    fn from(data: &'static str) -> Self {
        Self::new(data)
    }
}

impl From<String> for Event {
    fn from(data: String) -> Self {
        Self::new(data)
    }
}

impl From<Vec<u8>> for Event {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<Bytes> for Event {
    fn from(data: Bytes) -> Self {
        Self::new(data)
    }
}
