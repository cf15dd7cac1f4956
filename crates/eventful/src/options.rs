//! Construction options for signals and listeners
//!
//! Options are plain data: build them with chained setters (the last call
//! wins) or deserialize them from the embedding application's config.

use serde::{Deserialize, Serialize};

/// Default outbound buffer size: `0`, a single-slot handoff where the
/// forwarder waits for the consumer before moving the next value.
pub const DEFAULT_BUFFER_SIZE: usize = 0;

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

/// Options applied when a [`Signal`](crate::Signal) is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalOptions {
    /// Outbound buffer size given to listeners that do not set their own.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl SignalOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }
}

impl Default for SignalOptions {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
        }
    }
}

/// Options applied when a single [`Listener`](crate::Listener) is registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerOptions {
    /// Outbound buffer size for this listener; `None` inherits the signal's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<usize>,
}

impl ListenerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = Some(buffer_size);
        self
    }

    /// Buffer size this listener ends up with under `signal`.
    pub fn resolve(&self, signal: &SignalOptions) -> usize {
        self.buffer_size.unwrap_or(signal.buffer_size)
    }
}

/// Channel capacity for a resolved buffer size.
///
/// Tokio channels need room for at least one value, so an unbuffered
/// listener gets a single slot.
pub(crate) fn channel_capacity(buffer_size: usize) -> usize {
    buffer_size.max(1)
}
