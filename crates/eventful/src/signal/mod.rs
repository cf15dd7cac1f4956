mod listener;
mod listeners;

pub use listener::{Listener, ListenerCloser};
pub use listeners::Listeners;

use crate::error::EmitError;
use crate::options::SignalOptions;
use listeners::Hub;
use std::sync::Arc;

/// Non-blocking fan-out owned by a single producer.
///
/// Every listener gets its own channel and its own forwarding task, so a
/// listener that never reads only ever holds up itself. Keep the `Signal`
/// private and hand out [`Signal::listeners`]: only the owner can emit or
/// close. Dropping the signal closes it.
pub struct Signal<T> {
    hub: Arc<Hub<T>>,
}

impl<T: Clone + Send + 'static> Signal<T> {
    pub fn new() -> Self {
        Self::with_options(SignalOptions::default())
    }

    pub fn with_options(options: SignalOptions) -> Self {
        Self {
            hub: Hub::new(options),
        }
    }

    pub fn listeners(&self) -> Listeners<T> {
        Listeners::new(Arc::clone(&self.hub))
    }

    /// Sends `value` to every current listener without waiting on any of
    /// them. Emitting on a closed signal does nothing.
    pub fn emit(&self, value: T) {
        if self.hub.fire(value).is_err() {
            tracing::debug!("emit on closed signal dropped");
        }
    }

    /// Like [`emit`](Self::emit), but reports how many listeners the value
    /// was queued for.
    pub fn try_emit(&self, value: T) -> Result<usize, EmitError> {
        self.hub.fire(value)
    }
}

impl<T> Signal<T> {
    /// Stops accepting values. Each listener's channel ends once the values
    /// emitted before this call have been handed over.
    pub fn close(&self) {
        self.hub.close();
    }

    pub fn is_closed(&self) -> bool {
        self.hub.is_closed()
    }

    pub fn listener_count(&self) -> usize {
        self.hub.len()
    }

    pub fn options(&self) -> &SignalOptions {
        self.hub.options()
    }
}

impl<T: Clone + Send + 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Signal<T> {
    fn drop(&mut self) {
        self.hub.close();
    }
}
