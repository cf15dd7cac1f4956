use crate::error::EmitError;
use crate::options::{channel_capacity, ListenerOptions, SignalOptions};
use crate::participant::{IdCounter, ListenerId};
use crate::signal::listener::{spawn_forwarder, Listener, Shared};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

struct HubState<T> {
    ids: IdCounter,
    closed: bool,
    inboxes: HashMap<ListenerId, mpsc::UnboundedSender<T>>,
}

/// Listener registry behind a [`Signal`](crate::Signal).
///
/// Each registered listener is represented by the sending half of its
/// forwarder's inbox. Removing the entry (or clearing the map on close) is
/// what lets the forwarder drain and finish.
pub(crate) struct Hub<T> {
    options: SignalOptions,
    state: RwLock<HubState<T>>,
}

impl<T> Hub<T> {
    pub(crate) fn new(options: SignalOptions) -> Arc<Self> {
        Arc::new(Self {
            options,
            state: RwLock::new(HubState {
                ids: IdCounter::default(),
                closed: false,
                inboxes: HashMap::new(),
            }),
        })
    }

    pub(crate) fn options(&self) -> &SignalOptions {
        &self.options
    }

    pub(crate) fn remove(&self, id: ListenerId) {
        self.state.write().inboxes.remove(&id);
    }

    /// Refuses further emits and releases every inbox. Returns `false` if the
    /// hub was already closed.
    pub(crate) fn close(&self) -> bool {
        let inboxes = {
            let mut state = self.state.write();
            if state.closed {
                return false;
            }
            state.closed = true;
            std::mem::take(&mut state.inboxes)
        };
        tracing::debug!(listeners = inboxes.len(), "signal closed");
        true
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.read().closed
    }

    pub(crate) fn len(&self) -> usize {
        self.state.read().inboxes.len()
    }
}

impl<T: Clone + Send + 'static> Hub<T> {
    fn listen(self: &Arc<Self>, options: ListenerOptions) -> Listener<T> {
        let buffer_size = options.resolve(&self.options);
        let (outbound_tx, outbound_rx) = mpsc::channel(channel_capacity(buffer_size));
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let stop = CancellationToken::new();

        let (id, inbox_tx) = {
            let mut state = self.state.write();
            let id = ListenerId::new(state.ids.next());
            if state.closed {
                (id, Some(inbox_tx))
            } else {
                state.inboxes.insert(id, inbox_tx);
                (id, None)
            }
        };
        spawn_forwarder(id, inbox_rx, outbound_tx, stop.clone());

        // An unregistered inbox is dropped on return, so the forwarder ends
        // the listener's channel right away.
        let hub = match inbox_tx {
            Some(_) => {
                tracing::debug!(listener_id = %id, "listening on a closed signal");
                None
            }
            None => {
                tracing::debug!(listener_id = %id, buffer_size, "listening");
                Some(Arc::downgrade(self))
            }
        };
        Listener::new(id, outbound_rx, Arc::new(Shared::new(id, stop, hub)))
    }

    /// Queues `value` for every registered listener and returns how many
    /// inboxes accepted it. Never waits on a consumer.
    pub(crate) fn fire(&self, value: T) -> Result<usize, EmitError> {
        let state = self.state.read();
        if state.closed {
            return Err(EmitError::Closed);
        }

        let mut delivered = 0;
        for (id, inbox) in &state.inboxes {
            if inbox.send(value.clone()).is_ok() {
                delivered += 1;
            } else {
                tracing::trace!(listener_id = %id, "forwarder already finished");
            }
        }
        tracing::trace!(delivered, "emitted signal");
        Ok(delivered)
    }
}

/// The public face of a [`Signal`](crate::Signal): lets anyone listen, but
/// not emit.
pub struct Listeners<T> {
    hub: Arc<Hub<T>>,
}

impl<T: Clone + Send + 'static> Listeners<T> {
    pub(crate) fn new(hub: Arc<Hub<T>>) -> Self {
        Self { hub }
    }

    /// Registers a listener using the signal's buffer size.
    ///
    /// Spawns the listener's forwarder, so it must be called from within a
    /// tokio runtime.
    pub fn listen(&self) -> Listener<T> {
        self.hub.listen(ListenerOptions::default())
    }

    pub fn listen_with(&self, options: ListenerOptions) -> Listener<T> {
        self.hub.listen(options)
    }
}

impl<T> Clone for Listeners<T> {
    fn clone(&self) -> Self {
        Self {
            hub: Arc::clone(&self.hub),
        }
    }
}
