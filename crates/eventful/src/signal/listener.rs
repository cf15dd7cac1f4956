use crate::participant::{ListenerId, Participant};
use crate::signal::listeners::Hub;
use futures::Stream;
use parking_lot::Mutex;
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub(crate) struct Shared<T> {
    id: ListenerId,
    stop: CancellationToken,
    hub: Mutex<Option<Weak<Hub<T>>>>,
}

impl<T> Shared<T> {
    pub(crate) fn new(id: ListenerId, stop: CancellationToken, hub: Option<Weak<Hub<T>>>) -> Self {
        Self {
            id,
            stop,
            hub: Mutex::new(hub),
        }
    }

    fn close_once(&self) {
        let Some(hub) = self.hub.lock().take() else {
            return;
        };
        self.stop.cancel();
        if let Some(hub) = hub.upgrade() {
            hub.remove(self.id);
        }
        tracing::debug!(listener_id = %self.id, "listener closed");
    }

    fn is_inert(&self) -> bool {
        self.hub.lock().is_none()
    }
}

impl<T: Send> Participant for Shared<T> {
    fn close(&self) {
        self.close_once();
    }

    fn is_closed(&self) -> bool {
        self.is_inert()
    }
}

/// Moves values from a listener's unbounded inbox to its bounded outbound
/// channel.
///
/// The forwarder holds the only sender of the outbound channel, so the
/// channel ends exactly once: when the forwarder returns. That happens when
/// the listener is closed (`stop`), when the signal drops the inbox and the
/// inbox has drained, or when the receiving side is gone.
pub(crate) fn spawn_forwarder<T: Send + 'static>(
    id: ListenerId,
    mut inbox: mpsc::UnboundedReceiver<T>,
    outbound: mpsc::Sender<T>,
    stop: CancellationToken,
) {
    tokio::spawn(async move {
        loop {
            let value = tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                value = inbox.recv() => match value {
                    Some(value) => value,
                    None => break,
                },
            };
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                sent = outbound.send(value) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::trace!(listener_id = %id, "forwarder finished");
    });
}

/// A channel-based participant in a [`Signal`](crate::Signal).
///
/// Values arrive in emission order. `recv` yields `None` once the signal is
/// closed and drained, or as soon as this listener is closed. Dropping the
/// listener closes it.
pub struct Listener<T> {
    id: ListenerId,
    rx: mpsc::Receiver<T>,
    shared: Arc<Shared<T>>,
}

impl<T> Listener<T> {
    pub(crate) fn new(id: ListenerId, rx: mpsc::Receiver<T>, shared: Arc<Shared<T>>) -> Self {
        Self { id, rx, shared }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub async fn recv(&mut self) -> Option<T> {
        if self.shared.stop.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.shared.stop.cancelled() => None,
            value = self.rx.recv() => value,
        }
    }

    pub fn try_recv(&mut self) -> Option<T> {
        if self.shared.stop.is_cancelled() {
            return None;
        }
        self.rx.try_recv().ok()
    }

    /// Stops delivery to this listener and ends its channel. Values still in
    /// flight are discarded.
    pub fn close(&self) {
        self.shared.close_once();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_inert()
    }
}

impl<T: Send + 'static> Listener<T> {
    /// A cloneable handle that can close this listener from another task.
    pub fn closer(&self) -> ListenerCloser {
        ListenerCloser {
            id: self.id,
            shared: self.shared.clone(),
        }
    }
}

impl<T> Stream for Listener<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        if self.shared.stop.is_cancelled() {
            return Poll::Ready(None);
        }
        self.rx.poll_recv(cx)
    }
}

impl<T> Drop for Listener<T> {
    fn drop(&mut self) {
        self.shared.close_once();
    }
}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[derive(Clone)]
pub struct ListenerCloser {
    id: ListenerId,
    shared: Arc<dyn Participant>,
}

impl ListenerCloser {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn close(&self) {
        self.shared.close();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }
}

impl fmt::Debug for ListenerCloser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerCloser")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}
