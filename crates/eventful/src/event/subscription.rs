use crate::event::subscriptions::Registry;
use crate::participant::{Participant, SubscriptionId};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};
use tokio_util::sync::CancellationToken;

/// A participant in an [`Event`](crate::Event).
///
/// Handlers run on the task that called `trigger`, one after another. Returning
/// an error stops the firing and hands the error back to the trigger caller.
#[async_trait]
pub trait Handler<T, E>: Send + Sync {
    async fn handle(&self, cx: CancellationToken, value: &T) -> Result<(), E>;
}

/// Adapts `Fn(CancellationToken, T) -> Future` closures to [`Handler`].
pub(crate) struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F> {
    pub(crate) fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<T, E, F, Fut> Handler<T, E> for FnHandler<F>
where
    T: Clone + Send + Sync + 'static,
    E: Send + 'static,
    F: Fn(CancellationToken, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
{
    async fn handle(&self, cx: CancellationToken, value: &T) -> Result<(), E> {
        (self.f)(cx, value.clone()).await
    }
}

pub(crate) struct Record<T, E> {
    id: SubscriptionId,
    handler: Arc<dyn Handler<T, E>>,
    registry: Mutex<Option<Weak<Registry<T, E>>>>,
}

impl<T, E> Record<T, E>
where
    T: Send + Sync + 'static,
    E: Send + 'static,
{
    pub(crate) fn new(
        id: SubscriptionId,
        handler: Arc<dyn Handler<T, E>>,
        registry: Weak<Registry<T, E>>,
    ) -> Self {
        Self {
            id,
            handler,
            registry: Mutex::new(Some(registry)),
        }
    }

    pub(crate) async fn fire(&self, cx: CancellationToken, value: &T) -> Result<(), E> {
        if self.is_closed() {
            return Ok(());
        }
        self.handler.handle(cx, value).await
    }
}

impl<T, E> Participant for Record<T, E>
where
    T: Send + Sync + 'static,
    E: Send + 'static,
{
    fn close(&self) {
        let Some(registry) = self.registry.lock().take() else {
            return;
        };
        if let Some(registry) = registry.upgrade() {
            registry.unsubscribe(self.id);
        }
        tracing::debug!(subscription_id = %self.id, "subscription closed");
    }

    fn is_closed(&self) -> bool {
        self.registry.lock().is_none()
    }
}

/// Handle returned by [`Subscriptions::subscribe`](crate::Subscriptions::subscribe).
///
/// The only thing a subscriber can do with it is stop listening. Dropping the
/// handle leaves the subscription in place.
pub struct Subscription {
    id: SubscriptionId,
    record: Arc<dyn Participant>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, record: Arc<dyn Participant>) -> Self {
        Self { id, record }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Unsubscribes. Firings that start after this returns will not call the
    /// handler; one already in flight may still call it once.
    ///
    /// Safe to call repeatedly and from inside the handler itself.
    pub fn close(&self) {
        self.record.close();
    }

    pub fn is_closed(&self) -> bool {
        self.record.is_closed()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}
