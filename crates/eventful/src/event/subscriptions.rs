use crate::event::subscription::{FnHandler, Handler, Record, Subscription};
use crate::participant::{IdCounter, SubscriptionId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct RegistryState<T, E> {
    ids: IdCounter,
    records: HashMap<SubscriptionId, Arc<Record<T, E>>>,
}

pub(crate) struct Registry<T, E> {
    state: RwLock<RegistryState<T, E>>,
}

impl<T, E> Registry<T, E>
where
    T: Send + Sync + 'static,
    E: Send + 'static,
{
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(RegistryState {
                ids: IdCounter::default(),
                records: HashMap::new(),
            }),
        })
    }

    fn subscribe(self: &Arc<Self>, handler: Arc<dyn Handler<T, E>>) -> Subscription {
        let (id, record) = {
            let mut state = self.state.write();
            let id = SubscriptionId::new(state.ids.next());
            let record = Arc::new(Record::new(id, handler, Arc::downgrade(self)));
            state.records.insert(id, Arc::clone(&record));
            (id, record)
        };
        tracing::debug!(subscription_id = %id, "subscribed");
        Subscription::new(id, record)
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) {
        self.state.write().records.remove(&id);
    }

    /// Calls every subscription active when the firing starts, stopping at the
    /// first error.
    ///
    /// The map is snapshotted under the read lock and the lock is released
    /// before any handler runs, so handlers may subscribe or close freely.
    pub(crate) async fn fire(&self, cx: &CancellationToken, value: &T) -> Result<(), E> {
        let snapshot: Vec<Arc<Record<T, E>>> =
            self.state.read().records.values().cloned().collect();

        tracing::trace!(subscribers = snapshot.len(), "firing event");
        for record in snapshot {
            record.fire(cx.clone(), value).await?;
        }
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.state.read().records.len()
    }
}

/// The public face of an [`Event`](crate::Event): lets anyone subscribe, but
/// not trigger.
pub struct Subscriptions<T, E = anyhow::Error> {
    registry: Arc<Registry<T, E>>,
}

impl<T, E> Subscriptions<T, E>
where
    T: Send + Sync + 'static,
    E: Send + 'static,
{
    pub(crate) fn new(registry: Arc<Registry<T, E>>) -> Self {
        Self { registry }
    }

    /// Registers `f` to run on every trigger until the returned
    /// [`Subscription`] is closed.
    pub fn subscribe<F, Fut>(&self, f: F) -> Subscription
    where
        T: Clone,
        F: Fn(CancellationToken, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        self.registry.subscribe(Arc::new(FnHandler::new(f)))
    }

    pub fn subscribe_handler(&self, handler: Arc<dyn Handler<T, E>>) -> Subscription {
        self.registry.subscribe(handler)
    }
}

impl<T, E> Clone for Subscriptions<T, E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_ids_are_never_reused() {
        let registry = Registry::<u32, anyhow::Error>::new();
        let subs = Subscriptions::new(Arc::clone(&registry));

        let first = subs.subscribe(|_, _| async { Ok(()) });
        let second = subs.subscribe(|_, _| async { Ok(()) });
        first.close();
        let third = subs.subscribe(|_, _| async { Ok(()) });

        assert_eq!(first.id().as_u64(), 1);
        assert_eq!(second.id().as_u64(), 2);
        assert_eq!(third.id().as_u64(), 3);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_close_removes_from_map() {
        let registry = Registry::<u32, anyhow::Error>::new();
        let subs = Subscriptions::new(Arc::clone(&registry));

        let sub = subs.subscribe(|_, _| async { Ok(()) });
        assert_eq!(registry.len(), 1);
        assert!(!sub.is_closed());

        sub.close();
        assert!(sub.is_closed());
        assert_eq!(registry.len(), 0);

        sub.close();
        assert_eq!(registry.len(), 0);
    }

    #[tokio::test]
    async fn test_fire_skips_closed_record_in_snapshot() {
        let registry = Registry::<u32, anyhow::Error>::new();
        let subs = Subscriptions::new(Arc::clone(&registry));
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_clone = Arc::clone(&calls);
        let sub = subs.subscribe(move |_, _| {
            let calls = Arc::clone(&calls_clone);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let snapshot: Vec<_> = registry.state.read().records.values().cloned().collect();
        sub.close();
        for record in snapshot {
            record.fire(CancellationToken::new(), &1).await.unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_closing_after_registry_dropped_is_noop() {
        let registry = Registry::<u32, anyhow::Error>::new();
        let sub = Subscriptions::new(Arc::clone(&registry)).subscribe(|_, _| async { Ok(()) });

        drop(registry);
        sub.close();
        assert!(sub.is_closed());
    }
}
